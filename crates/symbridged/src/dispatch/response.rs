//! Response serialization helpers for the dispatch loop.
//!
//! Responses are JSON objects terminated by the frame sentinel. A sentinel
//! occurring inside a string is written as the JSON escape `\u2404` so the
//! host never sees a premature terminator.

use std::borrow::Cow;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use super::errors::DispatchError;
use crate::framer::{SENTINEL, SENTINEL_BYTES};

/// Outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// The request succeeded.
    Ok,
    /// The request failed; the body carries the message.
    Error,
}

/// Response sent for every dispatched frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Identifier copied from the request.
    pub pid: Value,
    /// Outcome.
    pub status: Status,
    /// Result value or error message.
    pub body: Value,
}

impl Response {
    /// Creates a successful response.
    #[must_use]
    pub const fn ok(pid: Value, body: Value) -> Self {
        Self {
            pid,
            status: Status::Ok,
            body,
        }
    }

    /// Creates an error response whose body is the error's message.
    #[must_use]
    pub fn error(pid: Value, error: &DispatchError) -> Self {
        Self {
            pid,
            status: Status::Error,
            body: Value::String(error.to_string()),
        }
    }
}

/// Writer that serializes responses to a stream.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a response followed by the sentinel and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing, or flushing fails.
    pub fn write_response(&mut self, response: &Response) -> Result<(), DispatchError> {
        let text = serde_json::to_string(response)?;
        self.writer.write_all(escape_sentinel(&text).as_bytes())?;
        self.writer.write_all(SENTINEL_BYTES)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn escape_sentinel(text: &str) -> Cow<'_, str> {
    if text.contains(SENTINEL) {
        Cow::Owned(text.replace(SENTINEL, "\\u2404"))
    } else {
        Cow::Borrowed(text)
    }
}
