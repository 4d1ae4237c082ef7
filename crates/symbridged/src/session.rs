//! The read-dispatch-write loop over a byte stream pair.
//!
//! Requests are processed strictly in arrival order, one at a time. Every
//! frame produces one response, written and flushed before the next frame is
//! dispatched.

use std::io::{self, Read, Write};

use tracing::{debug, info};

use crate::dispatch::{DISPATCH_TARGET, DispatchError, Dispatcher, ResponseWriter, Status};
use crate::framer::{FrameEvent, Framer};

/// Size of each read from the input stream.
pub const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Counters reported when a session ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Responses written.
    pub responses: u64,
    /// Responses with `ERROR` status.
    pub errors: u64,
}

/// A worker session bound to an input and an output stream.
pub struct Session<R, W> {
    reader: R,
    writer: ResponseWriter<W>,
    framer: Framer,
    dispatcher: Dispatcher,
    summary: SessionSummary,
}

impl<R: Read, W: Write> Session<R, W> {
    /// Creates a session.
    pub fn new(dispatcher: Dispatcher, framer: Framer, reader: R, writer: W) -> Self {
        Self {
            reader,
            writer: ResponseWriter::new(writer),
            framer,
            dispatcher,
            summary: SessionSummary::default(),
        }
    }

    /// Serves requests until the input reaches end of stream.
    ///
    /// An unterminated remainder at end of input is dispatched as a final
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns an error when reading the input or writing a response fails.
    pub fn serve(&mut self) -> Result<SessionSummary, DispatchError> {
        let mut chunk = vec![0_u8; READ_CHUNK_BYTES];
        loop {
            let bytes_read = read_with_retry(&mut self.reader, &mut chunk)?;
            if bytes_read == 0 {
                if let Some(event) = self.framer.finish() {
                    self.respond(event)?;
                }
                break;
            }
            let events = self.framer.push(chunk.get(..bytes_read).unwrap_or_default());
            for event in events {
                self.respond(event)?;
            }
        }
        info!(
            target: DISPATCH_TARGET,
            responses = self.summary.responses,
            errors = self.summary.errors,
            "input closed; session finished"
        );
        Ok(self.summary)
    }

    /// Dispatcher serving this session.
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Consumes the session, returning the output stream.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn respond(&mut self, event: FrameEvent) -> Result<(), DispatchError> {
        let response = self.dispatcher.handle_event(event);
        self.summary.responses += 1;
        if response.status == Status::Error {
            self.summary.errors += 1;
        }
        self.writer.write_response(&response)?;
        debug!(target: DISPATCH_TARGET, pid = %response.pid, "response written");
        Ok(())
    }
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
