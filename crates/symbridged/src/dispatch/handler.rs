//! Frame handler that turns each frame into exactly one response.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use symbridge_registry::Registry;
use tracing::{debug, warn};

use super::errors::DispatchError;
use super::request::{Command, DecodeFailure, Request};
use super::response::Response;
use super::router::{DISPATCH_TARGET, route};
use crate::framer::FrameEvent;

/// Decodes frames, routes them to the registry, and builds responses.
///
/// Failures of any kind, including panics in target code, become `ERROR`
/// responses; the dispatcher itself never fails.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    /// Creates a dispatcher owning the given registry.
    #[must_use]
    pub const fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Registry backing this dispatcher.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handles a framer event.
    pub fn handle_event(&mut self, event: FrameEvent) -> Response {
        match event {
            FrameEvent::Frame(frame) => self.handle_frame(&frame),
            FrameEvent::Oversized { size, limit } => {
                let error = DispatchError::frame_too_large(size, limit);
                warn!(target: DISPATCH_TARGET, kind = %error.kind(), %error, "rejected frame");
                Response::error(Value::Null, &error)
            }
        }
    }

    /// Decodes and executes a single frame.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Response {
        match Request::decode(frame) {
            Ok(request) => self.handle(request),
            Err(DecodeFailure { pid, error }) => {
                warn!(target: DISPATCH_TARGET, %pid, kind = %error.kind(), %error, "malformed request");
                Response::error(pid, &error)
            }
        }
    }

    /// Executes a decoded request.
    pub fn handle(&mut self, request: Request) -> Response {
        let Request { pid, command } = request;
        let action = command.action();
        debug!(target: DISPATCH_TARGET, %pid, %action, "dispatching request");

        match self.execute(command) {
            Ok(body) => Response::ok(pid, body),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %pid,
                    %action,
                    kind = %error.kind(),
                    %error,
                    "request failed"
                );
                Response::error(pid, &error)
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<Value, DispatchError> {
        let registry = &mut self.registry;
        panic::catch_unwind(AssertUnwindSafe(|| route(registry, command)))
            .unwrap_or_else(|payload| Err(DispatchError::panicked(panic_message(payload.as_ref()))))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}
