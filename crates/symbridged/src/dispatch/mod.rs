//! Request dispatch for the worker.
//!
//! Each frame carries one JSON request:
//!
//! ```json
//! {"pid": 7, "action": "RUN", "module": "", "function": "sqrt", "args": [9]}
//! ```
//!
//! and yields exactly one response, terminated by the frame sentinel:
//!
//! ```json
//! {"pid": 7, "status": "OK", "body": 3.0}
//! ```
//!
//! ## Actions
//!
//! `PING`, `RUN`, `IMPORT`, `SET_PATH`, and `INIT_CLASS` map onto registry
//! operations. Anything else is answered with an `ERROR` response naming the
//! unexpected action.

mod errors;
mod handler;
mod request;
mod response;
mod router;

#[cfg(test)]
mod tests;

pub use self::errors::{DispatchError, ErrorKind};
pub use self::handler::Dispatcher;
pub use self::request::{
    Action, Command, DecodeFailure, ImportTarget, InitClassArgs, Request, RunArgs,
};
pub use self::response::{Response, ResponseWriter, Status};
pub use self::router::PONG;
pub(crate) use self::router::DISPATCH_TARGET;
