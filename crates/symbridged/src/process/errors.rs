//! Defines the error surface for worker launch and supervision.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::dispatch::DispatchError;

/// Errors surfaced while launching or supervising the worker.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the worker failed.
    #[error("worker bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// A supervision thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Thread {
        /// Thread name.
        name: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The session ended because a stream failed.
    #[error("session terminated: {source}")]
    Session {
        /// Underlying dispatch error.
        #[source]
        source: DispatchError,
    },
    /// The serving thread exited without reporting an outcome.
    #[error("session thread exited unexpectedly")]
    SessionLost,
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<DispatchError> for LaunchError {
    fn from(source: DispatchError) -> Self {
        Self::Session { source }
    }
}
