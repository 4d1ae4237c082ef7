//! Error types for request decoding and dispatch.
//!
//! Every variant except [`DispatchError::Io`] and
//! [`DispatchError::Serialize`] is reported to the host as an `ERROR`
//! response whose body is the variant's display text. I/O and serialization
//! failures mean the output channel is unusable and end the session.

use std::io;

use strum::{Display, IntoStaticStr};
use symbridge_registry::RegistryError;
use thiserror::Error;

/// Classification of a failure as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A module, function, class, or attribute could not be resolved.
    NotFound,
    /// Target code failed during a call.
    InvocationFailure,
    /// A module could not be imported or bound.
    ImportFailure,
    /// The search path could not be extended.
    PathFailure,
    /// The action is not one the worker understands.
    UnknownAction,
    /// The frame could not be decoded into a request.
    MalformedRequest,
    /// The output channel failed.
    Transport,
}

/// Errors surfaced while decoding and dispatching a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The frame is not a well-formed request.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Description of the defect.
        message: String,
    },

    /// The frame exceeded the configured size limit.
    #[error("malformed request: frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Bytes buffered when the limit was hit.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The action string is not recognised.
    #[error(
        "Received action of unexpected type. Expected 'PING', 'RUN', 'IMPORT', 'SET_PATH', or 'INIT_CLASS'; got '{action}'."
    )]
    UnknownAction {
        /// Action received.
        action: String,
    },

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Target code panicked.
    #[error("invocation panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    /// Reading or writing the stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A response could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DispatchError {
    /// Creates a malformed request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates an oversized frame error.
    #[must_use]
    pub const fn frame_too_large(size: usize, limit: usize) -> Self {
        Self::FrameTooLarge { size, limit }
    }

    /// Creates an unknown action error.
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Creates an error for a panic raised by target code.
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    /// Returns the reported kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest { .. } | Self::FrameTooLarge { .. } => {
                ErrorKind::MalformedRequest
            }
            Self::UnknownAction { .. } => ErrorKind::UnknownAction,
            Self::Registry(error) => match error {
                RegistryError::NotFound { .. } => ErrorKind::NotFound,
                RegistryError::Invocation(_) => ErrorKind::InvocationFailure,
                RegistryError::Import { .. } | RegistryError::Bind { .. } => {
                    ErrorKind::ImportFailure
                }
                RegistryError::Path { .. } => ErrorKind::PathFailure,
            },
            Self::Panicked { .. } => ErrorKind::InvocationFailure,
            Self::Io(_) | Self::Serialize(_) => ErrorKind::Transport,
        }
    }

    /// Returns `true` when the session cannot continue after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use symbridge_registry::InvocationError;

    use super::*;

    #[test]
    fn unknown_action_message_names_the_action() {
        let message = DispatchError::unknown_action("FOO").to_string();
        assert_eq!(
            message,
            "Received action of unexpected type. Expected 'PING', 'RUN', 'IMPORT', 'SET_PATH', or 'INIT_CLASS'; got 'FOO'."
        );
    }

    #[rstest]
    #[case::not_found(RegistryError::not_found("f"), ErrorKind::NotFound)]
    #[case::invocation(
        RegistryError::from(InvocationError::raised("f", "boom")),
        ErrorKind::InvocationFailure
    )]
    #[case::bind(RegistryError::bind("x", "taken"), ErrorKind::ImportFailure)]
    #[case::path(RegistryError::path("bad", None), ErrorKind::PathFailure)]
    fn registry_errors_map_to_kinds(#[case] error: RegistryError, #[case] expected: ErrorKind) {
        assert_eq!(DispatchError::from(error).kind(), expected);
    }

    #[test]
    fn only_transport_errors_are_fatal() {
        assert!(!DispatchError::malformed("bad").is_fatal());
        assert!(DispatchError::from(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
    }

    #[test]
    fn kinds_render_in_snake_case() {
        assert_eq!(ErrorKind::InvocationFailure.to_string(), "invocation_failure");
        let name: &'static str = ErrorKind::MalformedRequest.into();
        assert_eq!(name, "malformed_request");
    }
}
