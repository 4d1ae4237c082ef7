//! Request decoding for the dispatch loop.
//!
//! A frame is decoded in two stages. The envelope is parsed first so the
//! `pid` can be salvaged for error responses; the action-specific fields are
//! then deserialized into the matching [`Command`] variant.

use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::errors::DispatchError;

/// Actions understood by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Liveness check.
    Ping,
    /// Invoke a callable.
    Run,
    /// Import a module.
    Import,
    /// Extend the search path.
    SetPath,
    /// Construct and bind an instance.
    InitClass,
}

impl Action {
    /// Parses an action name. Matching is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownAction` for any other string.
    pub fn parse(value: &str) -> Result<Self, DispatchError> {
        Self::from_str(value).map_err(|_| DispatchError::unknown_action(value))
    }
}

/// Arguments of a `RUN` request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunArgs {
    /// Dotted path of the scope holding the callable; empty for the root.
    pub module: String,
    /// Name of the callable within the scope.
    pub function: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

/// Module descriptor of an `IMPORT` request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportTarget {
    /// Dotted module name.
    pub name: String,
    /// Members to import; empty imports the whole module.
    #[serde(default)]
    pub from_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ImportArgs {
    module: ImportTarget,
}

#[derive(Debug, Deserialize)]
struct SetPathArgs {
    path: Vec<String>,
}

/// Arguments of an `INIT_CLASS` request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InitClassArgs {
    /// Dotted path of the class.
    pub class: String,
    /// Dotted name the instance is bound under.
    #[serde(rename = "as")]
    pub alias: String,
    /// Positional constructor arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Keyword constructor arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

/// A decoded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `PING`.
    Ping,
    /// `RUN`.
    Run(RunArgs),
    /// `IMPORT`.
    Import(ImportTarget),
    /// `SET_PATH`.
    SetPath(Vec<String>),
    /// `INIT_CLASS`.
    InitClass(InitClassArgs),
}

impl Command {
    /// Action this command was decoded from.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Ping => Action::Ping,
            Self::Run(_) => Action::Run,
            Self::Import(_) => Action::Import,
            Self::SetPath(_) => Action::SetPath,
            Self::InitClass(_) => Action::InitClass,
        }
    }
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Request identifier, echoed verbatim.
    pub pid: Value,
    /// Command to execute.
    pub command: Command,
}

/// A frame that could not be decoded.
#[derive(Debug)]
pub struct DecodeFailure {
    /// Identifier salvaged from the frame, or `null`.
    pub pid: Value,
    /// Reason for the failure.
    pub error: DispatchError,
}

impl DecodeFailure {
    fn anonymous(error: DispatchError) -> Self {
        Self {
            pid: Value::Null,
            error,
        }
    }
}

impl Request {
    /// Decodes a frame.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeFailure`] carrying the salvaged `pid` when the frame
    /// is not valid UTF-8 or JSON, lacks `pid` or `action`, names an unknown
    /// action, or has missing or ill-typed action fields.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeFailure> {
        let text = std::str::from_utf8(frame).map_err(|error| {
            DecodeFailure::anonymous(DispatchError::malformed(format!(
                "frame is not valid UTF-8: {error}"
            )))
        })?;
        let value: Value = serde_json::from_str(text)
            .map_err(|error| DecodeFailure::anonymous(DispatchError::malformed(error.to_string())))?;
        let Value::Object(mut fields) = value else {
            return Err(DecodeFailure::anonymous(DispatchError::malformed(
                "request must be a JSON object",
            )));
        };
        let Some(pid) = fields.remove("pid") else {
            return Err(DecodeFailure::anonymous(DispatchError::malformed(
                "missing field `pid`",
            )));
        };

        match decode_command(fields) {
            Ok(command) => Ok(Self { pid, command }),
            Err(error) => Err(DecodeFailure { pid, error }),
        }
    }
}

fn decode_command(mut fields: Map<String, Value>) -> Result<Command, DispatchError> {
    let action = match fields.remove("action") {
        Some(Value::String(action)) => Action::parse(&action)?,
        Some(_) => return Err(DispatchError::malformed("field `action` must be a string")),
        None => return Err(DispatchError::malformed("missing field `action`")),
    };

    Ok(match action {
        Action::Ping => Command::Ping,
        Action::Run => Command::Run(fields_as(fields)?),
        Action::Import => Command::Import(fields_as::<ImportArgs>(fields)?.module),
        Action::SetPath => Command::SetPath(fields_as::<SetPathArgs>(fields)?.path),
        Action::InitClass => Command::InitClass(fields_as(fields)?),
    })
}

fn fields_as<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, DispatchError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|error| DispatchError::malformed(error.to_string()))
}
