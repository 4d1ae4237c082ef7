//! Output formats for the worker's stderr log stream.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How log records are rendered on stderr.
///
/// Parsing from `SYMBRIDGE_LOG_FORMAT` ignores case.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record, fields flattened onto the event.
    #[default]
    Json,
    /// Single-line text for a developer watching the host's stderr.
    Compact,
}
