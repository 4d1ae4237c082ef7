//! Shared configuration for the symbridge worker.
//!
//! Configuration is layered by `ortho_config`: defaults, an optional
//! configuration file, then `SYMBRIDGE_*` environment variables. The worker
//! process accepts no command-line flags, so [`Config::load_for_worker`] hands
//! the loader only the program name.
//!
//! Every field is optional on the wire; the accessors resolve the effective
//! value so callers never deal with absent settings.

mod defaults;
mod logging;

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, default_log_format};
pub use logging::LogFormat;

/// Program name handed to the loader in place of real arguments.
const PROGRAM_NAME: &str = "symbridged";

/// Runtime configuration for the worker process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SYMBRIDGE")]
pub struct Config {
    /// Tracing filter expression such as `info` or `symbridged=debug`.
    pub log_filter: Option<String>,
    /// Output format for log records written to stderr.
    pub log_format: Option<LogFormat>,
    /// Upper bound on the size of a single buffered frame, in bytes.
    pub max_frame_bytes: Option<usize>,
    /// Initial search path entries as a platform path list (`lib:vendor`).
    pub search_path: Option<String>,
}

impl Config {
    /// Loads configuration from files and the environment only.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a configuration source is malformed.
    pub fn load_for_worker() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)])
    }

    /// Effective tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Effective log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Effective maximum frame size. Zero is treated as unset.
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_MAX_FRAME_BYTES)
    }

    /// Initial search path entries, in declaration order.
    #[must_use]
    pub fn search_path_entries(&self) -> Vec<PathBuf> {
        self.search_path
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                env::split_paths(raw)
                    .filter(|entry| !entry.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
