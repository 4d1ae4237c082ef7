//! Worker bootstrap orchestration.

use std::io::{Read, Write};
use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use symbridge_config::Config;
use symbridge_registry::{Registry, RegistryError};

use crate::dispatch::Dispatcher;
use crate::framer::Framer;
use crate::health::HealthReporter;
use crate::session::Session;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load_for_worker`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_for_worker()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The configured search path could not be applied.
    #[error("failed to apply configured search path: {source}")]
    SearchPath {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Worker {
    config: Config,
    registry: Registry,
    telemetry: TelemetryHandle,
}

impl Worker {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the prepared registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds a session serving `reader` and `writer`.
    pub fn into_session<R: Read, W: Write>(self, reader: R, writer: W) -> Session<R, W> {
        let framer = Framer::new(self.config.max_frame_bytes());
        Session::new(Dispatcher::new(self.registry), framer, reader, writer)
    }
}

/// Bootstraps the worker using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, or the
/// configured search path cannot be set up. The reporter is told about the
/// failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
    registry: Registry,
) -> Result<Worker, BootstrapError> {
    reporter.bootstrap_starting();
    let result = prepare(loader, registry);
    match &result {
        Ok(worker) => reporter.bootstrap_succeeded(worker.config()),
        Err(error) => reporter.bootstrap_failed(error),
    }
    result
}

fn prepare(loader: &dyn ConfigLoader, mut registry: Registry) -> Result<Worker, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    registry
        .set_path(config.search_path_entries())
        .map_err(|source| BootstrapError::SearchPath { source })?;
    Ok(Worker {
        config,
        registry,
        telemetry,
    })
}
