//! Framed request/response worker exposing a dynamic symbol registry.
//!
//! The worker reads JSON requests from stdin, each terminated by U+2404,
//! executes them against a [`symbridge_registry::Registry`], and writes one
//! JSON response per request to stdout, terminated the same way. Logs go to
//! stderr.
//!
//! ```text
//! stdin -> Framer -> Request::decode -> Dispatcher -> Registry
//!                                           |
//! stdout <- ResponseWriter <- Response <----+
//! ```
//!
//! Startup loads [`symbridge_config::Config`], installs structured telemetry,
//! applies the configured search path, and then serves until the input closes
//! or `SIGINT`/`SIGTERM` arrives.

mod bootstrap;
pub mod dispatch;
pub mod framer;
mod health;
mod process;
pub mod session;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, Worker, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_worker};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
