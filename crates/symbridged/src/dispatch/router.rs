//! Action routing for command dispatch.
//!
//! Each [`Command`] variant maps onto one registry operation.

use serde_json::Value;
use symbridge_registry::Registry;
use tracing::debug;

use super::errors::DispatchError;
use super::request::Command;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Body of a `PING` response.
pub const PONG: &str = "PONG";

/// Executes a command against the registry, returning the response body.
///
/// # Errors
///
/// Propagates registry failures as `DispatchError::Registry`.
pub(crate) fn route(registry: &mut Registry, command: Command) -> Result<Value, DispatchError> {
    match command {
        Command::Ping => Ok(Value::from(PONG)),
        Command::Run(run) => {
            Ok(registry.run(&run.module, &run.function, run.args, run.kwargs)?)
        }
        Command::Import(target) => Ok(registry.import(&target.name, &target.from_list)?),
        Command::SetPath(entries) => {
            let added = registry.set_path(&entries)?;
            debug!(
                target: DISPATCH_TARGET,
                added,
                total = registry.search_path().len(),
                "search path extended"
            );
            Ok(Value::String(String::new()))
        }
        Command::InitClass(init) => Ok(registry.init_class(
            &init.class,
            &init.alias,
            init.args,
            init.kwargs,
        )?),
    }
}
