//! Supervises worker startup and the serving thread.
//!
//! The session runs on its own thread so the main thread can wait for
//! whichever comes first: the input closing or a termination signal.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use symbridge_registry::Registry;
use tracing::{info, warn};

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::DispatchError;
use crate::health::HealthReporter;
use crate::session::SessionSummary;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to run the worker.
pub(crate) struct WorkerPlan<L, S, R, W> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) reader: R,
    pub(crate) writer: W,
}

enum Outcome {
    Finished(Result<SessionSummary, DispatchError>),
    Signalled(Result<(), ShutdownError>),
}

/// Runs the worker over stdin and stdout using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap fails or the session ends because
/// a stream failed.
pub fn run_worker() -> Result<(), LaunchError> {
    let plan = WorkerPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(),
        reader: io::stdin(),
        writer: io::stdout(),
    };
    run_worker_with(plan)
}

/// Runs the worker with injected collaborators.
pub(crate) fn run_worker_with<L, S, R, W>(plan: WorkerPlan<L, S, R, W>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal + 'static,
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let WorkerPlan {
        loader,
        reporter,
        shutdown,
        reader,
        writer,
    } = plan;

    let worker = bootstrap_with(&loader, reporter.as_ref(), Registry::new())?;
    info!(
        target: PROCESS_TARGET,
        pid = std::process::id(),
        log_format = %worker.telemetry().format(),
        "worker ready"
    );
    let mut session = worker.into_session(reader, writer);

    let (sender, outcomes) = mpsc::channel();
    let session_sender = sender.clone();
    spawn("session", move || {
        let _ = session_sender.send(Outcome::Finished(session.serve()));
    })?;
    spawn("signals", move || {
        let _ = sender.send(Outcome::Signalled(shutdown.wait()));
    })?;

    for outcome in outcomes {
        match outcome {
            Outcome::Finished(Ok(summary)) => {
                reporter.session_finished(&summary);
                return Ok(());
            }
            Outcome::Finished(Err(error)) => return Err(error.into()),
            Outcome::Signalled(Ok(())) => {
                reporter.shutdown_requested();
                return Ok(());
            }
            Outcome::Signalled(Err(error)) => {
                warn!(
                    target: PROCESS_TARGET,
                    %error,
                    "signal listener unavailable; serving until input closes"
                );
            }
        }
    }
    Err(LaunchError::SessionLost)
}

fn spawn<F>(name: &'static str, body: F) -> Result<(), LaunchError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("symbridged-{name}"))
        .spawn(body)
        .map(drop)
        .map_err(|source| LaunchError::Thread { name, source })
}
