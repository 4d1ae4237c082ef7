//! Entry point for the `symbridged` worker process.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match symbridged::run_worker() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "symbridged: {error}");
            ExitCode::FAILURE
        }
    }
}
