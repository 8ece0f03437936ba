mod bootstrap;
mod config;
mod gameplay;
mod loop_runner;

use std::process::ExitCode;

use tracing::error;

pub(crate) fn run() -> ExitCode {
    match bootstrap::build_app() {
        Ok(app) => loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "bootstrap_failed");
            ExitCode::FAILURE
        }
    }
}
