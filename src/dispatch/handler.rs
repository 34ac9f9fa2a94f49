// src/dispatch/handler.rs

//! What happens for one delivered message.

use tracing::{error, info};

use crate::exec::{CommandError, CommandOutput, CommandRunner};

use super::entry::Entry;
use super::guard::Admission;

/// Result of one trigger, mainly for tests and diagnostics. Every variant has
/// already been logged by the time it is returned.
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The entry was already running and does not allow concurrent runs.
    Skipped,
    Succeeded(CommandOutput),
    Failed(CommandError),
}

impl TriggerOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TriggerOutcome::Skipped)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TriggerOutcome::Succeeded(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TriggerOutcome::Failed(_))
    }
}

/// Admit-or-skip, run, release.
///
/// The permit is released as soon as the command has terminated, before the
/// outcome is logged, and on every path out of this function.
pub async fn handle_trigger(entry: &Entry, runner: &dyn CommandRunner) -> TriggerOutcome {
    let permit = match entry.guard().try_begin_or_skip() {
        Admission::Admitted(permit) => permit,
        Admission::Skipped => {
            info!(entry = %entry.name(), "previous run still in progress; trigger skipped");
            return TriggerOutcome::Skipped;
        }
    };

    info!(entry = %entry.name(), command = %entry.command(), "command starts...");
    let result = runner.run(entry.command()).await;
    permit.end();

    match result {
        Ok(output) => {
            info!(entry = %entry.name(), output = %output.output_text(), "command succeeded");
            TriggerOutcome::Succeeded(output)
        }
        Err(err) => {
            error!(
                entry = %entry.name(),
                error = %err,
                output = %err.output_text(),
                "execution failed"
            );
            TriggerOutcome::Failed(err)
        }
    }
}
