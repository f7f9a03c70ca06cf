//! Labeled single-command execution

use tracing::{debug, info, warn};

use hostprep_exec::{CommandResult, RemoteShell};

use crate::error::EngineError;

/// Run one labeled shell command and capture its result
///
/// Emits a progress line for the step, executes the command, and returns
/// the result for the caller to classify. A non-zero exit is a normal
/// outcome here; only transport failures error. The `quiet` flag controls
/// whether captured output is surfaced to the log, never whether it is
/// captured.
///
/// # Errors
/// Returns `EngineError::Exec` on transport-level failure
pub async fn run_step(
    shell: &dyn RemoteShell,
    label: &str,
    cmd: &str,
    quiet: bool,
) -> Result<CommandResult, EngineError> {
    info!(step = %label, "running");

    let result = shell.run(cmd).await?;

    if !quiet && !result.stdout.trim().is_empty() {
        debug!(step = %label, output = %result.stdout.trim(), "stdout");
    }

    if result.success() {
        debug!(step = %label, duration = ?result.duration, "step ok");
    } else {
        warn!(
            step = %label,
            status = result.status,
            stderr = %result.stderr.trim(),
            "step exited non-zero"
        );
    }

    Ok(result)
}
