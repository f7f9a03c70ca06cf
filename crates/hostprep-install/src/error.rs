//! Error types for hostprep-install

use thiserror::Error;

use hostprep_engine::EngineError;
use hostprep_exec::ExecError;

/// Errors surfaced by an installer façade
#[derive(Error, Debug, Clone)]
pub enum InstallError {
    /// A target-specific requirement is not satisfied; no mutating command
    /// was issued
    #[error("precondition unmet: {0}")]
    Precondition(String),

    /// A mutating step exited non-zero; the remaining sequence was aborted
    #[error("step '{label}' failed with status {status}: {stderr}")]
    StepFailed {
        /// Step description label
        label: String,
        /// Exit status
        status: i32,
        /// Captured stderr text
        stderr: String,
    },

    /// The post-sequence re-probe still reports not installed despite a
    /// zero-exit sequence
    #[error("verification failed: {0}")]
    Verification(String),

    /// Transport-level failure
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Local file access failed (e.g. reading a site archive)
    #[error("local I/O error: {0}")]
    LocalIo(String),
}

impl From<EngineError> for InstallError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::StepFailed {
                label,
                status,
                stderr,
            } => InstallError::StepFailed {
                label,
                status,
                stderr,
            },
            EngineError::Exec(e) => InstallError::Exec(e),
            // Unsafe operator input is a façade-boundary precondition
            EngineError::UnsafeToken { field, value } => {
                InstallError::Precondition(format!("unsafe {field} value: {value:?}"))
            }
        }
    }
}
