//! Error types for hostprep-engine

use thiserror::Error;

use hostprep_exec::ExecError;

/// Errors that can occur while orchestrating commands
#[derive(Error, Debug, Clone)]
pub enum EngineError {
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

    /// Transport-level failure (channel died, command not dispatched)
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    /// Operator-supplied value failed the shell-safety allow-list
    #[error("unsafe {field} value: {value:?}")]
    UnsafeToken {
        /// Which field was rejected
        field: &'static str,
        /// The offending value
        value: String,
    },
}
