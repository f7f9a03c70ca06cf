//! Error types for hostprep-exec

use thiserror::Error;

/// Errors that can occur during remote execution
///
/// Note that a command exiting non-zero is not an error at this layer.
/// Only transport-level failures (connect, auth, channel death) surface here.
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Failed to connect to remote host
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// SSH key error
    #[error("SSH key error: {0}")]
    SshKeyError(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    IoError(String),

    /// File transfer failed
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Connection not established
    #[error("not connected")]
    NotConnected,
}

impl ExecError {
    /// Check if error occurred before any command was dispatched
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ExecError::ConnectionFailed(_)
                | ExecError::AuthenticationFailed(_)
                | ExecError::SshKeyError(_)
        )
    }
}
