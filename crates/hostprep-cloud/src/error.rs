//! Error types for hostprep-cloud

use thiserror::Error;

/// Errors from the instance lifecycle collaborator
#[derive(Error, Debug, Clone)]
pub enum CloudError {
    /// The provider API rejected or failed a request
    #[error("provider error: {0}")]
    Provider(String),

    /// The instance never reached the awaited state within the attempt
    /// ceiling
    #[error("instance {id} not {awaited} after {attempts} polls")]
    WaitTimeout {
        /// Instance identifier
        id: String,
        /// State that was awaited
        awaited: &'static str,
        /// Number of polls performed
        attempts: u32,
    },
}
