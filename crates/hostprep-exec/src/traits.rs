//! Remote shell trait

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// One authenticated shell on one host
///
/// Implementations execute exactly one POSIX shell command per `run` call.
/// Commands issued on one shell execute strictly in issue order; there is a
/// single logical channel and no two commands run concurrently.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run a shell command and capture its result
    ///
    /// A non-zero exit status is a normal, inspectable outcome, not an
    /// error. Only transport-level failures fail the call.
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Copy bytes to a file on the remote host over the same channel
    async fn upload(&self, data: &[u8], remote_path: &str) -> Result<(), ExecError>;

    /// Shell type identifier (for logging)
    fn shell_type(&self) -> &'static str;
}
