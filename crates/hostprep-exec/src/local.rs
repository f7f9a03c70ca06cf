//! Local command execution using `tokio::process`

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::RemoteShell;

/// Local shell
///
/// Runs commands on the local machine through `sh -c`. Useful for
/// provisioning localhost and for exercising the engine without a network.
#[derive(Debug, Clone)]
pub struct LocalShell;

impl LocalShell {
    /// Create a new local shell
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteShell for LocalShell {
    #[instrument(skip(self), level = "debug")]
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        debug!(command = %cmd, "executing local command");

        // Use shell to support pipes, redirections, etc.
        let child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(
            command = %cmd,
            status = status,
            duration = ?duration,
            "command completed"
        );

        if !output.status.success() {
            error!(
                command = %cmd,
                status = status,
                stderr = %stderr,
                "command failed"
            );
        }

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }

    #[instrument(skip(self, data), level = "debug")]
    async fn upload(&self, data: &[u8], remote_path: &str) -> Result<(), ExecError> {
        if let Some(parent) = Path::new(remote_path).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExecError::UploadFailed(e.to_string()))?;
        }
        tokio::fs::write(remote_path, data)
            .await
            .map_err(|e| ExecError::UploadFailed(e.to_string()))
    }

    fn shell_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_success() {
        let shell = LocalShell::new();
        let result = shell.run("echo hello").await.unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_failure() {
        let shell = LocalShell::new();
        let result = shell.run("exit 42").await.unwrap();

        assert!(!result.success());
        assert_eq!(result.status, 42);
    }

    #[tokio::test]
    async fn test_run_with_stderr() {
        let shell = LocalShell::new();
        let result = shell.run("echo error >&2").await.unwrap();

        assert!(result.success());
        assert_eq!(result.stderr.trim(), "error");
    }

    #[tokio::test]
    async fn test_upload_writes_file() {
        let shell = LocalShell::new();
        let path = std::env::temp_dir().join(format!("hostprep_upload_{}", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        shell.upload(b"payload", &path_str).await.unwrap();

        let content = tokio::fs::read(&path).await.unwrap();
        assert_eq!(content, b"payload");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
