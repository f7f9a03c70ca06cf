//! SSH session using russh crate

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{ChannelMsg, Disconnect, client};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::error::ExecError;
use crate::keys::KeySource;
use crate::result::{CommandResult, ConnectionSpec};
use crate::traits::RemoteShell;

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler;

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Accept all server keys (like StrictHostKeyChecking=no)
        // In production, this should verify against known_hosts
        Ok(true)
    }
}

/// One authenticated SSH session to a single host
///
/// The session is opened (connected and authenticated) by [`SshSession::open`]
/// and held for the lifetime of one orchestration run. Commands are
/// serialized behind a mutex so they execute strictly in issue order.
pub struct SshSession {
    /// Connection descriptor
    spec: ConnectionSpec,
    /// SSH session handle
    session: Mutex<Option<client::Handle<SshClientHandler>>>,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl SshSession {
    /// Open an authenticated session to the remote host
    ///
    /// Key material is resolved and validated before any network attempt,
    /// so a missing or unreadable key file fails without touching the wire.
    ///
    /// # Errors
    /// Returns `ExecError::SshKeyError` if key resolution fails,
    /// `ExecError::ConnectionFailed` if the host is unreachable and
    /// `ExecError::AuthenticationFailed` if the server rejects the key.
    #[instrument(skip(key_source), fields(host = %spec.host))]
    pub async fn open(spec: ConnectionSpec, key_source: &KeySource) -> Result<Self, ExecError> {
        let key = key_source
            .resolve()
            .map_err(|e| ExecError::SshKeyError(e.to_string()))?;

        info!(
            host = %spec.host,
            port = spec.port,
            user = %spec.user,
            "opening SSH session"
        );

        let config = Arc::new(client::Config::default());
        let handler = SshClientHandler;

        let mut session = client::connect(config, (&spec.host[..], spec.port), handler)
            .await
            .map_err(|e| ExecError::ConnectionFailed(e.to_string()))?;

        let key_pair = load_secret_key(key.path(), key.passphrase())
            .map_err(|e| ExecError::SshKeyError(e.to_string()))?;

        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        let auth_res = session
            .authenticate_publickey(
                &spec.user,
                PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg),
            )
            .await
            .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?;

        if !auth_res.success() {
            return Err(ExecError::AuthenticationFailed(
                "Public key authentication failed".to_string(),
            ));
        }

        info!(host = %spec.host, "SSH session open and authenticated");

        Ok(Self {
            spec,
            session: Mutex::new(Some(session)),
        })
    }

    /// Get the connection descriptor
    pub fn connection_spec(&self) -> &ConnectionSpec {
        &self.spec
    }

    /// Close the session
    ///
    /// Must be invoked exactly once on every exit path of a run. Closing an
    /// already-closed session is a no-op.
    ///
    /// # Errors
    /// Returns `ExecError::IoError` if disconnection fails
    pub async fn close(&self) -> Result<(), ExecError> {
        let mut session_lock = self.session.lock().await;

        if let Some(session) = session_lock.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
                .map_err(|e| ExecError::IoError(e.to_string()))?;
            info!(host = %self.spec.host, "SSH session closed");
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteShell for SshSession {
    #[instrument(skip(self, cmd), fields(host = %self.spec.host))]
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let mut session_lock = self.session.lock().await;

        let session = session_lock.as_mut().ok_or(ExecError::NotConnected)?;

        debug!(command = %cmd, "executing remote command");

        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let mut status = -1;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        loop {
            let msg = channel.wait().await;

            match msg {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        // stderr
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    status = exit_status.cast_signed();
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        debug!(
            command = %cmd,
            status = status,
            duration = ?duration,
            "remote command completed"
        );

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }

    #[instrument(skip(self, data), fields(host = %self.spec.host, bytes = data.len()))]
    async fn upload(&self, data: &[u8], remote_path: &str) -> Result<(), ExecError> {
        let mut session_lock = self.session.lock().await;

        let session = session_lock.as_mut().ok_or(ExecError::NotConnected)?;

        debug!(path = %remote_path, "uploading file");

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        // Stream the bytes into a remote cat over the exec channel
        let cmd = format!("cat > '{}'", remote_path.replace('\'', "'\"'\"'"));
        channel
            .exec(true, cmd.as_str())
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        channel
            .data(data)
            .await
            .map_err(|e| ExecError::UploadFailed(e.to_string()))?;
        channel
            .eof()
            .await
            .map_err(|e| ExecError::UploadFailed(e.to_string()))?;

        let mut status = -1;
        loop {
            match channel.wait().await {
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    status = exit_status.cast_signed();
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        if status != 0 {
            return Err(ExecError::UploadFailed(format!(
                "remote write to {remote_path} exited {status}"
            )));
        }

        info!(path = %remote_path, bytes = data.len(), "upload complete");
        Ok(())
    }

    fn shell_type(&self) -> &'static str {
        "ssh"
    }
}

#[cfg(test)]
mod tests {
    // These tests require an SSH server - marked as ignored
    #[tokio::test]
    #[ignore = "requires SSH server"]
    async fn test_ssh_session_open() {
        // Would require a test SSH server or mocking
    }
}
