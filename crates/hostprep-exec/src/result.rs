//! Result and connection types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result of a command execution
///
/// An exit status of zero is the sole success signal. stdout and stderr are
/// captured independently, each concatenated in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Combine stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Connection descriptor for one SSH session
///
/// Immutable once a session is opened with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Host address (hostname or IPv4 literal)
    pub host: String,
    /// Port (default 22)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username (default admin, the Debian cloud image login)
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_port() -> u16 {
    22
}

fn default_user() -> String {
    "admin".to_string()
}

impl ConnectionSpec {
    /// Create new connection spec with default port and user
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            user: default_user(),
        }
    }

    /// Set username
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec = ConnectionSpec::new("203.0.113.10");
        assert_eq!(spec.port, 22);
        assert_eq!(spec.user, "admin");
    }

    #[test]
    fn test_result_success() {
        let result = CommandResult {
            status: 0,
            stdout: "ok".to_string(),
            stderr: String::new(),
            duration: Duration::from_millis(1),
        };
        assert!(result.success());
        assert_eq!(result.combined_output(), "ok");
    }

    #[test]
    fn test_result_nonzero_is_not_success() {
        let result = CommandResult {
            status: 1,
            stdout: String::new(),
            stderr: "boom".to_string(),
            duration: Duration::from_millis(1),
        };
        assert!(!result.success());
    }
}
