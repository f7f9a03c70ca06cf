//! SSH key management and resolution

use std::env;
use std::path::PathBuf;

use tracing::{debug, warn};

/// SSH key resolution strategy
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Explicit path to key file, with optional passphrase
    Path {
        path: PathBuf,
        passphrase: Option<String>,
    },
    /// Base64-encoded key from environment
    Env(String),
}

impl KeySource {
    /// Create a path-based key source without passphrase
    pub fn path(path: impl Into<PathBuf>) -> Self {
        KeySource::Path {
            path: path.into(),
            passphrase: None,
        }
    }

    /// Resolve key source to a usable key file
    ///
    /// Validation happens here, before any network attempt: a missing or
    /// world-readable key file fails locally.
    ///
    /// # Errors
    /// Returns `KeyError` if key resolution fails (file missing, bad
    /// permissions, env not set, invalid base64)
    pub fn resolve(&self) -> Result<ResolvedKey, KeyError> {
        match self {
            KeySource::Path { path, passphrase } => {
                if !path.exists() {
                    return Err(KeyError::NotFound(path.display().to_string()));
                }
                validate_key_permissions(path)?;
                Ok(ResolvedKey::Path {
                    path: path.clone(),
                    passphrase: passphrase.clone(),
                })
            }
            KeySource::Env(var_name) => {
                let base64_key =
                    env::var(var_name).map_err(|_| KeyError::EnvNotSet(var_name.clone()))?;
                let key_data = base64_decode(&base64_key).map_err(|_| KeyError::InvalidBase64)?;

                let temp_path = write_temp_key(&key_data)?;
                Ok(ResolvedKey::Temp(temp_path))
            }
        }
    }
}

/// Resolved key location
#[derive(Debug)]
pub enum ResolvedKey {
    /// Path to key file
    Path {
        path: PathBuf,
        passphrase: Option<String>,
    },
    /// Temporary file (will be deleted on drop)
    Temp(PathBuf),
}

impl ResolvedKey {
    /// Get path for the SSH library
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            ResolvedKey::Path { path, .. } | ResolvedKey::Temp(path) => path,
        }
    }

    /// Passphrase protecting the key, if any
    #[must_use]
    pub fn passphrase(&self) -> Option<&str> {
        match self {
            ResolvedKey::Path { passphrase, .. } => passphrase.as_deref(),
            ResolvedKey::Temp(_) => None,
        }
    }
}

/// Key resolution errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("environment variable {0} not set")]
    EnvNotSet(String),

    #[error("invalid base64 encoding")]
    InvalidBase64,

    #[error("key file permissions too open: {0} (should be 600)")]
    BadPermissions(String),

    #[error("key file not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn base64_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(input.trim())
}

fn validate_key_permissions(path: &PathBuf) -> Result<(), KeyError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).map_err(KeyError::Io)?;

    let permissions = metadata.permissions();
    let mode = permissions.mode();

    // mode & 0o77 checks group and other permissions
    if mode & 0o77 != 0 {
        return Err(KeyError::BadPermissions(path.display().to_string()));
    }

    Ok(())
}

fn write_temp_key(key_data: &[u8]) -> Result<PathBuf, KeyError> {
    use std::fs::File;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let temp_path = std::env::temp_dir().join(format!("hostprep_ssh_key_{}", std::process::id()));

    let mut file = File::create(&temp_path)?;
    file.write_all(key_data)?;

    let mut permissions = file.metadata()?.permissions();
    permissions.set_mode(0o600);
    std::fs::set_permissions(&temp_path, permissions)?;

    debug!(path = %temp_path.display(), "wrote temporary SSH key");

    Ok(temp_path)
}

impl Drop for ResolvedKey {
    fn drop(&mut self) {
        if let ResolvedKey::Temp(path) = self {
            let path_clone = path.clone();
            if let Err(e) = std::fs::remove_file(&path_clone) {
                warn!(path = %path_clone.display(), error = %e, "failed to remove temp key");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_file_fails_locally() {
        let source = KeySource::path("/nonexistent/hostprep-test-key");
        let err = source.resolve().unwrap_err();
        assert!(matches!(err, KeyError::NotFound(_)));
    }

    #[test]
    fn test_open_permissions_rejected() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("hostprep_key_test_{}", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not a real key").unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o644);
        std::fs::set_permissions(&path, perms).unwrap();

        let err = KeySource::path(&path).resolve().unwrap_err();
        assert!(matches!(err, KeyError::BadPermissions(_)));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_env_key_missing_var() {
        let source = KeySource::Env("HOSTPREP_TEST_KEY_UNSET".to_string());
        let err = source.resolve().unwrap_err();
        assert!(matches!(err, KeyError::EnvNotSet(_)));
    }
}
