//! Operator defaults file
//!
//! Optional `hostprep.toml` supplying connection defaults so the flags do
//! not have to be repeated per invocation. Explicit flags always win; the
//! engine crates never read the environment themselves.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level defaults file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    /// Connection defaults
    #[serde(default)]
    pub connection: ConnectionDefaults,
}

/// Connection values merged under explicit flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionDefaults {
    /// Remote host address
    pub host: Option<String>,
    /// SSH username
    pub user: Option<String>,
    /// SSH port
    pub port: Option<u16>,
    /// Private key file
    pub key: Option<PathBuf>,
}

impl Defaults {
    /// Load defaults from a file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &PathBuf) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let defaults: Defaults = toml::from_str(&content)?;
        Ok(defaults)
    }

    /// Load from the override variable or common paths, falling back to
    /// built-in defaults
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("HOSTPREP_CONFIG") {
            return Self::load(&PathBuf::from(path));
        }

        let paths = [
            PathBuf::from("hostprep.toml"),
            dirs::config_dir()
                .map(|p| p.join("hostprep/hostprep.toml"))
                .unwrap_or_default(),
        ];

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Defaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_file() {
        let defaults: Defaults = toml::from_str(
            r#"
            [connection]
            host = "203.0.113.10"
            user = "admin"
            key = "/home/op/.ssh/id_ed25519"
            "#,
        )
        .unwrap();

        assert_eq!(defaults.connection.host.as_deref(), Some("203.0.113.10"));
        assert_eq!(defaults.connection.user.as_deref(), Some("admin"));
        assert!(defaults.connection.port.is_none());
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let defaults: Defaults = toml::from_str("").unwrap();
        assert!(defaults.connection.host.is_none());
    }
}
