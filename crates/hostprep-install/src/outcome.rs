//! Installer outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an `ensure_installed` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    /// Probe reported the target already satisfied; no mutating command ran
    Skipped,
    /// The mutating sequence ran and the re-probe confirmed the end state
    Installed,
}

impl std::fmt::Display for InstallAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallAction::Skipped => write!(f, "already installed"),
            InstallAction::Installed => write!(f, "installed"),
        }
    }
}

/// Terminal value returned to the operator surface for one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallOutcome {
    /// Target name
    pub target: String,
    /// What was done
    pub action: InstallAction,
    /// Version text, when a probe surfaced one
    pub version: Option<String>,
    /// For services: whether the unit is active
    pub running: Option<bool>,
    /// Resulting URL, for targets that expose one
    pub url: Option<String>,
    /// Target-specific summary text
    pub detail: Option<String>,
    /// When the façade finished
    pub completed_at: DateTime<Utc>,
}

impl InstallOutcome {
    /// Create an outcome with only target and action set
    pub fn new(target: impl Into<String>, action: InstallAction) -> Self {
        Self {
            target: target.into(),
            action,
            version: None,
            running: None,
            url: None,
            detail: None,
            completed_at: Utc::now(),
        }
    }

    /// Set version text
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Set running state
    #[must_use]
    pub fn with_running(mut self, running: Option<bool>) -> Self {
        self.running = running;
        self
    }

    /// Set resulting URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set summary text
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
