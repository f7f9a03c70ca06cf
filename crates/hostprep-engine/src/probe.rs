//! Idempotency probing: read-only detection of installed/running state
//!
//! Detection methods are tried in a fixed fallback order, stopping at the
//! first positive signal. Any single method can be defeated by a
//! non-standard install (custom prefix, PATH not inherited by the
//! non-interactive shell, package record without the binary), hence the
//! chain.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use hostprep_exec::RemoteShell;

use crate::shell::quote;

/// Current state of a target on the remote host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the target is present
    pub installed: bool,
    /// Version or identifier text, when a detection method surfaced one
    pub version: Option<String>,
    /// For services: whether the unit is active, independent of installed
    pub running: Option<bool>,
}

impl ProbeResult {
    /// A negative result (nothing detected)
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }
}

/// One read-only detection method
#[derive(Debug, Clone)]
pub enum ProbeStrategy {
    /// Check well-known binary locations (`test -x`)
    WellKnownPath(Vec<String>),
    /// Resolve through the shell's PATH (`command -v`)
    PathLookup(String),
    /// Check the dpkg database for an installed record
    DpkgRecord(String),
    /// Check systemd for a unit file
    SystemdUnit(String),
    /// Check an arbitrary filesystem path exists (`test -e`)
    PathExists(String),
}

impl ProbeStrategy {
    /// Run this detection method; `None` means no positive signal
    async fn detect(&self, shell: &dyn RemoteShell) -> Option<String> {
        match self {
            ProbeStrategy::WellKnownPath(paths) => {
                for path in paths {
                    let cmd = format!("test -x {}", quote(path));
                    if let Ok(result) = shell.run(&cmd).await
                        && result.success()
                    {
                        return Some(path.clone());
                    }
                }
                None
            }
            ProbeStrategy::PathLookup(name) => {
                let cmd = format!("command -v {}", quote(name));
                match shell.run(&cmd).await {
                    Ok(result) if result.success() => {
                        let path = result.stdout.trim().to_string();
                        (!path.is_empty()).then_some(path)
                    }
                    _ => None,
                }
            }
            ProbeStrategy::DpkgRecord(package) => {
                let cmd = format!("dpkg-query -W -f='${{Status}}' {}", quote(package));
                match shell.run(&cmd).await {
                    Ok(result) if result.success() && result.stdout.contains("install ok installed") => {
                        Some(package.clone())
                    }
                    _ => None,
                }
            }
            ProbeStrategy::SystemdUnit(unit) => {
                let cmd = format!("systemctl list-unit-files --no-legend {}", quote(unit));
                match shell.run(&cmd).await {
                    Ok(result) if result.success() && !result.stdout.trim().is_empty() => {
                        Some(unit.clone())
                    }
                    _ => None,
                }
            }
            ProbeStrategy::PathExists(path) => {
                let cmd = format!("test -e {}", quote(path));
                match shell.run(&cmd).await {
                    Ok(result) if result.success() => Some(path.clone()),
                    _ => None,
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ProbeStrategy::WellKnownPath(_) => "well-known-path",
            ProbeStrategy::PathLookup(_) => "path-lookup",
            ProbeStrategy::DpkgRecord(_) => "dpkg-record",
            ProbeStrategy::SystemdUnit(_) => "systemd-unit",
            ProbeStrategy::PathExists(_) => "path-exists",
        }
    }
}

/// Ordered detection chain for one target
#[derive(Debug, Clone)]
pub struct Probe {
    /// Target name, for logging
    target: String,
    /// Detection methods, tried in order
    strategies: Vec<ProbeStrategy>,
    /// Optional command whose first stdout line is recorded as the version
    version_command: Option<String>,
    /// Optional systemd unit whose active state is reported
    service_unit: Option<String>,
}

impl Probe {
    /// Create a probe with its fallback chain
    pub fn new(target: impl Into<String>, strategies: Vec<ProbeStrategy>) -> Self {
        Self {
            target: target.into(),
            strategies,
            version_command: None,
            service_unit: None,
        }
    }

    /// Record the first line of this command's stdout as the version
    #[must_use]
    pub fn with_version_command(mut self, cmd: impl Into<String>) -> Self {
        self.version_command = Some(cmd.into());
        self
    }

    /// Also report whether this systemd unit is active
    #[must_use]
    pub fn with_service(mut self, unit: impl Into<String>) -> Self {
        self.service_unit = Some(unit.into());
        self
    }

    /// Target name
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run the detection chain
    ///
    /// Never fails: transport errors and inconclusive output are coerced to
    /// `installed=false`. No command issued here mutates the host.
    #[instrument(skip(self, shell), fields(target = %self.target))]
    pub async fn run(&self, shell: &dyn RemoteShell) -> ProbeResult {
        let mut result = ProbeResult::absent();

        for strategy in &self.strategies {
            if let Some(identifier) = strategy.detect(shell).await {
                debug!(
                    target = %self.target,
                    strategy = strategy.name(),
                    identifier = %identifier,
                    "probe positive"
                );
                result.installed = true;
                break;
            }
        }

        if result.installed
            && let Some(cmd) = &self.version_command
            && let Ok(out) = shell.run(cmd).await
            && out.success()
        {
            result.version = out.stdout.lines().next().map(|l| l.trim().to_string());
        }

        // Running state is independent of installed state
        if let Some(unit) = &self.service_unit {
            let cmd = format!("systemctl is-active {}", quote(unit));
            result.running = match shell.run(&cmd).await {
                Ok(out) => Some(out.stdout.trim() == "active"),
                Err(_) => None,
            };
        }

        debug!(
            target = %self.target,
            installed = result.installed,
            running = ?result.running,
            "probe complete"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedShell;

    #[tokio::test]
    async fn test_first_positive_short_circuits() {
        let shell = ScriptedShell::new().ok_on("test -x '/usr/bin/git'");

        let probe = Probe::new(
            "git",
            vec![
                ProbeStrategy::WellKnownPath(vec!["/usr/bin/git".to_string()]),
                ProbeStrategy::PathLookup("git".to_string()),
            ],
        );

        let result = probe.run(&shell).await;
        assert!(result.installed);

        // The later strategy must not have been tried
        let commands = shell.commands();
        assert!(!commands.iter().any(|c| c.contains("command -v")));
    }

    #[tokio::test]
    async fn test_fallback_to_later_strategy() {
        let shell = ScriptedShell::new().ok_on_with("command -v 'nginx'", "/usr/sbin/nginx\n");

        let probe = Probe::new(
            "nginx",
            vec![
                ProbeStrategy::WellKnownPath(vec!["/opt/nginx/sbin/nginx".to_string()]),
                ProbeStrategy::PathLookup("nginx".to_string()),
            ],
        );

        let result = probe.run(&shell).await;
        assert!(result.installed);
    }

    #[tokio::test]
    async fn test_no_signal_is_not_installed() {
        let shell = ScriptedShell::new();

        let probe = Probe::new(
            "node",
            vec![
                ProbeStrategy::PathLookup("node".to_string()),
                ProbeStrategy::DpkgRecord("nodejs".to_string()),
            ],
        );

        let result = probe.run(&shell).await;
        assert!(!result.installed);
        assert!(result.version.is_none());
    }

    #[tokio::test]
    async fn test_service_running_reported_independently() {
        // Unit is active even though no install signal fires
        let shell = ScriptedShell::new().ok_on_with("systemctl is-active 'nginx'", "active\n");

        let probe = Probe::new(
            "nginx",
            vec![ProbeStrategy::PathLookup("nginx".to_string())],
        )
        .with_service("nginx");

        let result = probe.run(&shell).await;
        assert!(!result.installed);
        assert_eq!(result.running, Some(true));
    }

    #[tokio::test]
    async fn test_dpkg_status_text_must_match() {
        let shell = ScriptedShell::new()
            .ok_on_with("dpkg-query -W -f='${Status}' 'git'", "deinstall ok config-files");

        let probe = Probe::new("git", vec![ProbeStrategy::DpkgRecord("git".to_string())]);

        let result = probe.run(&shell).await;
        assert!(!result.installed);
    }
}
