//! Read-only status report across all targets

use serde::Serialize;
use tracing::instrument;

use hostprep_engine::{Probe, ProbeStrategy};
use hostprep_exec::RemoteShell;

use crate::nginx::nginx_probe;
use crate::toolset::base_tools;

/// Probed state of one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetStatus {
    /// Target or tool name
    pub name: String,
    /// Whether it was detected
    pub installed: bool,
    /// Version text, when surfaced
    pub version: Option<String>,
    /// For services: whether the unit is active
    pub running: Option<bool>,
}

/// Probe every known target without mutating the host
#[instrument(skip(shell))]
pub async fn probe_all(shell: &dyn RemoteShell) -> Vec<TargetStatus> {
    let mut statuses = Vec::new();

    for tool in base_tools() {
        let mut strategies = Vec::new();
        if !tool.binary.is_empty() {
            strategies.push(ProbeStrategy::PathLookup(tool.binary.to_string()));
        }
        strategies.push(ProbeStrategy::DpkgRecord(tool.package.to_string()));

        let result = Probe::new(tool.package, strategies).run(shell).await;
        statuses.push(TargetStatus {
            name: tool.package.to_string(),
            installed: result.installed,
            version: result.version,
            running: None,
        });
    }

    let web = nginx_probe().run(shell).await;
    statuses.push(TargetStatus {
        name: "nginx".to_string(),
        installed: web.installed,
        version: web.version,
        running: web.running,
    });

    let certbot = Probe::new(
        "certbot",
        vec![
            ProbeStrategy::PathLookup("certbot".to_string()),
            ProbeStrategy::DpkgRecord("certbot".to_string()),
        ],
    )
    .with_version_command("certbot --version 2>&1")
    .run(shell)
    .await;
    statuses.push(TargetStatus {
        name: "certbot".to_string(),
        installed: certbot.installed,
        version: certbot.version,
        running: None,
    });

    let editor = Probe::new(
        "code-server",
        vec![
            ProbeStrategy::PathLookup("code-server".to_string()),
            ProbeStrategy::DpkgRecord("code-server".to_string()),
        ],
    )
    .with_version_command("code-server --version")
    .run(shell)
    .await;
    statuses.push(TargetStatus {
        name: "code-server".to_string(),
        installed: editor.installed,
        version: editor.version,
        running: None,
    });

    statuses
}
