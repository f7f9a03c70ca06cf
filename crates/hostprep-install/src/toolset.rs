//! Base tool bundle installer: git, curl, unzip, build tools, Node.js

use tracing::{info, instrument};

use hostprep_engine::shell::validate_package;
use hostprep_engine::{Probe, ProbeStrategy, Sequencer, Step};
use hostprep_exec::RemoteShell;

use crate::error::InstallError;
use crate::facade::{FacadeState, Flow, maybe_sudo};
use crate::outcome::{InstallAction, InstallOutcome};

const NODESOURCE_SETUP_URL: &str = "https://deb.nodesource.com/setup_20.x";

/// One tool in the bundle
#[derive(Debug, Clone)]
pub struct Tool {
    /// Binary name probed through PATH (empty for meta packages)
    pub binary: &'static str,
    /// Debian package identifier
    pub package: &'static str,
    /// Well-known binary locations checked first
    pub well_known: &'static [&'static str],
}

impl Tool {
    fn probe(&self) -> Probe {
        let mut strategies = Vec::new();
        if !self.well_known.is_empty() {
            strategies.push(ProbeStrategy::WellKnownPath(
                self.well_known.iter().map(ToString::to_string).collect(),
            ));
        }
        if !self.binary.is_empty() {
            strategies.push(ProbeStrategy::PathLookup(self.binary.to_string()));
        }
        strategies.push(ProbeStrategy::DpkgRecord(self.package.to_string()));
        Probe::new(self.package, strategies)
    }
}

/// The default bundle for a freshly provisioned Debian host
#[must_use]
pub fn base_tools() -> Vec<Tool> {
    vec![
        Tool {
            binary: "git",
            package: "git",
            well_known: &["/usr/bin/git"],
        },
        Tool {
            binary: "curl",
            package: "curl",
            well_known: &["/usr/bin/curl"],
        },
        Tool {
            binary: "unzip",
            package: "unzip",
            well_known: &["/usr/bin/unzip"],
        },
        Tool {
            // Meta package, no single binary to look for
            binary: "",
            package: "build-essential",
            well_known: &[],
        },
        Tool {
            binary: "node",
            package: "nodejs",
            well_known: &["/usr/bin/node", "/usr/local/bin/node"],
        },
    ]
}

/// Installs the base tool bundle, one package-manager transaction for all
/// missing tools
pub struct ToolsetInstaller {
    tools: Vec<Tool>,
    use_sudo: bool,
}

impl ToolsetInstaller {
    /// Create with the default bundle
    #[must_use]
    pub fn new(use_sudo: bool) -> Self {
        Self {
            tools: base_tools(),
            use_sudo,
        }
    }

    /// Create with a custom bundle
    #[must_use]
    pub fn with_tools(tools: Vec<Tool>, use_sudo: bool) -> Self {
        Self { tools, use_sudo }
    }

    /// Ensure every tool in the bundle is installed
    ///
    /// Probes each tool independently; only missing packages enter the
    /// install transaction. Node.js additionally registers the NodeSource
    /// repository before the install when missing.
    ///
    /// # Errors
    /// `InstallError::StepFailed` when a mutating step exits non-zero,
    /// `InstallError::Verification` when a tool is still absent after a
    /// zero-exit sequence
    #[instrument(skip(self, shell))]
    pub async fn ensure_installed(
        &self,
        shell: &dyn RemoteShell,
    ) -> Result<InstallOutcome, InstallError> {
        let mut flow = Flow::new("toolset");

        let mut missing: Vec<&Tool> = Vec::new();
        for tool in &self.tools {
            let result = tool.probe().run(shell).await;
            if !result.installed {
                missing.push(tool);
            }
        }

        flow.to(FacadeState::Probed {
            installed: missing.is_empty(),
        });

        if missing.is_empty() {
            flow.to(FacadeState::Skipped);
            return Ok(InstallOutcome::new("toolset", InstallAction::Skipped)
                .with_detail(format!("all {} tools present", self.tools.len())));
        }

        info!(
            missing = ?missing.iter().map(|t| t.package).collect::<Vec<_>>(),
            "tool bundle incomplete"
        );

        flow.to(FacadeState::Sequencing);

        let packages = missing
            .iter()
            .map(|t| validate_package(t.package).map(ToString::to_string))
            .collect::<Result<Vec<_>, _>>()?
            .join(" ");

        let mut steps = vec![Step::new(
            "refresh package index",
            maybe_sudo(self.use_sudo, "apt-get update -q"),
        )];

        if missing.iter().any(|t| t.package == "nodejs") {
            let pipe_target = if self.use_sudo { "sudo -E bash -" } else { "bash -" };
            steps.push(Step::new(
                "register nodesource repository",
                format!("curl -fsSL {NODESOURCE_SETUP_URL} | {pipe_target}"),
            ));
        }

        steps.push(Step::new(
            "install missing tools",
            maybe_sudo(
                self.use_sudo,
                &format!("DEBIAN_FRONTEND=noninteractive apt-get install -y {packages}"),
            ),
        ));

        Sequencer::new("toolset", steps).run(shell).await?;

        // Re-probe what was missing; the package manager's exit code alone
        // is not trusted
        let mut still_missing = Vec::new();
        for tool in &missing {
            if !tool.probe().run(shell).await.installed {
                still_missing.push(tool.package);
            }
        }

        if !still_missing.is_empty() {
            flow.to(FacadeState::Failed);
            return Err(InstallError::Verification(format!(
                "tools still absent after install: {}",
                still_missing.join(", ")
            )));
        }

        flow.to(FacadeState::Verified);

        Ok(InstallOutcome::new("toolset", InstallAction::Installed).with_detail(format!(
            "installed: {}",
            missing.iter().map(|t| t.package).collect::<Vec<_>>().join(", ")
        )))
    }
}
