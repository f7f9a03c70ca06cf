//! Web server installer (nginx)

use tracing::instrument;

use hostprep_engine::{Probe, ProbeStrategy, Sequencer, Step};
use hostprep_exec::RemoteShell;

use crate::error::InstallError;
use crate::facade::{FacadeState, Flow, maybe_sudo};
use crate::outcome::{InstallAction, InstallOutcome};

/// Detection chain for the nginx binary and service
#[must_use]
pub(crate) fn nginx_probe() -> Probe {
    Probe::new(
        "nginx",
        vec![
            ProbeStrategy::WellKnownPath(vec!["/usr/sbin/nginx".to_string()]),
            ProbeStrategy::PathLookup("nginx".to_string()),
            ProbeStrategy::DpkgRecord("nginx".to_string()),
            ProbeStrategy::SystemdUnit("nginx.service".to_string()),
        ],
    )
    // nginx prints its version to stderr
    .with_version_command("nginx -v 2>&1")
    .with_service("nginx")
}

/// Installs nginx and brings the service up
pub struct NginxInstaller {
    use_sudo: bool,
}

impl NginxInstaller {
    /// Create the installer
    #[must_use]
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    /// Ensure nginx is installed and the service is enabled and running
    ///
    /// # Errors
    /// `InstallError::StepFailed` when a mutating step exits non-zero,
    /// `InstallError::Verification` when the re-probe still reports the
    /// binary absent
    #[instrument(skip(self, shell))]
    pub async fn ensure_installed(
        &self,
        shell: &dyn RemoteShell,
    ) -> Result<InstallOutcome, InstallError> {
        let mut flow = Flow::new("nginx");

        let probe = nginx_probe();
        let before = probe.run(shell).await;
        flow.to(FacadeState::Probed {
            installed: before.installed,
        });

        if before.installed {
            flow.to(FacadeState::Skipped);
            return Ok(InstallOutcome::new("nginx", InstallAction::Skipped)
                .with_version(before.version)
                .with_running(before.running));
        }

        flow.to(FacadeState::Sequencing);

        let steps = vec![
            Step::new(
                "refresh package index",
                maybe_sudo(self.use_sudo, "apt-get update -q"),
            ),
            Step::new(
                "install nginx",
                maybe_sudo(
                    self.use_sudo,
                    "DEBIAN_FRONTEND=noninteractive apt-get install -y nginx",
                ),
            ),
            Step::new(
                "enable and start web server",
                maybe_sudo(self.use_sudo, "systemctl enable --now nginx"),
            ),
        ];

        Sequencer::new("nginx", steps).run(shell).await?;

        let after = probe.run(shell).await;
        if !after.installed {
            flow.to(FacadeState::Failed);
            return Err(InstallError::Verification(
                "nginx binary not found after install".to_string(),
            ));
        }

        flow.to(FacadeState::Verified);

        Ok(InstallOutcome::new("nginx", InstallAction::Installed)
            .with_version(after.version)
            .with_running(after.running))
    }
}
