//! Certificate issuance via the Let's Encrypt client

use tracing::{debug, instrument};

use hostprep_engine::shell::{quote, validate_domain, validate_email};
use hostprep_engine::{Probe, ProbeStrategy, Sequencer, Step, run_step};
use hostprep_exec::RemoteShell;

use crate::error::InstallError;
use crate::facade::{FacadeState, Flow, maybe_sudo};
use crate::nginx::nginx_probe;
use crate::outcome::{InstallAction, InstallOutcome};

/// Configuration for one certificate
#[derive(Debug, Clone)]
pub struct CertbotConfig {
    /// Domain the certificate is issued for
    pub domain: String,
    /// Registration email for the certificate authority account
    pub email: String,
}

/// Path of the live certificate directory for a domain
#[must_use]
pub(crate) fn live_cert_dir(domain: &str) -> String {
    format!("/etc/letsencrypt/live/{domain}")
}

/// Detection chain for the certbot client binary
fn certbot_probe() -> Probe {
    Probe::new(
        "certbot",
        vec![
            ProbeStrategy::WellKnownPath(vec!["/usr/bin/certbot".to_string()]),
            ProbeStrategy::PathLookup("certbot".to_string()),
            ProbeStrategy::DpkgRecord("certbot".to_string()),
        ],
    )
    .with_version_command("certbot --version 2>&1")
}

/// Obtains a certificate for one domain through the web server
pub struct CertbotInstaller {
    config: CertbotConfig,
    use_sudo: bool,
}

impl CertbotInstaller {
    /// Create the installer
    #[must_use]
    pub fn new(config: CertbotConfig, use_sudo: bool) -> Self {
        Self { config, use_sudo }
    }

    /// Ensure a certificate for the configured domain exists
    ///
    /// Preconditions, both re-checked at call time: the web server must be
    /// installed, and the domain must be HTTP-reachable through it. Neither
    /// check issues a mutating command.
    ///
    /// # Errors
    /// `InstallError::Precondition` when a precondition is unmet or the
    /// domain/email fails validation, `InstallError::StepFailed` /
    /// `InstallError::Verification` from the issuance sequence
    #[instrument(skip(self, shell), fields(domain = %self.config.domain))]
    pub async fn ensure_installed(
        &self,
        shell: &dyn RemoteShell,
    ) -> Result<InstallOutcome, InstallError> {
        let domain = validate_domain(&self.config.domain)?;
        let email = validate_email(&self.config.email)?;

        let mut flow = Flow::new("certbot");

        let cert_dir = live_cert_dir(domain);
        let cert_probe = Probe::new(
            "certificate",
            vec![ProbeStrategy::PathExists(cert_dir.clone())],
        );

        let before = cert_probe.run(shell).await;
        flow.to(FacadeState::Probed {
            installed: before.installed,
        });

        if before.installed {
            flow.to(FacadeState::Skipped);
            return Ok(InstallOutcome::new("certbot", InstallAction::Skipped)
                .with_url(format!("https://{domain}/"))
                .with_detail(format!("certificate present at {cert_dir}")));
        }

        // Certificate issuance only works through an installed web server
        let web = nginx_probe().run(shell).await;
        if !web.installed {
            return Err(InstallError::Precondition(
                "web server not installed; certificate issuance needs it".to_string(),
            ));
        }

        // The domain must answer over plain HTTP before the authority's
        // challenge can succeed
        let reach_cmd = format!(
            "curl -sS -o /dev/null --max-time 10 http://{}/",
            quote(domain)
        );
        let reach = run_step(shell, "check domain reachability", &reach_cmd, true).await?;
        if !reach.success() {
            return Err(InstallError::Precondition(format!(
                "domain {domain} is not HTTP-reachable through the web server: {}",
                reach.stderr.trim()
            )));
        }

        flow.to(FacadeState::Sequencing);

        let client = certbot_probe().run(shell).await;
        debug!(client_installed = client.installed, "certbot client probe");

        let mut steps = Vec::new();
        if !client.installed {
            steps.push(Step::new(
                "refresh package index",
                maybe_sudo(self.use_sudo, "apt-get update -q"),
            ));
            steps.push(Step::new(
                "install certbot",
                maybe_sudo(
                    self.use_sudo,
                    "DEBIAN_FRONTEND=noninteractive apt-get install -y certbot python3-certbot-nginx",
                ),
            ));
        }
        steps.push(Step::new(
            "issue certificate",
            maybe_sudo(
                self.use_sudo,
                &format!(
                    "certbot --nginx -d {} -m {} --agree-tos --non-interactive --redirect",
                    quote(domain),
                    quote(email)
                ),
            ),
        ));

        Sequencer::new("certbot", steps).run(shell).await?;

        let after = cert_probe.run(shell).await;
        if !after.installed {
            flow.to(FacadeState::Failed);
            return Err(InstallError::Verification(format!(
                "no live certificate at {cert_dir} after issuance"
            )));
        }

        flow.to(FacadeState::Verified);

        Ok(InstallOutcome::new("certbot", InstallAction::Installed)
            .with_url(format!("https://{domain}/"))
            .with_detail(format!("certificate issued for {domain}")))
    }
}
