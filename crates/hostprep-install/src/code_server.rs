//! Editor server installer (code-server behind the web server with TLS)

use tracing::instrument;

use hostprep_engine::shell::{quote, validate_domain, validate_token};
use hostprep_engine::{Probe, ProbeStrategy, Sequencer, Step, run_step};
use hostprep_exec::RemoteShell;

use crate::certbot::live_cert_dir;
use crate::error::InstallError;
use crate::facade::{FacadeState, Flow, maybe_sudo};
use crate::nginx::nginx_probe;
use crate::outcome::{InstallAction, InstallOutcome};

const INSTALL_SCRIPT_URL: &str = "https://code-server.dev/install.sh";
const BIND_ADDR: &str = "127.0.0.1:8080";

/// Configuration for the editor server
#[derive(Debug, Clone)]
pub struct CodeServerConfig {
    /// Domain the editor is served on (must already hold a certificate)
    pub domain: String,
    /// Login password written to the editor config
    pub password: String,
}

fn code_server_probe(unit: Option<&str>) -> Probe {
    let probe = Probe::new(
        "code-server",
        vec![
            ProbeStrategy::WellKnownPath(vec![
                "/usr/bin/code-server".to_string(),
                "/usr/local/bin/code-server".to_string(),
            ]),
            ProbeStrategy::PathLookup("code-server".to_string()),
            ProbeStrategy::DpkgRecord("code-server".to_string()),
        ],
    )
    .with_version_command("code-server --version");

    match unit {
        Some(unit) => probe.with_service(unit),
        None => probe,
    }
}

/// Installs code-server and publishes it through the web server with TLS
pub struct CodeServerInstaller {
    config: CodeServerConfig,
    use_sudo: bool,
}

impl CodeServerInstaller {
    /// Create the installer
    #[must_use]
    pub fn new(config: CodeServerConfig, use_sudo: bool) -> Self {
        Self { config, use_sudo }
    }

    /// Ensure code-server is installed, configured and reachable
    ///
    /// Precondition, re-checked immediately before installing even when
    /// previously confirmed: a certificate for the domain must exist. The
    /// check runs before the download step and issues no mutating command.
    ///
    /// # Errors
    /// `InstallError::Precondition` when the certificate or web server is
    /// missing, `InstallError::StepFailed` / `InstallError::Verification`
    /// from the install sequence
    #[instrument(skip(self, shell), fields(domain = %self.config.domain))]
    pub async fn ensure_installed(
        &self,
        shell: &dyn RemoteShell,
    ) -> Result<InstallOutcome, InstallError> {
        let domain = validate_domain(&self.config.domain)?;
        if self.config.password.is_empty() || self.config.password.chars().any(char::is_control) {
            return Err(InstallError::Precondition(
                "editor password must be non-empty printable text".to_string(),
            ));
        }

        let mut flow = Flow::new("code-server");

        let before = code_server_probe(None).run(shell).await;
        flow.to(FacadeState::Probed {
            installed: before.installed,
        });

        if before.installed {
            flow.to(FacadeState::Skipped);
            return Ok(InstallOutcome::new("code-server", InstallAction::Skipped)
                .with_version(before.version)
                .with_url(format!("https://{domain}/")));
        }

        // Both preconditions are read-only and run before the download step
        let web = nginx_probe().run(shell).await;
        if !web.installed {
            return Err(InstallError::Precondition(
                "web server not installed; the editor is published through it".to_string(),
            ));
        }

        let cert_dir = live_cert_dir(domain);
        let cert = Probe::new(
            "certificate",
            vec![ProbeStrategy::PathExists(cert_dir.clone())],
        )
        .run(shell)
        .await;
        if !cert.installed {
            return Err(InstallError::Precondition(format!(
                "no certificate for {domain} (expected {cert_dir}); issue one first"
            )));
        }

        // The per-user service unit needs the login user's name
        let whoami = run_step(shell, "detect login user", "whoami", true).await?;
        let user = whoami.stdout.trim().to_string();
        let user = validate_token("user", &user)?.to_string();
        let unit = format!("code-server@{user}");

        flow.to(FacadeState::Sequencing);

        let config_write = format!(
            "mkdir -p {{home}}/.config/code-server && \
             printf 'bind-addr: {BIND_ADDR}\\nauth: password\\npassword: %s\\ncert: false\\n' \
             {} > {{home}}/.config/code-server/config.yaml",
            quote(&self.config.password)
        );

        let site = reverse_proxy_site(domain);
        let site_write = format!(
            "printf '%s\\n' {} | {}",
            quote(&site),
            maybe_sudo(
                self.use_sudo,
                "tee /etc/nginx/sites-available/code-server >/dev/null"
            )
        );

        let steps = vec![
            Step::new("detect home directory", "echo $HOME")
                .quiet()
                .capture("home"),
            Step::new(
                "download and run install script",
                format!("curl -fsSL {INSTALL_SCRIPT_URL} | sh"),
            ),
            Step::new("write editor config", config_write).quiet(),
            Step::new(
                "enable editor service",
                maybe_sudo(self.use_sudo, &format!("systemctl enable --now {unit}")),
            ),
            Step::new("write reverse proxy site", site_write).quiet(),
            Step::new(
                "enable reverse proxy site",
                maybe_sudo(
                    self.use_sudo,
                    "ln -sf ../sites-available/code-server /etc/nginx/sites-enabled/code-server",
                ),
            ),
            Step::new(
                "test web server config",
                maybe_sudo(self.use_sudo, "nginx -t"),
            ),
            Step::new(
                "reload web server",
                maybe_sudo(self.use_sudo, "systemctl reload nginx"),
            ),
        ];

        Sequencer::new("code-server", steps).run(shell).await?;

        let after = code_server_probe(Some(&unit)).run(shell).await;
        if !after.installed {
            flow.to(FacadeState::Failed);
            return Err(InstallError::Verification(
                "code-server binary not found after install".to_string(),
            ));
        }

        flow.to(FacadeState::Verified);

        Ok(InstallOutcome::new("code-server", InstallAction::Installed)
            .with_version(after.version)
            .with_running(after.running)
            .with_url(format!("https://{domain}/"))
            .with_detail(format!("service unit {unit}")))
    }
}

/// Render the TLS reverse-proxy server block for the editor
fn reverse_proxy_site(domain: &str) -> String {
    format!(
        "server {{\n\
         \tlisten 443 ssl;\n\
         \tserver_name {domain};\n\
         \tssl_certificate /etc/letsencrypt/live/{domain}/fullchain.pem;\n\
         \tssl_certificate_key /etc/letsencrypt/live/{domain}/privkey.pem;\n\
         \tlocation / {{\n\
         \t\tproxy_pass http://{BIND_ADDR}/;\n\
         \t\tproxy_set_header Host $host;\n\
         \t\tproxy_set_header Upgrade $http_upgrade;\n\
         \t\tproxy_set_header Connection upgrade;\n\
         \t\tproxy_set_header Accept-Encoding gzip;\n\
         \t}}\n\
         }}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_proxy_site_names_domain_and_cert() {
        let site = reverse_proxy_site("code.example.com");
        assert!(site.contains("server_name code.example.com;"));
        assert!(site.contains("/etc/letsencrypt/live/code.example.com/fullchain.pem"));
        assert!(site.contains("proxy_pass http://127.0.0.1:8080/;"));
    }
}
