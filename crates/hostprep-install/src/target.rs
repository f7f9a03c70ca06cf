//! Tagged-variant dispatch across installer types

use hostprep_exec::RemoteShell;

use crate::certbot::{CertbotConfig, CertbotInstaller};
use crate::code_server::{CodeServerConfig, CodeServerInstaller};
use crate::error::InstallError;
use crate::nginx::NginxInstaller;
use crate::outcome::InstallOutcome;
use crate::static_site::{StaticSiteConfig, StaticSiteInstaller};
use crate::toolset::ToolsetInstaller;

/// One installable target with its configuration payload
#[derive(Debug, Clone)]
pub enum InstallTarget {
    /// Base tool bundle
    Toolset,
    /// Web server
    Nginx,
    /// Certificate for a domain
    Certbot(CertbotConfig),
    /// Editor server behind the web server
    CodeServer(CodeServerConfig),
    /// Static site from a local archive
    StaticSite(StaticSiteConfig),
}

impl InstallTarget {
    /// Target name as shown in progress output
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            InstallTarget::Toolset => "toolset",
            InstallTarget::Nginx => "nginx",
            InstallTarget::Certbot(_) => "certbot",
            InstallTarget::CodeServer(_) => "code-server",
            InstallTarget::StaticSite(_) => "static-site",
        }
    }
}

/// Single entry point: ensure one target is installed on the session's host
///
/// # Errors
/// Propagates the façade's `InstallError`
pub async fn ensure_installed(
    shell: &dyn RemoteShell,
    target: &InstallTarget,
    use_sudo: bool,
) -> Result<InstallOutcome, InstallError> {
    match target {
        InstallTarget::Toolset => ToolsetInstaller::new(use_sudo).ensure_installed(shell).await,
        InstallTarget::Nginx => NginxInstaller::new(use_sudo).ensure_installed(shell).await,
        InstallTarget::Certbot(config) => {
            CertbotInstaller::new(config.clone(), use_sudo)
                .ensure_installed(shell)
                .await
        }
        InstallTarget::CodeServer(config) => {
            CodeServerInstaller::new(config.clone(), use_sudo)
                .ensure_installed(shell)
                .await
        }
        InstallTarget::StaticSite(config) => {
            StaticSiteInstaller::new(config.clone(), use_sudo)
                .ensure_installed(shell)
                .await
        }
    }
}
