//! Static-site deployer: stage an archive, extract it into the web root,
//! publish it through the web server

use std::path::PathBuf;

use tracing::{info, instrument};

use hostprep_engine::shell::{quote, validate_domain, validate_name};
use hostprep_engine::{Probe, ProbeStrategy, Sequencer, Step};
use hostprep_exec::RemoteShell;

use crate::error::InstallError;
use crate::facade::{FacadeState, Flow, maybe_sudo};
use crate::nginx::nginx_probe;
use crate::outcome::{InstallAction, InstallOutcome};

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveKind {
    /// Infer the kind from the archive filename
    #[must_use]
    pub fn from_path(path: &PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }

    /// The extraction tool this format needs on the remote host
    #[must_use]
    pub fn tool(self) -> &'static str {
        match self {
            ArchiveKind::TarGz | ArchiveKind::Tar => "tar",
            ArchiveKind::Zip => "unzip",
        }
    }

    fn staged_suffix(self) -> &'static str {
        match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::Tar => "tar",
            ArchiveKind::Zip => "zip",
        }
    }

    fn extract_command(self, staged: &str, web_root: &str) -> String {
        match self {
            ArchiveKind::TarGz => format!("tar -xzf {} -C {}", quote(staged), quote(web_root)),
            ArchiveKind::Tar => format!("tar -xf {} -C {}", quote(staged), quote(web_root)),
            ArchiveKind::Zip => format!("unzip -o {} -d {}", quote(staged), quote(web_root)),
        }
    }
}

/// Configuration for one site deployment
#[derive(Debug, Clone)]
pub struct StaticSiteConfig {
    /// Site name, becomes the web-root directory under /var/www
    pub site: String,
    /// Domain the site is served on
    pub domain: String,
    /// Local archive with the site content
    pub archive: PathBuf,
}

/// Deploys a static site from a local archive
pub struct StaticSiteInstaller {
    config: StaticSiteConfig,
    use_sudo: bool,
}

impl StaticSiteInstaller {
    /// Create the installer
    #[must_use]
    pub fn new(config: StaticSiteConfig, use_sudo: bool) -> Self {
        Self { config, use_sudo }
    }

    /// Ensure the site is deployed and published
    ///
    /// Preconditions: the web server is installed and the extraction tool
    /// matching the archive format is present. The archive is staged over
    /// the session's own channel, never fetched by the remote host.
    ///
    /// # Errors
    /// `InstallError::Precondition` for missing prerequisites or invalid
    /// names, `InstallError::LocalIo` when the archive cannot be read,
    /// `InstallError::StepFailed` / `InstallError::Verification` from the
    /// deploy sequence
    #[instrument(skip(self, shell), fields(site = %self.config.site))]
    pub async fn ensure_installed(
        &self,
        shell: &dyn RemoteShell,
    ) -> Result<InstallOutcome, InstallError> {
        let site = validate_name("site", &self.config.site)?;
        let domain = validate_domain(&self.config.domain)?;

        let kind = ArchiveKind::from_path(&self.config.archive).ok_or_else(|| {
            InstallError::Precondition(format!(
                "unsupported archive format: {}",
                self.config.archive.display()
            ))
        })?;

        let mut flow = Flow::new("static-site");

        let web_root = format!("/var/www/{site}");
        let index = format!("{web_root}/index.html");
        let deployed_probe = Probe::new("site", vec![ProbeStrategy::PathExists(index.clone())]);

        let before = deployed_probe.run(shell).await;
        flow.to(FacadeState::Probed {
            installed: before.installed,
        });

        if before.installed {
            flow.to(FacadeState::Skipped);
            return Ok(InstallOutcome::new("static-site", InstallAction::Skipped)
                .with_url(format!("http://{domain}/"))
                .with_detail(format!("site already deployed at {web_root}")));
        }

        let web = nginx_probe().run(shell).await;
        if !web.installed {
            return Err(InstallError::Precondition(
                "web server not installed; deploy needs it".to_string(),
            ));
        }

        let tool = Probe::new(
            kind.tool(),
            vec![ProbeStrategy::PathLookup(kind.tool().to_string())],
        )
        .run(shell)
        .await;
        if !tool.installed {
            return Err(InstallError::Precondition(format!(
                "extraction tool {} not present on the host",
                kind.tool()
            )));
        }

        let data = tokio::fs::read(&self.config.archive).await.map_err(|e| {
            InstallError::LocalIo(format!(
                "cannot read archive {}: {e}",
                self.config.archive.display()
            ))
        })?;

        flow.to(FacadeState::Sequencing);

        let staged = format!("/tmp/hostprep-{site}.{}", kind.staged_suffix());
        info!(archive = %self.config.archive.display(), staged = %staged, "staging archive");
        shell.upload(&data, &staged).await?;

        let site_conf = server_block(site, domain);
        let conf_write = format!(
            "printf '%s\\n' {} | {}",
            quote(&site_conf),
            maybe_sudo(
                self.use_sudo,
                &format!("tee /etc/nginx/sites-available/{site} >/dev/null")
            )
        );

        let steps = vec![
            Step::new(
                "create web root",
                maybe_sudo(self.use_sudo, &format!("mkdir -p {web_root}")),
            ),
            Step::new(
                "extract archive",
                maybe_sudo(self.use_sudo, &kind.extract_command(&staged, &web_root)),
            ),
            Step::new(
                "set ownership",
                maybe_sudo(
                    self.use_sudo,
                    &format!("chown -R www-data:www-data {web_root}"),
                ),
            ),
            Step::new("write site config", conf_write).quiet(),
            Step::new(
                "enable site",
                maybe_sudo(
                    self.use_sudo,
                    &format!("ln -sf ../sites-available/{site} /etc/nginx/sites-enabled/{site}"),
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
            Step::new("remove staged archive", format!("rm -f {}", quote(&staged))),
        ];

        Sequencer::new("static-site", steps).run(shell).await?;

        let after = deployed_probe.run(shell).await;
        if !after.installed {
            flow.to(FacadeState::Failed);
            return Err(InstallError::Verification(format!(
                "no index document at {index} after deploy"
            )));
        }

        flow.to(FacadeState::Verified);

        Ok(InstallOutcome::new("static-site", InstallAction::Installed)
            .with_url(format!("http://{domain}/"))
            .with_detail(format!("deployed to {web_root}")))
    }
}

/// Render the plain-HTTP server block for a deployed site
fn server_block(site: &str, domain: &str) -> String {
    format!(
        "server {{\n\
         \tlisten 80;\n\
         \tserver_name {domain};\n\
         \troot /var/www/{site};\n\
         \tindex index.html;\n\
         \tlocation / {{\n\
         \t\ttry_files $uri $uri/ =404;\n\
         \t}}\n\
         }}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_kind_from_path() {
        assert_eq!(
            ArchiveKind::from_path(&PathBuf::from("site.tar.gz")),
            Some(ArchiveKind::TarGz)
        );
        assert_eq!(
            ArchiveKind::from_path(&PathBuf::from("bundle.tgz")),
            Some(ArchiveKind::TarGz)
        );
        assert_eq!(
            ArchiveKind::from_path(&PathBuf::from("site.zip")),
            Some(ArchiveKind::Zip)
        );
        assert_eq!(ArchiveKind::from_path(&PathBuf::from("site.rar")), None);
    }

    #[test]
    fn test_extraction_tool_per_kind() {
        assert_eq!(ArchiveKind::TarGz.tool(), "tar");
        assert_eq!(ArchiveKind::Zip.tool(), "unzip");
    }

    #[test]
    fn test_server_block_names_site_and_domain() {
        let block = server_block("blog", "blog.example.com");
        assert!(block.contains("server_name blog.example.com;"));
        assert!(block.contains("root /var/www/blog;"));
    }
}
