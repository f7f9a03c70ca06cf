//! Run driver: one session, sequential targets, independent outcomes

use std::sync::Arc;

use eyre::{Result, bail};
use tracing::{info, warn};

use hostprep_exec::{ConnectionSpec, KeySource, RemoteShell, SshSession};
use hostprep_install::{
    CertbotConfig, CodeServerConfig, InstallTarget, StaticSiteConfig, ensure_installed, probe_all,
};

use crate::cli::{Cli, Commands, ConnectionArgs};
use crate::config::{ConnectionDefaults, Defaults};

/// Marker printed in front of a failed target
const FAIL_MARK: &str = "✗";
/// Marker printed in front of a completed target
const OK_MARK: &str = "✓";

/// Execute one invocation; returns whether every requested target succeeded
pub async fn execute(cli: Cli, defaults: Defaults) -> Result<bool> {
    let (spec, key_source) = resolve_connection(&cli.connection, &defaults.connection)?;

    let session = Arc::new(SshSession::open(spec, &key_source).await?);

    // The session must be closed on every exit path, so the actual work is
    // fenced off and its result inspected afterwards
    let result = drive(&cli.command, session.as_ref()).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "closing SSH session failed");
    }

    result
}

/// Build the connection descriptor from flags over defaults
fn resolve_connection(
    args: &ConnectionArgs,
    defaults: &ConnectionDefaults,
) -> Result<(ConnectionSpec, KeySource)> {
    let Some(host) = args.host.clone().or_else(|| defaults.host.clone()) else {
        bail!("no host given: pass --host or set connection.host in hostprep.toml");
    };

    let mut spec = ConnectionSpec::new(host);
    if let Some(user) = args.user.clone().or_else(|| defaults.user.clone()) {
        spec = spec.with_user(user);
    }
    if let Some(port) = args.port.or(defaults.port) {
        spec = spec.with_port(port);
    }

    let Some(key) = args.key.clone().or_else(|| defaults.key.clone()) else {
        bail!("no key file given: pass --key or set connection.key in hostprep.toml");
    };

    let passphrase = match &args.passphrase_env {
        Some(var) => match std::env::var(var) {
            Ok(value) => Some(value),
            Err(_) => bail!("passphrase variable {var} is not set"),
        },
        None => None,
    };

    Ok((spec, KeySource::Path { path: key, passphrase }))
}

async fn drive(command: &Commands, shell: &dyn RemoteShell) -> Result<bool> {
    if let Commands::Probe = command {
        report(shell).await;
        return Ok(true);
    }

    let use_sudo = detect_sudo(shell).await?;
    let targets = targets_for(command)?;

    let mut failures = 0usize;
    let mut lines = Vec::new();

    for target in &targets {
        println!("==> {}", target.name());

        match ensure_installed(shell, target, use_sudo).await {
            Ok(outcome) => {
                let mut parts = vec![outcome.action.to_string()];
                if let Some(version) = &outcome.version {
                    parts.push(version.clone());
                }
                if let Some(running) = outcome.running {
                    parts.push(if running { "running".into() } else { "stopped".into() });
                }
                if let Some(url) = &outcome.url {
                    parts.push(url.clone());
                }
                if let Some(detail) = &outcome.detail {
                    parts.push(detail.clone());
                }
                let line = format!("{OK_MARK} {}: {}", target.name(), parts.join(", "));
                println!("{line}");
                lines.push(line);
            }
            Err(e) => {
                failures += 1;
                let line = format!("{FAIL_MARK} {}: {e}", target.name());
                eprintln!("{line}");
                lines.push(line);
            }
        }
    }

    if targets.len() > 1 {
        println!("\nsummary:");
        for line in &lines {
            println!("  {line}");
        }
    }

    if failures > 0 {
        info!(failures, total = targets.len(), "run finished with failures");
    }
    Ok(failures == 0)
}

/// Sudo is needed whenever the session user is not root
async fn detect_sudo(shell: &dyn RemoteShell) -> Result<bool> {
    let whoami = shell.run("whoami").await?;
    Ok(whoami.stdout.trim() != "root")
}

/// Expand a subcommand into its target sequence
fn targets_for(command: &Commands) -> Result<Vec<InstallTarget>> {
    let targets = match command {
        Commands::Toolset => vec![InstallTarget::Toolset],
        Commands::Nginx => vec![InstallTarget::Nginx],
        Commands::Certbot { domain, email } => vec![InstallTarget::Certbot(CertbotConfig {
            domain: domain.clone(),
            email: email.clone(),
        })],
        Commands::CodeServer {
            domain,
            password_env,
        } => vec![InstallTarget::CodeServer(CodeServerConfig {
            domain: domain.clone(),
            password: editor_password(password_env)?,
        })],
        Commands::StaticSite {
            site,
            domain,
            archive,
        } => vec![InstallTarget::StaticSite(StaticSiteConfig {
            site: site.clone(),
            domain: domain.clone(),
            archive: archive.clone(),
        })],
        Commands::Setup {
            domain,
            email,
            password_env,
        } => vec![
            InstallTarget::Toolset,
            InstallTarget::Nginx,
            InstallTarget::Certbot(CertbotConfig {
                domain: domain.clone(),
                email: email.clone(),
            }),
            InstallTarget::CodeServer(CodeServerConfig {
                domain: domain.clone(),
                password: editor_password(password_env)?,
            }),
        ],
        Commands::Probe => vec![],
    };
    Ok(targets)
}

/// The editor password is taken from the environment at the operator
/// boundary, never from a flag where it would land in shell history
fn editor_password(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => bail!("editor password variable {var} is not set"),
    }
}

async fn report(shell: &dyn RemoteShell) {
    println!("{:<18} {:<10} {:<9} version", "target", "installed", "running");
    for status in probe_all(shell).await {
        let running = match status.running {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        println!(
            "{:<18} {:<10} {:<9} {}",
            status.name,
            if status.installed { "yes" } else { "no" },
            running,
            status.version.as_deref().unwrap_or("-")
        );
    }
}
