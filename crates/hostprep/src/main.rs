//! hostprep CLI
//!
//! Provisions a single Debian host over SSH: base tools, web server,
//! certificates, editor server and static sites.

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod run;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = cli::Cli::parse();
    let defaults = config::Defaults::load_default()?;

    let all_ok = run::execute(cli, defaults).await?;
    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}
