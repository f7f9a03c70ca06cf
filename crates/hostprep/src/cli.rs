//! Command-line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostprep")]
#[command(about = "SSH provisioning for a single Debian host", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection flags shared by every subcommand
#[derive(Args)]
pub struct ConnectionArgs {
    /// Remote host address (hostname or IPv4)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// SSH username
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// SSH port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Private key file
    #[arg(long, global = true)]
    pub key: Option<PathBuf>,

    /// Environment variable holding the key passphrase
    #[arg(long, global = true)]
    pub passphrase_env: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the base tool bundle (git, curl, unzip, build tools, Node.js)
    Toolset,

    /// Install the web server and bring the service up
    Nginx,

    /// Issue a Let's Encrypt certificate for a domain
    Certbot {
        /// Domain to issue the certificate for
        #[arg(long)]
        domain: String,
        /// Registration email for the certificate authority
        #[arg(long)]
        email: String,
    },

    /// Install code-server behind the web server with TLS
    CodeServer {
        /// Domain the editor is served on (certificate must exist)
        #[arg(long)]
        domain: String,
        /// Environment variable holding the editor password
        #[arg(long, default_value = "HOSTPREP_EDITOR_PASSWORD")]
        password_env: String,
    },

    /// Deploy a static site from a local archive
    StaticSite {
        /// Site name (web root becomes /var/www/<site>)
        #[arg(long)]
        site: String,
        /// Domain the site is served on
        #[arg(long)]
        domain: String,
        /// Local site archive (.tar.gz, .tar or .zip)
        #[arg(long)]
        archive: PathBuf,
    },

    /// Run the full sequence: toolset, web server, certificate, editor
    Setup {
        /// Domain for the certificate and editor
        #[arg(long)]
        domain: String,
        /// Registration email for the certificate authority
        #[arg(long)]
        email: String,
        /// Environment variable holding the editor password
        #[arg(long, default_value = "HOSTPREP_EDITOR_PASSWORD")]
        password_env: String,
    },

    /// Report installed/running state without changing the host
    Probe,
}
