//! hostprep-install: Per-target installer façades
//!
//! Each façade composes probe-first-then-sequence-if-needed logic for one
//! software target on a Debian host. Probing an already-satisfied target
//! short-circuits the mutating sequence entirely; sequences that do run are
//! verified by re-probe rather than trusting the last exit code.

pub mod certbot;
pub mod code_server;
pub mod error;
pub mod facade;
pub mod nginx;
pub mod outcome;
pub mod report;
pub mod static_site;
pub mod target;
pub mod toolset;

pub use certbot::{CertbotConfig, CertbotInstaller};
pub use code_server::{CodeServerConfig, CodeServerInstaller};
pub use error::InstallError;
pub use facade::FacadeState;
pub use nginx::NginxInstaller;
pub use outcome::{InstallAction, InstallOutcome};
pub use report::{TargetStatus, probe_all};
pub use static_site::{ArchiveKind, StaticSiteConfig, StaticSiteInstaller};
pub use target::{InstallTarget, ensure_installed};
pub use toolset::{Tool, ToolsetInstaller, base_tools};
