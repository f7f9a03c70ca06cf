//! hostprep-exec: Remote session and command transport
//!
//! Owns one authenticated shell channel to a single host and exposes
//! command execution and local-to-remote file transfer over it.

pub mod error;
pub mod keys;
pub mod local;
pub mod result;
pub mod ssh;
pub mod traits;

pub use error::ExecError;
pub use keys::{KeyError, KeySource, ResolvedKey};
pub use local::LocalShell;
pub use result::{CommandResult, ConnectionSpec};
pub use ssh::SshSession;
pub use traits::RemoteShell;
