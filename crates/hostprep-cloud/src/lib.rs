//! hostprep-cloud: Cloud instance lifecycle collaborator
//!
//! Creates the resources a provisioning run targets (key pair, security
//! group, instance) against an opaque provider API, waits for the instance
//! with a bounded polling loop, and tears partially created resources back
//! down on failure.

pub mod error;
pub mod lifecycle;
pub mod provider;

pub use error::CloudError;
pub use lifecycle::{Lifecycle, ProvisionedInstance};
pub use provider::{InstanceProvider, InstanceState, InstanceStatus, LaunchSpec, WaitPolicy};
