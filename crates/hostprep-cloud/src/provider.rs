//! Opaque instance provider API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CloudError;

/// Lifecycle state of a virtual machine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopped,
}

/// One describe-instance response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatus {
    /// Current state
    pub state: InstanceState,
    /// Public address, present once networking is attached
    pub public_addr: Option<String>,
}

/// Bounded polling policy for state waits
///
/// The wait loop abandons with an error after `max_attempts` polls rather
/// than waiting indefinitely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Fixed attempt ceiling
    pub max_attempts: u32,
    /// Delay between polls
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            interval: Duration::from_secs(3),
        }
    }
}

/// What to launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Name used for the key pair and security group
    pub name: String,
    /// Machine image identifier
    pub image_id: String,
    /// Instance size identifier
    pub instance_type: String,
    /// Public key material registered with the provider
    pub public_key: String,
    /// Ingress ports opened on the security group
    pub ingress_ports: Vec<u16>,
}

impl LaunchSpec {
    /// Spec with the ports a provisioned web host needs (SSH, HTTP, HTTPS)
    pub fn web_host(
        name: impl Into<String>,
        image_id: impl Into<String>,
        instance_type: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image_id: image_id.into(),
            instance_type: instance_type.into(),
            public_key: public_key.into(),
            ingress_ports: vec![22, 80, 443],
        }
    }
}

/// Create/describe/delete operations against the cloud provider
///
/// Consumed as an opaque request/response API; implementations wrap
/// whatever SDK or endpoint the deployment uses.
#[async_trait]
pub trait InstanceProvider: Send + Sync {
    /// Register a public key, returning the provider's key-pair name
    async fn import_key_pair(&self, name: &str, public_key: &str) -> Result<String, CloudError>;

    /// Create a security group, returning its identifier
    async fn create_security_group(&self, name: &str) -> Result<String, CloudError>;

    /// Open one ingress port on a security group
    async fn authorize_ingress(&self, group_id: &str, port: u16) -> Result<(), CloudError>;

    /// Start one instance, returning its identifier
    async fn run_instance(
        &self,
        spec: &LaunchSpec,
        key_name: &str,
        group_id: &str,
    ) -> Result<String, CloudError>;

    /// Describe one instance
    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceStatus, CloudError>;

    /// Terminate one instance
    async fn terminate_instance(&self, instance_id: &str) -> Result<(), CloudError>;

    /// Delete a security group
    async fn delete_security_group(&self, group_id: &str) -> Result<(), CloudError>;

    /// Delete a key pair
    async fn delete_key_pair(&self, name: &str) -> Result<(), CloudError>;
}
