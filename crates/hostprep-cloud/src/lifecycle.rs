//! Instance lifecycle: launch with bounded wait, best-effort teardown

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::CloudError;
use crate::provider::{InstanceProvider, InstanceState, LaunchSpec, WaitPolicy};

/// Resources created for one instance
#[derive(Debug, Clone)]
pub struct ProvisionedInstance {
    /// Instance identifier
    pub instance_id: String,
    /// Public address reported once running
    pub public_addr: String,
    /// Key pair registered for the instance
    pub key_name: String,
    /// Security group the instance runs in
    pub security_group_id: String,
}

/// Tracks what has been created so far, for teardown on partial failure
#[derive(Debug, Default)]
struct CreatedResources {
    key_name: Option<String>,
    security_group_id: Option<String>,
    instance_id: Option<String>,
}

/// Drives the create → wait → (teardown) flow against an opaque provider
pub struct Lifecycle {
    provider: Arc<dyn InstanceProvider>,
    wait: WaitPolicy,
}

impl Lifecycle {
    /// Create a lifecycle driver
    pub fn new(provider: Arc<dyn InstanceProvider>, wait: WaitPolicy) -> Self {
        Self { provider, wait }
    }

    /// Launch an instance and wait until it is running with an address
    ///
    /// On any failure after a resource was created, the partially created
    /// resources are torn down best-effort (logged, never escalated) and
    /// the original error is returned.
    ///
    /// # Errors
    /// `CloudError::Provider` on a failed request,
    /// `CloudError::WaitTimeout` when the attempt ceiling is reached
    #[instrument(skip(self, spec), fields(name = %spec.name))]
    pub async fn launch(&self, spec: &LaunchSpec) -> Result<ProvisionedInstance, CloudError> {
        let mut created = CreatedResources::default();

        match self.launch_inner(spec, &mut created).await {
            Ok(instance) => Ok(instance),
            Err(e) => {
                warn!(error = %e, "launch failed, tearing down partial resources");
                self.teardown(&created).await;
                Err(e)
            }
        }
    }

    async fn launch_inner(
        &self,
        spec: &LaunchSpec,
        created: &mut CreatedResources,
    ) -> Result<ProvisionedInstance, CloudError> {
        let key_name = self
            .provider
            .import_key_pair(&spec.name, &spec.public_key)
            .await?;
        created.key_name = Some(key_name.clone());
        info!(key = %key_name, "key pair registered");

        let group_id = self.provider.create_security_group(&spec.name).await?;
        created.security_group_id = Some(group_id.clone());
        for port in &spec.ingress_ports {
            self.provider.authorize_ingress(&group_id, *port).await?;
        }
        info!(group = %group_id, ports = ?spec.ingress_ports, "security group ready");

        let instance_id = self
            .provider
            .run_instance(spec, &key_name, &group_id)
            .await?;
        created.instance_id = Some(instance_id.clone());
        info!(instance = %instance_id, "instance started, waiting for running state");

        let public_addr = self.wait_until_running(&instance_id).await?;
        info!(instance = %instance_id, addr = %public_addr, "instance running");

        Ok(ProvisionedInstance {
            instance_id,
            public_addr,
            key_name,
            security_group_id: group_id,
        })
    }

    /// Poll describe-instance until running with a public address
    async fn wait_until_running(&self, instance_id: &str) -> Result<String, CloudError> {
        for attempt in 1..=self.wait.max_attempts {
            let status = self.provider.describe_instance(instance_id).await?;

            if status.state == InstanceState::Running
                && let Some(addr) = status.public_addr
            {
                return Ok(addr);
            }

            info!(
                instance = %instance_id,
                state = ?status.state,
                attempt,
                ceiling = self.wait.max_attempts,
                "instance not ready"
            );

            if attempt < self.wait.max_attempts {
                tokio::time::sleep(self.wait.interval).await;
            }
        }

        Err(CloudError::WaitTimeout {
            id: instance_id.to_string(),
            awaited: "running",
            attempts: self.wait.max_attempts,
        })
    }

    /// Terminate an instance and release its resources
    ///
    /// Waits for the instance to reach the terminated state before deleting
    /// the group and key, bounded by the same attempt ceiling.
    ///
    /// # Errors
    /// `CloudError::Provider` on a failed request,
    /// `CloudError::WaitTimeout` when termination is never reported
    #[instrument(skip(self, instance), fields(instance = %instance.instance_id))]
    pub async fn terminate(&self, instance: &ProvisionedInstance) -> Result<(), CloudError> {
        self.provider
            .terminate_instance(&instance.instance_id)
            .await?;

        for attempt in 1..=self.wait.max_attempts {
            let status = self
                .provider
                .describe_instance(&instance.instance_id)
                .await?;
            if status.state == InstanceState::Terminated {
                break;
            }
            if attempt == self.wait.max_attempts {
                return Err(CloudError::WaitTimeout {
                    id: instance.instance_id.clone(),
                    awaited: "terminated",
                    attempts: self.wait.max_attempts,
                });
            }
            tokio::time::sleep(self.wait.interval).await;
        }

        self.provider
            .delete_security_group(&instance.security_group_id)
            .await?;
        self.provider.delete_key_pair(&instance.key_name).await?;

        info!("instance terminated and resources released");
        Ok(())
    }

    /// Best-effort teardown in reverse creation order
    ///
    /// Secondary failures are logged, never escalated.
    async fn teardown(&self, created: &CreatedResources) {
        if let Some(instance_id) = &created.instance_id
            && let Err(e) = self.provider.terminate_instance(instance_id).await
        {
            warn!(instance = %instance_id, error = %e, "teardown: terminate failed");
        }
        if let Some(group_id) = &created.security_group_id
            && let Err(e) = self.provider.delete_security_group(group_id).await
        {
            warn!(group = %group_id, error = %e, "teardown: group delete failed");
        }
        if let Some(key_name) = &created.key_name
            && let Err(e) = self.provider.delete_key_pair(key_name).await
        {
            warn!(key = %key_name, error = %e, "teardown: key delete failed");
        }
    }
}
