use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use hostprep_cloud::{
    CloudError, InstanceProvider, InstanceState, InstanceStatus, LaunchSpec, Lifecycle, WaitPolicy,
};

/// Fake provider: reports pending for a fixed number of polls, then running
struct FakeProvider {
    pending_polls: u32,
    fail_run_instance: bool,
    describe_calls: AtomicU32,
    terminated: std::sync::atomic::AtomicBool,
    events: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn new(pending_polls: u32) -> Self {
        Self {
            pending_polls,
            fail_run_instance: false,
            describe_calls: AtomicU32::new(0),
            terminated: std::sync::atomic::AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
        }
    }

    fn failing_run(mut self) -> Self {
        self.fail_run_instance = true;
        self
    }

    fn describe_count(&self) -> u32 {
        self.describe_calls.load(Ordering::SeqCst)
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

#[async_trait]
impl InstanceProvider for FakeProvider {
    async fn import_key_pair(&self, name: &str, _public_key: &str) -> Result<String, CloudError> {
        self.record(format!("import_key_pair {name}"));
        Ok(name.to_string())
    }

    async fn create_security_group(&self, name: &str) -> Result<String, CloudError> {
        self.record(format!("create_security_group {name}"));
        Ok("sg-0001".to_string())
    }

    async fn authorize_ingress(&self, group_id: &str, port: u16) -> Result<(), CloudError> {
        self.record(format!("authorize_ingress {group_id} {port}"));
        Ok(())
    }

    async fn run_instance(
        &self,
        _spec: &LaunchSpec,
        _key_name: &str,
        _group_id: &str,
    ) -> Result<String, CloudError> {
        if self.fail_run_instance {
            return Err(CloudError::Provider("capacity exhausted".to_string()));
        }
        self.record("run_instance".to_string());
        Ok("i-0001".to_string())
    }

    async fn describe_instance(&self, _instance_id: &str) -> Result<InstanceStatus, CloudError> {
        let call = self.describe_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.terminated.load(Ordering::SeqCst) {
            Ok(InstanceStatus {
                state: InstanceState::Terminated,
                public_addr: None,
            })
        } else if call <= self.pending_polls {
            Ok(InstanceStatus {
                state: InstanceState::Pending,
                public_addr: None,
            })
        } else {
            Ok(InstanceStatus {
                state: InstanceState::Running,
                public_addr: Some("203.0.113.10".to_string()),
            })
        }
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<(), CloudError> {
        self.terminated.store(true, Ordering::SeqCst);
        self.record(format!("terminate_instance {instance_id}"));
        Ok(())
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<(), CloudError> {
        self.record(format!("delete_security_group {group_id}"));
        Ok(())
    }

    async fn delete_key_pair(&self, name: &str) -> Result<(), CloudError> {
        self.record(format!("delete_key_pair {name}"));
        Ok(())
    }
}

fn fast_policy(max_attempts: u32) -> WaitPolicy {
    WaitPolicy {
        max_attempts,
        interval: Duration::ZERO,
    }
}

fn web_spec() -> LaunchSpec {
    LaunchSpec::web_host("demo", "debian-12", "small", "ssh-ed25519 AAAA")
}

#[tokio::test]
async fn test_launch_returns_address_after_pending_polls() {
    let provider = Arc::new(FakeProvider::new(3));
    let lifecycle = Lifecycle::new(provider.clone(), fast_policy(10));

    let instance = lifecycle.launch(&web_spec()).await.unwrap();

    assert_eq!(instance.public_addr, "203.0.113.10");
    assert_eq!(instance.instance_id, "i-0001");
    // 3 pending polls plus the one that observed running
    assert_eq!(provider.describe_count(), 4);
}

#[tokio::test]
async fn test_launch_times_out_at_attempt_ceiling() {
    // Never leaves pending
    let provider = Arc::new(FakeProvider::new(u32::MAX));
    let lifecycle = Lifecycle::new(provider.clone(), fast_policy(5));

    let err = lifecycle.launch(&web_spec()).await.unwrap_err();

    match err {
        CloudError::WaitTimeout { attempts, .. } => assert_eq!(attempts, 5),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(provider.describe_count(), 5);

    // Partially created resources were torn down best-effort
    let events = provider.events();
    assert!(events.iter().any(|e| e.starts_with("terminate_instance")));
    assert!(events.iter().any(|e| e.starts_with("delete_security_group")));
    assert!(events.iter().any(|e| e.starts_with("delete_key_pair")));
}

#[tokio::test]
async fn test_failed_run_tears_down_key_and_group_only() {
    let provider = Arc::new(FakeProvider::new(0).failing_run());
    let lifecycle = Lifecycle::new(provider.clone(), fast_policy(5));

    let err = lifecycle.launch(&web_spec()).await.unwrap_err();
    assert!(matches!(err, CloudError::Provider(_)));

    let events = provider.events();
    // No instance existed to terminate
    assert!(!events.iter().any(|e| e.starts_with("terminate_instance")));
    assert!(events.iter().any(|e| e.starts_with("delete_security_group")));
    assert!(events.iter().any(|e| e.starts_with("delete_key_pair")));
}

#[tokio::test]
async fn test_ingress_ports_opened_for_web_host() {
    let provider = Arc::new(FakeProvider::new(0));
    let lifecycle = Lifecycle::new(provider.clone(), fast_policy(5));

    lifecycle.launch(&web_spec()).await.unwrap();

    let events = provider.events();
    for port in [22, 80, 443] {
        assert!(events.contains(&format!("authorize_ingress sg-0001 {port}")));
    }
}

#[tokio::test]
async fn test_terminate_releases_resources() {
    let provider = Arc::new(FakeProvider::new(0));
    let lifecycle = Lifecycle::new(provider.clone(), fast_policy(5));

    let instance = lifecycle.launch(&web_spec()).await.unwrap();
    lifecycle.terminate(&instance).await.unwrap();

    let events = provider.events();
    assert!(events.contains(&"terminate_instance i-0001".to_string()));
    assert!(events.contains(&"delete_security_group sg-0001".to_string()));
    assert!(events.contains(&"delete_key_pair demo".to_string()));
}
