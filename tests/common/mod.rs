#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::{Barrier, Notify};

use selfheal_monitor::services::remediation::{
    RemediationActuator, RestartOutcome, RuntimeHandle, RuntimeStatus,
};

pub fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// 记录调用的测试执行器
#[derive(Debug)]
pub struct RecordingActuator {
    restarts: Mutex<Vec<String>>,
    actions: Mutex<Vec<(String, String)>>,
    outcome: RestartOutcome,
    // restart 被调用时通知，并等待放行
    entered: Option<Arc<Notify>>,
    release: Option<Arc<Notify>>,
    // 所有 restart 都到达后才返回
    barrier: Option<Arc<Barrier>>,
}

impl RecordingActuator {
    pub fn succeeding() -> Self {
        Self::with_outcome(RestartOutcome {
            started: true,
            verified_running: true,
            message: "restarted".to_string(),
        })
    }

    pub fn failing() -> Self {
        Self::with_outcome(RestartOutcome::failed("container not found"))
    }

    pub fn with_outcome(outcome: RestartOutcome) -> Self {
        Self {
            restarts: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
            outcome,
            entered: None,
            release: None,
            barrier: None,
        }
    }

    pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            entered: Some(entered),
            release: Some(release),
            ..Self::succeeding()
        }
    }

    pub fn with_barrier(barrier: Arc<Barrier>) -> Self {
        Self {
            barrier: Some(barrier),
            ..Self::succeeding()
        }
    }

    pub fn restarts(&self) -> Vec<String> {
        self.restarts.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<(String, String)> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, action: &str, name: &str) {
        self.actions
            .lock()
            .unwrap()
            .push((action.to_string(), name.to_string()));
    }
}

#[async_trait]
impl RemediationActuator for RecordingActuator {
    fn backend(&self) -> &'static str {
        "recording"
    }

    async fn locate(&self, name: &str) -> Option<RuntimeHandle> {
        Some(RuntimeHandle {
            id: format!("id-{name}"),
            name: format!("project_{name}_1"),
        })
    }

    async fn restart(&self, name: &str) -> RestartOutcome {
        self.restarts.lock().unwrap().push(name.to_string());
        if let Some(entered) = &self.entered {
            entered.notify_one();
        }
        if let Some(release) = &self.release {
            release.notified().await;
        }
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.outcome.clone()
    }

    async fn start(&self, name: &str) -> bool {
        self.record("start", name);
        true
    }

    async fn stop(&self, name: &str) -> bool {
        self.record("stop", name);
        true
    }

    async fn status(&self, name: &str) -> RuntimeStatus {
        self.record("status", name);
        RuntimeStatus::Running
    }
}
