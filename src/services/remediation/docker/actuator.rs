use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::client::{ContainerSummary, DockerClient};
use super::error::DockerError;
use crate::services::remediation::actuator::RemediationActuator;
use crate::services::remediation::types::{RestartOutcome, RestartPolicy, RuntimeHandle, RuntimeStatus};

// 截止时间溢出时使用的上限
const MAX_VERIFY_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// 按服务名匹配容器：容器名包含服务名即视为匹配，按列表顺序取第一个。
///
/// Docker Compose 生成的容器名形如 `project_service-a_1`，因此使用子串匹配。
/// 多个容器同时匹配时仍返回第一个，但会记录警告并列出全部候选。
pub fn match_container<'a>(containers: &'a [ContainerSummary], name: &str) -> Option<&'a ContainerSummary> {
    let candidates: Vec<&ContainerSummary> = containers
        .iter()
        .filter(|container| container.display_name().contains(name))
        .collect();

    if candidates.len() > 1 {
        let names: Vec<&str> = candidates.iter().map(|c| c.display_name()).collect();
        tracing::warn!(
            service_name = %name,
            candidates = ?names,
            chosen = %names[0],
            "Ambiguous container match, using the first candidate"
        );
    }

    candidates.first().copied()
}

/// 基于 Docker Engine API 的修复执行器
#[derive(Debug, Clone)]
pub struct DockerActuator {
    client: DockerClient,
    policy: RestartPolicy,
}

impl DockerActuator {
    pub fn new(client: DockerClient, policy: RestartPolicy) -> Self {
        Self { client, policy }
    }

    /// 启动时的连通性检查，列出并记录所有容器
    pub async fn check_connection(&self) -> Result<usize, DockerError> {
        let containers = self.client.list_containers().await?;
        tracing::info!(count = containers.len(), "Connected to docker daemon");
        for container in &containers {
            tracing::info!(name = %container.display_name(), state = %container.state, "Found container");
        }
        Ok(containers.len())
    }

    async fn find(&self, name: &str) -> Result<Option<RuntimeHandle>, DockerError> {
        let containers = self.client.list_containers().await?;
        Ok(match_container(&containers, name).map(|container| RuntimeHandle {
            id: container.id.clone(),
            name: container.display_name().to_string(),
        }))
    }

    /// 查找容器，失败时记录日志并返回 None
    async fn find_logged(&self, name: &str, action: &str) -> Option<RuntimeHandle> {
        match self.find(name).await {
            Ok(Some(handle)) => Some(handle),
            Ok(None) => {
                tracing::error!(service_name = %name, action = action, "Container not found for service");
                None
            }
            Err(e) => {
                tracing::error!(service_name = %name, action = action, error = %e, "Failed to list containers");
                None
            }
        }
    }

    /// 在截止时间前轮询容器状态，至少检查一次
    ///
    /// 单次 inspect 受剩余等待时间约束（不少于一个轮询间隔），慢速守护进程不会拖长截止时间。
    async fn wait_until_running(&self, handle: &RuntimeHandle) -> bool {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.policy.verify_wait)
            .unwrap_or_else(|| started + MAX_VERIFY_WAIT);
        loop {
            let budget = deadline
                .saturating_duration_since(Instant::now())
                .max(self.policy.verify_poll_interval);
            match tokio::time::timeout(budget, self.client.inspect_container(&handle.id)).await {
                Ok(Ok(state)) if state.running => return true,
                Ok(Ok(state)) => {
                    tracing::debug!(container = %handle.name, status = %state.status, "Container not running yet");
                }
                Ok(Err(e)) => {
                    tracing::debug!(container = %handle.name, error = %e, "Failed to inspect container");
                }
                Err(_) => {
                    tracing::debug!(container = %handle.name, budget_ms = budget.as_millis() as u64, "Inspect timed out");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(self.policy.verify_poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl RemediationActuator for DockerActuator {
    fn backend(&self) -> &'static str {
        "docker"
    }

    async fn locate(&self, name: &str) -> Option<RuntimeHandle> {
        self.find_logged(name, "locate").await
    }

    async fn restart(&self, name: &str) -> RestartOutcome {
        let handle = match self.find(name).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                tracing::error!(service_name = %name, "Cannot restart, container not found");
                return RestartOutcome::failed(format!("container not found for service {name}"));
            }
            Err(e) => {
                tracing::error!(service_name = %name, error = %e, "Cannot restart, container lookup failed");
                return RestartOutcome::failed(format!("container lookup failed: {e}"));
            }
        };

        tracing::info!(
            service_name = %name,
            container = %handle.name,
            container_id = %handle.short_id(),
            "Attempting to restart container"
        );

        if let Err(e) = self.client.restart_container(&handle.id, self.policy.stop_timeout).await {
            tracing::error!(service_name = %name, container = %handle.name, error = %e, "Restart failed");
            return RestartOutcome::failed(format!("restart failed: {e}"));
        }

        if self.wait_until_running(&handle).await {
            tracing::info!(service_name = %name, container = %handle.name, "Restarted container, now running");
            RestartOutcome {
                started: true,
                verified_running: true,
                message: format!("restarted container {}", handle.name),
            }
        } else {
            tracing::error!(
                service_name = %name,
                container = %handle.name,
                verify_wait_secs = self.policy.verify_wait.as_secs(),
                "Restart command accepted but container is not running"
            );
            RestartOutcome {
                started: true,
                verified_running: false,
                message: format!("container {} not running after restart", handle.name),
            }
        }
    }

    async fn start(&self, name: &str) -> bool {
        let Some(handle) = self.find_logged(name, "start").await else {
            return false;
        };

        tracing::info!(service_name = %name, container = %handle.name, "Starting container");
        match self.client.start_container(&handle.id).await {
            Ok(()) => {
                tracing::info!(service_name = %name, container = %handle.name, "Started container");
                true
            }
            Err(e) => {
                tracing::error!(service_name = %name, error = %e, "Failed to start container");
                false
            }
        }
    }

    async fn stop(&self, name: &str) -> bool {
        let Some(handle) = self.find_logged(name, "stop").await else {
            return false;
        };

        tracing::info!(service_name = %name, container = %handle.name, "Stopping container");
        match self.client.stop_container(&handle.id, self.policy.stop_timeout).await {
            Ok(()) => {
                tracing::info!(service_name = %name, container = %handle.name, "Stopped container");
                true
            }
            Err(e) => {
                tracing::error!(service_name = %name, error = %e, "Failed to stop container");
                false
            }
        }
    }

    async fn status(&self, name: &str) -> RuntimeStatus {
        let handle = match self.find(name).await {
            Ok(Some(handle)) => handle,
            Ok(None) => return RuntimeStatus::NotFound,
            Err(e) => {
                tracing::error!(service_name = %name, error = %e, "Error getting container status");
                return RuntimeStatus::Error;
            }
        };

        match self.client.inspect_container(&handle.id).await {
            Ok(state) if state.running => RuntimeStatus::Running,
            Ok(_) => RuntimeStatus::Exited,
            Err(DockerError::NotFound(_)) => RuntimeStatus::NotFound,
            Err(e) => {
                tracing::error!(service_name = %name, error = %e, "Error getting container status");
                RuntimeStatus::Error
            }
        }
    }
}
