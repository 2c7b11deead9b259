use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::types::{DetectorConfig, DetectorStats, RemediationRecord, SweepReport};
use crate::services::registry::{ServiceRegistry, ServiceStatus};
use crate::services::remediation::RemediationActuator;

/// 边沿触发的故障检测器
///
/// 每次扫描只在 HEALTHY -> DEAD 的转换上调用一次 `restart`。
/// 修复结果不会改变服务状态，服务只有在重新发送心跳后才会恢复为 HEALTHY；
/// 修复失败也不会自动重试。
#[derive(Debug)]
pub struct FailureDetector {
    registry: ServiceRegistry,
    actuator: Arc<dyn RemediationActuator>,
    config: DetectorConfig,
    // 保证同一时间只有一次扫描
    in_flight: tokio::sync::Mutex<()>,
    stats: Mutex<DetectorStats>,
}

impl FailureDetector {
    pub fn new(registry: ServiceRegistry, actuator: Arc<dyn RemediationActuator>, config: DetectorConfig) -> Self {
        Self {
            registry,
            actuator,
            config,
            in_flight: tokio::sync::Mutex::new(()),
            stats: Mutex::new(DetectorStats::default()),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update_stats(&self, update: impl FnOnce(&mut DetectorStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut stats);
    }

    /// 执行一次扫描；已有扫描在进行时直接跳过并返回 None
    pub async fn sweep(&self, now: SystemTime) -> Option<SweepReport> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::warn!("Previous sweep still running, skipping this one");
            self.update_stats(|stats| stats.skipped_sweeps += 1);
            return None;
        };

        let threshold_secs = self.config.failure_threshold.as_secs();
        let snapshot = self.registry.snapshot();
        let mut failures = Vec::new();

        // 所有存活判定基于同一个 now，且在任何修复开始之前完成
        for record in &snapshot {
            if record.status != ServiceStatus::Healthy {
                continue;
            }

            let elapsed_secs = record.elapsed_secs(now);
            if elapsed_secs < threshold_secs {
                tracing::debug!(
                    service_name = %record.name,
                    last_heartbeat_secs = elapsed_secs,
                    "Service is healthy"
                );
                continue;
            }

            if self
                .registry
                .mark_dead_if_stale(&record.name, record.last_heartbeat_at, now)
            {
                tracing::warn!(
                    service_name = %record.name,
                    elapsed_secs = elapsed_secs,
                    threshold_secs = threshold_secs,
                    "Service marked DEAD due to heartbeat timeout"
                );
                failures.push((record.name.clone(), elapsed_secs));
            }
        }

        // 不同服务的修复并发执行，互不阻塞
        let remediations = join_all(
            failures
                .iter()
                .map(|(name, elapsed_secs)| self.remediate(name, *elapsed_secs)),
        )
        .await;

        let failed = remediations
            .iter()
            .filter(|record| !record.outcome.is_success())
            .count() as u64;
        self.update_stats(|stats| {
            stats.sweeps += 1;
            stats.failures_detected += failures.len() as u64;
            stats.remediations_attempted += remediations.len() as u64;
            stats.remediations_failed += failed;
            stats.last_sweep_at = Some(now);
        });

        if failures.is_empty() {
            tracing::debug!(checked = snapshot.len(), "Sweep completed, no failures");
        } else {
            tracing::info!(
                checked = snapshot.len(),
                newly_dead = failures.len(),
                remediation_failures = failed,
                "Sweep completed"
            );
        }

        Some(SweepReport {
            started_at: now,
            checked: snapshot.len(),
            newly_dead: failures.into_iter().map(|(name, _)| name).collect(),
            remediations,
        })
    }

    async fn remediate(&self, name: &str, elapsed_secs: u64) -> RemediationRecord {
        tracing::info!(
            service_name = %name,
            backend = self.actuator.backend(),
            "Triggering remediation"
        );

        let outcome = self.actuator.restart(name).await;
        if outcome.is_success() {
            tracing::info!(service_name = %name, message = %outcome.message, "Remediation succeeded, waiting for heartbeat");
        } else {
            tracing::error!(
                service_name = %name,
                started = outcome.started,
                verified_running = outcome.verified_running,
                message = %outcome.message,
                "Remediation failed, service stays DEAD until it sends a heartbeat"
            );
        }

        RemediationRecord {
            service_name: name.to_string(),
            elapsed_secs,
            outcome,
        }
    }

    /// 周期扫描循环，`shutdown` 取消后退出
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            failure_threshold_secs = self.config.failure_threshold.as_secs(),
            "Failure detector started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Failure detector stopped");
                    break;
                }
                _ = interval.tick() => {
                    tracing::debug!("Executing failure detection sweep...");
                    self.sweep(SystemTime::now()).await;
                }
            }
        }
    }
}
