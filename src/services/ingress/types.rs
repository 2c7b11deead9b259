use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::services::detector::{DetectorConfig, DetectorStats, RemediationRecord, SweepReport};
use crate::services::registry::{ServiceRecord, ServiceStatus};
use crate::services::remediation::{RestartOutcome, RuntimeStatus};

/// 转换为 unix 秒
pub fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn default_host() -> String {
    "localhost".to_string()
}

/// 注册与心跳共用的请求体
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub service_name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub service_name: String,
    pub status: ServiceStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub message: &'static str,
    pub service_name: String,
    pub status: ServiceStatus,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    pub status: ServiceStatus,
    pub last_heartbeat: u64,
    pub last_status_change: u64,
}

impl From<ServiceRecord> for ServiceView {
    fn from(record: ServiceRecord) -> Self {
        Self {
            service_name: record.name,
            host: record.host,
            port: record.port,
            status: record.status,
            last_heartbeat: epoch_secs(record.last_heartbeat_at),
            last_status_change: epoch_secs(record.last_status_change_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListResponse {
    pub total_services: usize,
    pub services: Vec<ServiceView>,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorView {
    pub backend: &'static str,
    pub failure_threshold_secs: u64,
    pub sweep_interval_secs: u64,
    pub sweeps: u64,
    pub skipped_sweeps: u64,
    pub failures_detected: u64,
    pub remediations_attempted: u64,
    pub remediations_failed: u64,
    pub last_sweep: Option<u64>,
}

impl DetectorView {
    pub fn new(backend: &'static str, config: &DetectorConfig, stats: DetectorStats) -> Self {
        Self {
            backend,
            failure_threshold_secs: config.failure_threshold.as_secs(),
            sweep_interval_secs: config.sweep_interval.as_secs(),
            sweeps: stats.sweeps,
            skipped_sweeps: stats.skipped_sweeps,
            failures_detected: stats.failures_detected,
            remediations_attempted: stats.remediations_attempted,
            remediations_failed: stats.remediations_failed,
            last_sweep: stats.last_sweep_at.map(epoch_secs),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummaryResponse {
    pub status: &'static str,
    pub total_services: usize,
    pub healthy_count: usize,
    pub dead_count: usize,
    pub timestamp: u64,
    pub detector: DetectorView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartResponse {
    pub service_name: String,
    #[serde(flatten)]
    pub outcome: RestartOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub service_name: String,
    pub action: &'static str,
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatusResponse {
    pub service_name: String,
    pub runtime_status: RuntimeStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationView {
    pub service_name: String,
    pub elapsed_secs: u64,
    #[serde(flatten)]
    pub outcome: RestartOutcome,
}

impl From<RemediationRecord> for RemediationView {
    fn from(record: RemediationRecord) -> Self {
        Self {
            service_name: record.service_name,
            elapsed_secs: record.elapsed_secs,
            outcome: record.outcome,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub timestamp: u64,
    pub checked: usize,
    pub newly_dead: Vec<String>,
    pub remediations: Vec<RemediationView>,
}

impl From<SweepReport> for SweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            timestamp: epoch_secs(report.started_at),
            checked: report.checked,
            newly_dead: report.newly_dead,
            remediations: report.remediations.into_iter().map(Into::into).collect(),
        }
    }
}
