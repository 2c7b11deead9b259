use std::time::{Duration, SystemTime};

use crate::services::remediation::RestartOutcome;

/// 故障检测配置
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// 距上次心跳达到该时长即判定为 DEAD（包含边界）
    pub failure_threshold: Duration,
    /// 扫描间隔，应小于 `failure_threshold`
    pub sweep_interval: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            failure_threshold: Duration::from_secs(15),
            sweep_interval: Duration::from_secs(10),
        }
    }
}

/// 一次失败边沿对应的修复记录
#[derive(Debug, Clone)]
pub struct RemediationRecord {
    pub service_name: String,
    pub elapsed_secs: u64,
    pub outcome: RestartOutcome,
}

/// 单次扫描结果
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub started_at: SystemTime,
    /// 本次检查的服务数量
    pub checked: usize,
    /// 本次扫描中由 HEALTHY 转为 DEAD 的服务
    pub newly_dead: Vec<String>,
    pub remediations: Vec<RemediationRecord>,
}

/// 检测器统计信息
#[derive(Debug, Clone, Default)]
pub struct DetectorStats {
    /// 已完成的扫描次数
    pub sweeps: u64,
    /// 因上一次扫描未结束而跳过的次数
    pub skipped_sweeps: u64,
    /// 检测到的失败边沿数量
    pub failures_detected: u64,
    /// 发起的修复次数
    pub remediations_attempted: u64,
    /// 未校验成功的修复次数
    pub remediations_failed: u64,
    pub last_sweep_at: Option<SystemTime>,
}
