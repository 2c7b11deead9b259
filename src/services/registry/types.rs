use std::fmt;
use std::time::SystemTime;

use serde::Serialize;

// 服务注册信息
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub last_heartbeat_at: SystemTime,
    pub status: ServiceStatus,
    pub last_status_change_at: SystemTime,
}

impl ServiceRecord {
    pub fn new(name: &str, host: &str, port: u16, now: SystemTime) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            port,
            last_heartbeat_at: now,
            status: ServiceStatus::Healthy,
            last_status_change_at: now,
        }
    }

    /// 距离上次心跳的整秒数，心跳时间晚于 `now` 时按 0 计算
    pub fn elapsed_secs(&self, now: SystemTime) -> u64 {
        now.duration_since(self.last_heartbeat_at)
            .unwrap_or_default()
            .as_secs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Healthy,
    Dead,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Healthy => write!(f, "HEALTHY"),
            ServiceStatus::Dead => write!(f, "DEAD"),
        }
    }
}

// 注册表统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub total: usize,
    pub healthy: usize,
    pub dead: usize,
}
