use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::types::{RegistryCounts, ServiceRecord, ServiceStatus};

/// 心跳注册表（服务名 -> 服务记录）
///
/// 克隆得到的是同一张表的句柄。每个服务名的读-改-写都在 dashmap 分片锁内完成，
/// 同名与不同名的并发心跳都不会丢失更新。
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<DashMap<String, ServiceRecord>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次心跳（注册等价于第一次心跳），返回记录当前状态
    pub fn upsert_heartbeat(&self, name: &str, host: &str, port: u16, now: SystemTime) -> ServiceStatus {
        match self.services.entry(name.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(ServiceRecord::new(name, host, port, now));
                tracing::info!(
                    service_name = %name,
                    host = %host,
                    port = port,
                    "Registered service"
                );
                ServiceStatus::Healthy
            }
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                record.last_heartbeat_at = now;
                record.host = host.to_string();
                record.port = port;

                if record.status == ServiceStatus::Dead {
                    record.status = ServiceStatus::Healthy;
                    record.last_status_change_at = now;
                    tracing::info!(service_name = %name, "Service recovered, heartbeat received while DEAD");
                } else {
                    tracing::debug!(service_name = %name, "Heartbeat received");
                }

                record.status
            }
        }
    }

    /// 时间点快照，按服务名排序；返回后不再持有任何锁
    pub fn snapshot(&self) -> Vec<ServiceRecord> {
        let mut records: Vec<ServiceRecord> = self
            .services
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// HEALTHY -> DEAD；记录已是 DEAD 或不存在时返回 false
    pub fn mark_dead(&self, name: &str, now: SystemTime) -> bool {
        self.transition_to_dead(name, None, now)
    }

    /// 与 `mark_dead` 相同，但仅当心跳时间仍等于快照中观察到的值时才转换。
    /// 快照之后到达的心跳优先，失败边沿不会成立。
    pub fn mark_dead_if_stale(&self, name: &str, observed_heartbeat: SystemTime, now: SystemTime) -> bool {
        self.transition_to_dead(name, Some(observed_heartbeat), now)
    }

    fn transition_to_dead(&self, name: &str, observed_heartbeat: Option<SystemTime>, now: SystemTime) -> bool {
        let Some(mut record) = self.services.get_mut(name) else {
            return false;
        };

        if record.status != ServiceStatus::Healthy {
            return false;
        }

        if let Some(observed) = observed_heartbeat {
            if record.last_heartbeat_at != observed {
                tracing::debug!(
                    service_name = %name,
                    "Heartbeat arrived during sweep, skipping failure transition"
                );
                return false;
            }
        }

        record.status = ServiceStatus::Dead;
        record.last_status_change_at = now;
        true
    }

    pub fn get(&self, name: &str) -> Option<ServiceRecord> {
        self.services.get(name).map(|entry| entry.value().clone())
    }

    pub fn counts(&self) -> RegistryCounts {
        // 单次遍历统计，三个数值来自同一轮读取
        self.services
            .iter()
            .fold(RegistryCounts::default(), |mut counts, entry| {
                counts.total += 1;
                match entry.value().status {
                    ServiceStatus::Healthy => counts.healthy += 1,
                    ServiceStatus::Dead => counts.dead += 1,
                }
                counts
            })
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
