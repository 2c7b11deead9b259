//! Service registry module
//!
//! 心跳注册表，按服务名保存每个被监控服务的状态：
//! - `types`: 记录、状态与统计结构
//! - `service`: 并发安全的注册表实现

pub mod service;
pub mod types;

// Re-export public types for easier access
pub use service::ServiceRegistry;
pub use types::{RegistryCounts, ServiceRecord, ServiceStatus};
