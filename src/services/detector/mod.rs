//! Failure detector module
//!
//! 固定阈值的边沿触发故障检测：
//! - `types`: 配置、扫描报告与统计
//! - `sweep`: 周期扫描与修复调度

pub mod sweep;
pub mod types;

pub use sweep::FailureDetector;
pub use types::{DetectorConfig, DetectorStats, RemediationRecord, SweepReport};
