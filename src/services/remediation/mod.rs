//! Remediation module
//!
//! 故障修复执行器：
//! - `types`: 执行结果、运行时状态与重启策略
//! - `actuator`: `RemediationActuator` trait 与仅记录日志的实现
//! - `docker`: 基于 Docker Engine API 的实现

pub mod actuator;
pub mod docker;
pub mod types;

pub use actuator::{LogOnlyActuator, RemediationActuator};
pub use types::{RestartOutcome, RestartPolicy, RuntimeHandle, RuntimeStatus};
