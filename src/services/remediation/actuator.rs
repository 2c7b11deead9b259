use async_trait::async_trait;

use super::types::{RestartOutcome, RuntimeHandle, RuntimeStatus};

/// 故障修复执行器
///
/// 所有操作都不会向调用方返回错误：失败被转换为结果类型或 `false`，
/// 诊断信息写入日志。
#[async_trait]
pub trait RemediationActuator: Send + Sync + std::fmt::Debug {
    /// 后端名称，用于日志与健康摘要
    fn backend(&self) -> &'static str;

    /// 按服务名查找运行时句柄
    async fn locate(&self, name: &str) -> Option<RuntimeHandle>;

    /// 重启并校验运行状态，不做内部重试
    async fn restart(&self, name: &str) -> RestartOutcome;

    async fn start(&self, name: &str) -> bool;

    async fn stop(&self, name: &str) -> bool;

    async fn status(&self, name: &str) -> RuntimeStatus;
}

/// 只记录日志、不执行任何操作的执行器
#[derive(Debug, Clone, Default)]
pub struct LogOnlyActuator;

#[async_trait]
impl RemediationActuator for LogOnlyActuator {
    fn backend(&self) -> &'static str {
        "log_only"
    }

    async fn locate(&self, name: &str) -> Option<RuntimeHandle> {
        tracing::debug!(service_name = %name, "log_only backend cannot locate services");
        None
    }

    async fn restart(&self, name: &str) -> RestartOutcome {
        tracing::warn!(service_name = %name, "Remediation disabled, restart not performed");
        RestartOutcome::failed("remediation backend is log_only, restart not performed")
    }

    async fn start(&self, name: &str) -> bool {
        tracing::warn!(service_name = %name, "Remediation disabled, start not performed");
        false
    }

    async fn stop(&self, name: &str) -> bool {
        tracing::warn!(service_name = %name, "Remediation disabled, stop not performed");
        false
    }

    async fn status(&self, _name: &str) -> RuntimeStatus {
        RuntimeStatus::NotFound
    }
}
