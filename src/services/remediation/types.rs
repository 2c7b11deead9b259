use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// 运行时中的工作负载句柄（Docker 中为容器）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeHandle {
    pub id: String,
    pub name: String,
}

impl RuntimeHandle {
    /// 日志中使用的短 ID
    pub fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }
}

/// 重启结果
///
/// `started` 表示重启命令被运行时接受，`verified_running` 表示校验期内观察到运行状态。
/// 两者都不会改变注册表中的服务状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartOutcome {
    pub started: bool,
    pub verified_running: bool,
    pub message: String,
}

impl RestartOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            started: false,
            verified_running: false,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.started && self.verified_running
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    Running,
    Exited,
    NotFound,
    Error,
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeStatus::Running => write!(f, "running"),
            RuntimeStatus::Exited => write!(f, "exited"),
            RuntimeStatus::NotFound => write!(f, "not_found"),
            RuntimeStatus::Error => write!(f, "error"),
        }
    }
}

/// 重启策略
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    /// 运行时在强制终止前等待的时间
    pub stop_timeout: Duration,
    /// 重启后等待进入运行状态的最长时间
    pub verify_wait: Duration,
    /// 校验轮询间隔
    pub verify_poll_interval: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(10),
            verify_wait: Duration::from_secs(2),
            verify_poll_interval: Duration::from_millis(250),
        }
    }
}
