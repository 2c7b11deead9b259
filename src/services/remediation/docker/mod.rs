//! Docker Engine API 执行器
//!
//! - `config`: 客户端配置与端点解析
//! - `error`: 客户端错误类型
//! - `client`: 基于 hyper 的 Engine API 客户端
//! - `actuator`: `RemediationActuator` 的 Docker 实现

pub mod actuator;
pub mod client;
pub mod config;
pub mod error;

pub use actuator::{DockerActuator, match_container};
pub use client::{ContainerState, ContainerSummary, DockerClient};
pub use config::{DockerClientConfig, DockerEndpoint};
pub use error::DockerError;
