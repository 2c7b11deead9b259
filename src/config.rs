use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::services::detector::DetectorConfig;
use crate::services::remediation::RestartPolicy;
use crate::services::remediation::docker::DockerClientConfig;

/// 默认配置文件路径，可通过 `MONITOR_CONFIG` 覆盖
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "MONITOR_";

/// 所有时间类配置的上限（一天）
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to parse environment overrides: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub detector: DetectorSection,
    pub remediation: RemediationSection,
    pub docker: DockerSection,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    pub failure_threshold_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            failure_threshold_secs: 15,
            sweep_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationBackend {
    Docker,
    LogOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationSection {
    pub backend: RemediationBackend,
    pub restart_timeout_secs: u64,
    pub verify_wait_secs: u64,
    pub verify_poll_interval_ms: u64,
}

impl Default for RemediationSection {
    fn default() -> Self {
        Self {
            backend: RemediationBackend::Docker,
            restart_timeout_secs: 10,
            verify_wait_secs: 2,
            verify_poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerSection {
    pub host: String,
    pub request_timeout_secs: u64,
}

impl Default for DockerSection {
    fn default() -> Self {
        Self {
            host: "unix:///var/run/docker.sock".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub tokens: Vec<String>,
}

/// 环境变量覆盖项（`MONITOR_` 前缀）
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    server_host: Option<String>,
    server_port: Option<u16>,
    failure_threshold_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
    remediation_backend: Option<RemediationBackend>,
    restart_timeout_secs: Option<u64>,
    verify_wait_secs: Option<u64>,
    verify_poll_interval_ms: Option<u64>,
    docker_host: Option<String>,
    docker_request_timeout_secs: Option<u64>,
}

impl Config {
    /// 加载配置：默认值 -> 配置文件 -> 环境变量（调用方负责先加载 .env）
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MONITOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// 从 toml 文件读取配置，文件不存在时使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    /// 应用 `MONITOR_` 前缀的环境变量覆盖
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_iter(vars)?;

        if let Some(host) = overrides.server_host {
            self.server.host = host;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(secs) = overrides.failure_threshold_secs {
            self.detector.failure_threshold_secs = secs;
        }
        if let Some(secs) = overrides.sweep_interval_secs {
            self.detector.sweep_interval_secs = secs;
        }
        if let Some(backend) = overrides.remediation_backend {
            self.remediation.backend = backend;
        }
        if let Some(secs) = overrides.restart_timeout_secs {
            self.remediation.restart_timeout_secs = secs;
        }
        if let Some(secs) = overrides.verify_wait_secs {
            self.remediation.verify_wait_secs = secs;
        }
        if let Some(ms) = overrides.verify_poll_interval_ms {
            self.remediation.verify_poll_interval_ms = ms;
        }
        if let Some(host) = overrides.docker_host {
            self.docker.host = host;
        }
        if let Some(secs) = overrides.docker_request_timeout_secs {
            self.docker.request_timeout_secs = secs;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let detector = &self.detector;
        if detector.failure_threshold_secs == 0 || detector.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "failure_threshold_secs and sweep_interval_secs must be greater than zero".into(),
            ));
        }
        // 扫描间隔必须小于阈值，否则故障检测会整周期地滞后
        if detector.sweep_interval_secs >= detector.failure_threshold_secs {
            return Err(ConfigError::Invalid(format!(
                "sweep_interval_secs ({}) must be smaller than failure_threshold_secs ({})",
                detector.sweep_interval_secs, detector.failure_threshold_secs
            )));
        }
        let bounded = [
            ("detector.failure_threshold_secs", detector.failure_threshold_secs),
            ("remediation.restart_timeout_secs", self.remediation.restart_timeout_secs),
            ("remediation.verify_wait_secs", self.remediation.verify_wait_secs),
            ("remediation.verify_poll_interval_ms", self.remediation.verify_poll_interval_ms / 1000),
            ("docker.request_timeout_secs", self.docker.request_timeout_secs),
        ];
        for (key, secs) in bounded {
            if secs > MAX_DURATION_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{key} must not exceed {MAX_DURATION_SECS} seconds"
                )));
            }
        }
        if self.remediation.verify_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "verify_poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.docker.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "docker.request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            failure_threshold: Duration::from_secs(self.detector.failure_threshold_secs),
            sweep_interval: Duration::from_secs(self.detector.sweep_interval_secs),
        }
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            stop_timeout: Duration::from_secs(self.remediation.restart_timeout_secs),
            verify_wait: Duration::from_secs(self.remediation.verify_wait_secs),
            verify_poll_interval: Duration::from_millis(self.remediation.verify_poll_interval_ms),
        }
    }

    pub fn docker_client_config(&self) -> DockerClientConfig {
        DockerClientConfig {
            host: self.docker.host.clone(),
            request_timeout: Duration::from_secs(self.docker.request_timeout_secs),
        }
    }

    /// 未配置任何 token 时关闭校验
    pub fn validate_token(&self, token: Option<&str>) -> bool {
        if self.security.tokens.is_empty() {
            return true;
        }
        token.is_some_and(|token| self.security.tokens.iter().any(|t| t == token))
    }
}
