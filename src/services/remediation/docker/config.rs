use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::DockerError;

/// Docker 客户端配置
#[derive(Debug, Clone)]
pub struct DockerClientConfig {
    /// 守护进程地址，`unix:///path` 或 `tcp://host:port`
    pub host: String,
    /// 单次 API 请求超时时间
    pub request_timeout: Duration,
}

impl Default for DockerClientConfig {
    fn default() -> Self {
        Self {
            host: "unix:///var/run/docker.sock".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl DockerEndpoint {
    /// HTTP/1 请求需要的 Host 头
    pub fn host_header(&self) -> &str {
        match self {
            DockerEndpoint::Unix(_) => "docker",
            DockerEndpoint::Tcp(addr) => addr,
        }
    }
}

impl FromStr for DockerEndpoint {
    type Err = DockerError;

    fn from_str(host: &str) -> Result<Self, Self::Err> {
        if let Some(path) = host.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(DockerError::InvalidEndpoint(host.to_string()));
            }
            return Ok(DockerEndpoint::Unix(PathBuf::from(path)));
        }

        let addr = host
            .strip_prefix("tcp://")
            .or_else(|| host.strip_prefix("http://"))
            .ok_or_else(|| DockerError::InvalidEndpoint(host.to_string()))?
            .trim_end_matches('/');

        if addr.is_empty() || !addr.contains(':') {
            return Err(DockerError::InvalidEndpoint(host.to_string()));
        }
        Ok(DockerEndpoint::Tcp(addr.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(
            "unix:///var/run/docker.sock".parse::<DockerEndpoint>().unwrap(),
            DockerEndpoint::Unix(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(
            "tcp://localhost:2375".parse::<DockerEndpoint>().unwrap(),
            DockerEndpoint::Tcp("localhost:2375".to_string())
        );
        assert_eq!(
            "http://127.0.0.1:2375/".parse::<DockerEndpoint>().unwrap(),
            DockerEndpoint::Tcp("127.0.0.1:2375".to_string())
        );
    }

    #[test]
    fn test_reject_invalid_endpoints() {
        for host in ["", "unix://", "tcp://", "tcp://localhost", "npipe:////./pipe/docker"] {
            assert!(
                matches!(host.parse::<DockerEndpoint>(), Err(DockerError::InvalidEndpoint(_))),
                "{host} should be rejected"
            );
        }
    }
}
