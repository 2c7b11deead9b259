use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode, header};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

use super::config::{DockerClientConfig, DockerEndpoint};
use super::error::DockerError;

/// 固定使用的 Engine API 版本前缀
pub const API_VERSION_PREFIX: &str = "/v1.41";

/// `GET /containers/json` 返回的容器摘要
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub state: String,
}

impl ContainerSummary {
    /// 容器名以 "/" 开头，这里去掉前缀
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|name| name.trim_start_matches('/'))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub running: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    #[serde(default)]
    state: ContainerState,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Docker Engine API 客户端，每个请求使用一条独立的 HTTP/1 连接
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: DockerEndpoint,
    request_timeout: Duration,
}

impl DockerClient {
    pub fn new(config: DockerClientConfig) -> Result<Self, DockerError> {
        let endpoint = config.host.parse()?;
        Ok(Self {
            endpoint,
            request_timeout: config.request_timeout,
        })
    }

    /// 列出所有容器（包括已停止的）
    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, DockerError> {
        let path = format!("{API_VERSION_PREFIX}/containers/json?all=true");
        let (status, body) = self.request(Method::GET, &path, self.request_timeout).await?;
        Self::ensure_success(status, &body, "containers")?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn inspect_container(&self, id: &str) -> Result<ContainerState, DockerError> {
        let path = format!("{API_VERSION_PREFIX}/containers/{id}/json");
        let (status, body) = self.request(Method::GET, &path, self.request_timeout).await?;
        Self::ensure_success(status, &body, id)?;
        let inspect: ContainerInspect = serde_json::from_slice(&body)?;
        Ok(inspect.state)
    }

    /// 重启容器；`stop_timeout` 是运行时强制终止前的等待时间
    pub async fn restart_container(&self, id: &str, stop_timeout: Duration) -> Result<(), DockerError> {
        let path = format!("{API_VERSION_PREFIX}/containers/{id}/restart?t={}", stop_timeout.as_secs());
        let (status, body) = self
            .request(Method::POST, &path, stop_timeout.saturating_add(self.request_timeout))
            .await?;
        Self::ensure_success(status, &body, id)
    }

    pub async fn start_container(&self, id: &str) -> Result<(), DockerError> {
        let path = format!("{API_VERSION_PREFIX}/containers/{id}/start");
        let (status, body) = self.request(Method::POST, &path, self.request_timeout).await?;
        // 304: 容器已在运行
        if status == StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        Self::ensure_success(status, &body, id)
    }

    pub async fn stop_container(&self, id: &str, stop_timeout: Duration) -> Result<(), DockerError> {
        let path = format!("{API_VERSION_PREFIX}/containers/{id}/stop?t={}", stop_timeout.as_secs());
        let (status, body) = self
            .request(Method::POST, &path, stop_timeout.saturating_add(self.request_timeout))
            .await?;
        // 304: 容器已停止
        if status == StatusCode::NOT_MODIFIED {
            return Ok(());
        }
        Self::ensure_success(status, &body, id)
    }

    fn ensure_success(status: StatusCode, body: &Bytes, target: &str) -> Result<(), DockerError> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(DockerError::NotFound(target.to_string()));
        }

        let message = serde_json::from_slice::<ApiErrorBody>(body)
            .map(|body| body.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
        Err(DockerError::Api { status, message })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        timeout: Duration,
    ) -> Result<(StatusCode, Bytes), DockerError> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, self.endpoint.host_header())
            .header(header::CONNECTION, "close")
            .body(Empty::<Bytes>::new())?;

        tokio::time::timeout(timeout, self.exchange(request))
            .await
            .map_err(|_| DockerError::Timeout(timeout))?
    }

    async fn exchange(&self, request: Request<Empty<Bytes>>) -> Result<(StatusCode, Bytes), DockerError> {
        match &self.endpoint {
            DockerEndpoint::Unix(socket) => Self::send(UnixStream::connect(socket).await?, request).await,
            DockerEndpoint::Tcp(addr) => Self::send(TcpStream::connect(addr.as_str()).await?, request).await,
        }
    }

    async fn send<S>(stream: S, request: Request<Empty<Bytes>>) -> Result<(StatusCode, Bytes), DockerError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Docker API connection closed with error");
            }
        });

        let result = async {
            let response = sender.send_request(request).await?;
            let status = response.status();
            let body = response.into_body().collect().await?.to_bytes();
            Ok::<_, DockerError>((status, body))
        }
        .await;

        drop(sender);
        connection.abort();
        result
    }
}
