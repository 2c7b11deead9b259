use std::time::Duration;

use http::StatusCode;

/// Docker 客户端错误类型
#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("Invalid docker endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP transport error: {0}")]
    Transport(#[from] hyper::Error),
    #[error("Invalid request: {0}")]
    Request(#[from] http::Error),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Container not found: {0}")]
    NotFound(String),
    #[error("Docker API returned {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}
