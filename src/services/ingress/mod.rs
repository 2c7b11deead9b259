//! HTTP ingress adapter
//!
//! 把心跳/注册请求转发到注册表，并对外提供服务列表、健康摘要与人工修复操作。

pub mod error;
pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};

use crate::config::Config;
use crate::services::detector::FailureDetector;
use crate::services::registry::ServiceRegistry;
use crate::services::remediation::RemediationActuator;

pub use error::ApiError;

/// API key 请求头
pub const API_KEY_HEADER: &str = "x-api-key";

/// 各个 handler 共享的状态
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub registry: ServiceRegistry,
    pub detector: Arc<FailureDetector>,
    pub actuator: Arc<dyn RemediationActuator>,
    pub config: Arc<Config>,
}

/// 创建 `/monitor` 下的全部路由
pub fn create_router(state: MonitorState) -> Router {
    let monitor = Router::new()
        .route("/register", post(handlers::register))
        .route("/heartbeat", post(handlers::heartbeat))
        .route("/services", get(handlers::list_services))
        .route("/services/{name}", get(handlers::get_service))
        .route("/services/{name}/restart", post(handlers::restart_service))
        .route("/services/{name}/start", post(handlers::start_service))
        .route("/services/{name}/stop", post(handlers::stop_service))
        .route("/services/{name}/runtime", get(handlers::runtime_status))
        .route("/health", get(handlers::health_summary))
        .route("/sweep", post(handlers::trigger_sweep))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);

    Router::new().nest("/monitor", monitor)
}

// 验证 API key，未配置 token 时放行
async fn require_api_key(
    State(state): State<MonitorState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if !state.config.validate_token(token) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
