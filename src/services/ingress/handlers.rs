use std::time::SystemTime;

use axum::Json;
use axum::extract::{Path, State};

use super::MonitorState;
use super::error::ApiError;
use super::types::{
    ActionResponse, DetectorView, HealthSummaryResponse, HeartbeatRequest, HeartbeatResponse,
    RegisterResponse, RestartResponse, RuntimeStatusResponse, ServiceListResponse, ServiceView,
    SweepResponse, epoch_secs,
};

// 服务名区分大小写且原样作为键，不做任何规范化
fn validate_name(name: &str) -> Result<&str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("serviceName must not be empty".into()));
    }
    if name.trim() != name {
        return Err(ApiError::BadRequest(
            "serviceName must not have leading or trailing whitespace".into(),
        ));
    }
    Ok(name)
}

// 注册服务，等价于第一次心跳
pub async fn register(
    State(state): State<MonitorState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let name = validate_name(&req.service_name)?;
    let status = state
        .registry
        .upsert_heartbeat(name, &req.host, req.port, SystemTime::now());

    Ok(Json(RegisterResponse {
        message: "Service registered successfully",
        service_name: name.to_string(),
        status,
    }))
}

// 接收心跳，未知服务自动注册
pub async fn heartbeat(
    State(state): State<MonitorState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let name = validate_name(&req.service_name)?;
    let now = SystemTime::now();
    let status = state.registry.upsert_heartbeat(name, &req.host, req.port, now);

    Ok(Json(HeartbeatResponse {
        message: "Heartbeat received",
        service_name: name.to_string(),
        status,
        timestamp: epoch_secs(now),
    }))
}

pub async fn list_services(State(state): State<MonitorState>) -> Json<ServiceListResponse> {
    let services: Vec<ServiceView> = state
        .registry
        .snapshot()
        .into_iter()
        .map(ServiceView::from)
        .collect();

    Json(ServiceListResponse {
        total_services: services.len(),
        services,
        timestamp: epoch_secs(SystemTime::now()),
    })
}

pub async fn get_service(
    State(state): State<MonitorState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceView>, ApiError> {
    validate_name(&name)?;
    state
        .registry
        .get(&name)
        .map(|record| Json(record.into()))
        .ok_or(ApiError::NotFound(name))
}

pub async fn health_summary(State(state): State<MonitorState>) -> Json<HealthSummaryResponse> {
    let counts = state.registry.counts();
    let detector = DetectorView::new(
        state.actuator.backend(),
        state.detector.config(),
        state.detector.stats(),
    );

    Json(HealthSummaryResponse {
        status: "Health Monitor is running!",
        total_services: counts.total,
        healthy_count: counts.healthy,
        dead_count: counts.dead,
        timestamp: epoch_secs(SystemTime::now()),
        detector,
    })
}

// 人工修复操作，不改变注册表中的服务状态
pub async fn restart_service(
    State(state): State<MonitorState>,
    Path(name): Path<String>,
) -> Result<Json<RestartResponse>, ApiError> {
    let name = validate_name(&name)?.to_string();
    tracing::info!(service_name = %name, "Manual restart requested");
    let outcome = state.actuator.restart(&name).await;

    Ok(Json(RestartResponse {
        service_name: name,
        outcome,
    }))
}

pub async fn start_service(
    State(state): State<MonitorState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    let name = validate_name(&name)?.to_string();
    tracing::info!(service_name = %name, "Manual start requested");
    let success = state.actuator.start(&name).await;

    Ok(Json(ActionResponse {
        service_name: name,
        action: "start",
        success,
    }))
}

pub async fn stop_service(
    State(state): State<MonitorState>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    let name = validate_name(&name)?.to_string();
    tracing::info!(service_name = %name, "Manual stop requested");
    let success = state.actuator.stop(&name).await;

    Ok(Json(ActionResponse {
        service_name: name,
        action: "stop",
        success,
    }))
}

pub async fn runtime_status(
    State(state): State<MonitorState>,
    Path(name): Path<String>,
) -> Result<Json<RuntimeStatusResponse>, ApiError> {
    let name = validate_name(&name)?.to_string();
    let runtime_status = state.actuator.status(&name).await;

    Ok(Json(RuntimeStatusResponse {
        service_name: name,
        runtime_status,
    }))
}

// 手动触发一次扫描，与定时扫描互斥
pub async fn trigger_sweep(State(state): State<MonitorState>) -> Result<Json<SweepResponse>, ApiError> {
    state
        .detector
        .sweep(SystemTime::now())
        .await
        .map(|report| Json(report.into()))
        .ok_or_else(|| ApiError::Conflict("a sweep is already running".into()))
}
