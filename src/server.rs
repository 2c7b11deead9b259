use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{Config, RemediationBackend};
use crate::services::detector::FailureDetector;
use crate::services::ingress::{MonitorState, create_router};
use crate::services::registry::ServiceRegistry;
use crate::services::remediation::docker::{DockerActuator, DockerClient, DockerError};
use crate::services::remediation::{LogOnlyActuator, RemediationActuator};

/// 根据配置创建修复执行器
pub async fn build_actuator(config: &Config) -> Result<Arc<dyn RemediationActuator>, DockerError> {
    match config.remediation.backend {
        RemediationBackend::Docker => {
            let client = DockerClient::new(config.docker_client_config())?;
            let actuator = DockerActuator::new(client, config.restart_policy());

            // 连接失败不影响启动，修复时会再次尝试
            if let Err(e) = actuator.check_connection().await {
                tracing::error!(
                    host = %config.docker.host,
                    error = %e,
                    "Docker connection test failed, remediation will fail until the daemon is reachable"
                );
            }
            Ok(Arc::new(actuator))
        }
        RemediationBackend::LogOnly => {
            tracing::warn!("Remediation backend is log_only, failed services will not be restarted");
            Ok(Arc::new(LogOnlyActuator))
        }
    }
}

/// 组装注册表、检测器与执行器
pub fn build_state(config: Arc<Config>, actuator: Arc<dyn RemediationActuator>) -> MonitorState {
    let registry = ServiceRegistry::new();
    let detector = Arc::new(FailureDetector::new(
        registry.clone(),
        actuator.clone(),
        config.detector_config(),
    ));

    MonitorState {
        registry,
        detector,
        actuator,
        config,
    }
}

pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let actuator = build_actuator(&config).await?;
    let state = build_state(config.clone(), actuator);

    let shutdown = CancellationToken::new();
    let tracker = TaskTracker::new();

    // 启动故障检测任务
    tracker.spawn(state.detector.clone().run(shutdown.clone()));

    // 等待退出信号
    let signal_token = shutdown.clone();
    tracker.spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                }
                tracing::info!("Shutdown signal received");
                signal_token.cancel();
            }
            _ = signal_token.cancelled() => {}
        }
    });

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Health monitor listening");

    let app = create_router(state);
    let server_token = shutdown.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await;

    shutdown.cancel();
    tracker.close();
    tracker.wait().await;
    tracing::info!("Health monitor stopped");

    result?;
    Ok(())
}
