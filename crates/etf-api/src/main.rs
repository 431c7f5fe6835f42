//! ETF Atlas API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! ETF 조회/업데이트 엔드포인트와 일일 자동 업데이트 스케줄러를 함께 실행합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use etf_core::{init_logging, AppConfig, ServerConfig};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use etf_api::openapi::swagger_ui_router;
use etf_api::routes::create_api_router;
use etf_api::state::AppState;

/// CORS 레이어 생성.
///
/// `server.cors_origins`(환경변수 `ETF__SERVER__CORS_ORIGINS` 또는 `CORS_ORIGINS`)가
/// 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let configured = config
        .cors_origins
        .clone()
        .or_else(|| std::env::var("CORS_ORIGINS").ok())
        .filter(|origins| !origins.trim().is_empty());

    let allow_origin = match &configured {
        Some(origins) => {
            // 프로덕션: 특정 origin만 허용
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        None => {
            // 개발: 모든 origin 허용
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        // preflight 요청 캐시 시간
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        // 전체 업데이트는 오래 걸리므로 타임아웃은 설정값 사용 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(cors_layer(config))
}

fn socket_addr(config: &ServerConfig) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| {
            format!(
                "소켓 주소 설정이 유효하지 않습니다: {}:{} (ETF__SERVER__HOST, ETF__SERVER__PORT 확인)",
                config.host, config.port
            )
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 설정 로드 (.env → 설정 파일 → 환경 변수)
    let config = AppConfig::from_env().context("설정 로드 실패")?;

    // tracing 초기화
    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting ETF Atlas API server...");

    let addr = socket_addr(&config.server)?;

    let state = Arc::new(AppState::from_config(&config).context("애플리케이션 상태 초기화 실패")?);
    info!(
        version = %state.version,
        providers = ?state.updater.provider_names(),
        "Application state initialized"
    );

    // 전역 종료 토큰 생성 (graceful shutdown용, 백그라운드 태스크에서 사용)
    let shutdown_token = CancellationToken::new();

    let scheduler_handle = if config.scheduler.enabled {
        state.scheduler.start(shutdown_token.clone())
    } else {
        warn!("자동 업데이트 스케줄러 비활성화 (scheduler.enabled = false)");
        None
    };

    // 라우터 생성
    let app = create_router(state, &config.server);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");

    // 종료 토큰 취소 (백그라운드 태스크에 종료 시그널 전파)
    shutdown_token.cancel();

    if let Some(handle) = scheduler_handle {
        match tokio::time::timeout(Duration::from_secs(10), handle).await {
            Ok(Ok(())) => info!("Scheduler stopped"),
            Ok(Err(e)) => error!(error = %e, "Scheduler task failed"),
            Err(_) => warn!("Scheduler shutdown timeout, forcing shutdown"),
        }
    }

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    // 모든 백그라운드 태스크에 종료 시그널 전파
    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
