//! ETF 조회/업데이트 API.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/etf/list/{provider}` - 운용사 ETF 목록
//! - `GET /api/v1/etf/list` - 운용사별 ETF 목록
//! - `GET /api/v1/etf/all` - 전체 ETF 통합 목록
//! - `GET /api/v1/etf/providers` - 등록된 운용사와 데이터셋 요약
//! - `POST /api/v1/etf/update/{provider}` - 운용사 즉시 업데이트
//! - `POST /api/v1/etf/update` - 전체 운용사 업데이트
//! - `GET /api/v1/etf/scheduler/status` - 스케줄러 상태
//! - `POST /api/v1/etf/scheduler/run-now` - 스케줄러 즉시 실행
//! - `POST /api/v1/etf/simulate-dividend` - 배당금 시뮬레이션

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use etf_core::{simulate_dividend, DividendSimulationRequest, DividendSimulationResult, Etf, StorageFormat};
use etf_data::storage::key::validate_component;
use etf_data::{
    DataError, DatasetKey, ProviderUpdate, SchedulerStatus, UpdateSummary, ETF_LIST_DATASET,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::{api_error, data_error, etf_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 업데이트 쿼리 파라미터.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpdateQuery {
    /// 최근 크롤링 여부와 관계없이 실행
    #[serde(default)]
    pub force: bool,
}

/// 운용사 요약.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderInfo {
    /// 운용사 이름
    pub name: String,
    /// 저장된 데이터 존재 여부
    pub has_data: bool,
    /// 저장된 ETF 수
    pub etf_count: usize,
    /// 마지막 저장 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// 저장 형식
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<StorageFormat>,
    /// 청크 분할 여부
    pub chunked: bool,
    /// 청크 수 (단일 파일이면 0)
    pub chunk_count: usize,
}

/// 운용사 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
    pub total: usize,
}

/// 스케줄러 즉시 실행 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunNowResponse {
    pub message: String,
    /// 작업 상태 ("running")
    pub status: String,
    /// 이번 요청으로 새 작업이 시작되었는지 여부
    pub started: bool,
}

fn validated_provider(provider: &str) -> ApiResult<&str> {
    let provider = provider.trim();
    validate_component("provider", provider).map_err(data_error)?;
    Ok(provider)
}

// ==================== 조회 핸들러 ====================

/// 운용사 ETF 목록 조회.
///
/// GET /api/v1/etf/list/{provider}
#[utoipa::path(
    get,
    path = "/api/v1/etf/list/{provider}",
    params(
        ("provider" = String, Path, description = "운용사 이름 (예: ishares, roundhill)")
    ),
    responses(
        (status = 200, description = "ETF 목록", body = Vec<Etf>),
        (status = 400, description = "잘못된 운용사 이름", body = ApiErrorResponse),
        (status = 404, description = "데이터 없음", body = ApiErrorResponse),
        (status = 500, description = "데이터 손상 또는 저장소 오류", body = ApiErrorResponse)
    ),
    tag = "etf"
)]
pub async fn get_etf_list(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> ApiResult<Json<Vec<Etf>>> {
    let provider = validated_provider(&provider)?;

    let etfs = state.updater.etf_list(provider).await.map_err(data_error)?;
    if etfs.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Provider '{}' not found or has no data", provider),
        ));
    }

    debug!(provider, count = etfs.len(), "ETF 목록 조회");
    Ok(Json(etfs))
}

/// 운용사별 ETF 목록 조회.
///
/// GET /api/v1/etf/list
#[utoipa::path(
    get,
    path = "/api/v1/etf/list",
    responses(
        (status = 200, description = "운용사 → ETF 목록", body = BTreeMap<String, Vec<Etf>>),
        (status = 500, description = "저장소 오류", body = ApiErrorResponse)
    ),
    tag = "etf"
)]
pub async fn get_all_etf_lists(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BTreeMap<String, Vec<Etf>>>> {
    let all = state.updater.all_etfs().await.map_err(data_error)?;
    Ok(Json(all))
}

/// 전체 ETF 통합 조회.
///
/// GET /api/v1/etf/all
#[utoipa::path(
    get,
    path = "/api/v1/etf/all",
    responses(
        (status = 200, description = "모든 운용사의 ETF", body = Vec<Etf>),
        (status = 500, description = "저장소 오류", body = ApiErrorResponse)
    ),
    tag = "etf"
)]
pub async fn get_all_etfs_combined(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Etf>>> {
    let all = state.updater.all_etfs().await.map_err(data_error)?;
    Ok(Json(all.into_values().flatten().collect()))
}

/// 등록된 운용사와 저장된 데이터셋 요약.
///
/// GET /api/v1/etf/providers
#[utoipa::path(
    get,
    path = "/api/v1/etf/providers",
    responses(
        (status = 200, description = "운용사 목록", body = ProvidersResponse),
        (status = 500, description = "저장소 오류", body = ApiErrorResponse)
    ),
    tag = "etf"
)]
pub async fn get_providers(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProvidersResponse>> {
    let mut providers = Vec::new();

    for name in state.updater.provider_names() {
        let key = DatasetKey::new(&name, ETF_LIST_DATASET).map_err(data_error)?;
        let manifest = state.store().manifest(&key).await.map_err(data_error)?;

        providers.push(match manifest {
            Some(m) => ProviderInfo {
                name,
                has_data: true,
                etf_count: m.total_count,
                updated_at: Some(m.updated_at),
                format: Some(m.format),
                chunked: m.chunked,
                chunk_count: m.chunk_count,
            },
            None => ProviderInfo {
                name,
                has_data: false,
                etf_count: 0,
                updated_at: None,
                format: None,
                chunked: false,
                chunk_count: 0,
            },
        });
    }

    let total = providers.len();
    Ok(Json(ProvidersResponse { providers, total }))
}

// ==================== 업데이트 핸들러 ====================

/// 운용사 데이터 즉시 업데이트.
///
/// POST /api/v1/etf/update/{provider}?force=true
#[utoipa::path(
    post,
    path = "/api/v1/etf/update/{provider}",
    params(
        ("provider" = String, Path, description = "업데이트할 운용사 이름"),
        UpdateQuery
    ),
    responses(
        (status = 200, description = "업데이트 결과 (실패 포함)", body = ProviderUpdate),
        (status = 400, description = "잘못된 운용사 이름", body = ApiErrorResponse),
        (status = 404, description = "등록되지 않은 운용사", body = ApiErrorResponse)
    ),
    tag = "etf"
)]
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<UpdateQuery>,
) -> ApiResult<Json<ProviderUpdate>> {
    let provider = validated_provider(&provider)?;
    info!(provider, force = query.force, "운용사 업데이트 요청");

    match state.updater.update_by_name(provider, query.force).await {
        Ok(result) => Ok(Json(result)),
        Err(DataError::NotFound(_)) => Err(api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Provider '{}' not found", provider),
        )),
        Err(e) => Err(data_error(e)),
    }
}

/// 전체 운용사 업데이트.
///
/// POST /api/v1/etf/update?force=true
#[utoipa::path(
    post,
    path = "/api/v1/etf/update",
    params(UpdateQuery),
    responses((status = 200, description = "업데이트 요약", body = UpdateSummary)),
    tag = "etf"
)]
pub async fn update_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UpdateQuery>,
) -> Json<UpdateSummary> {
    info!(force = query.force, "전체 업데이트 요청");
    Json(state.updater.update_all(query.force).await)
}

// ==================== 스케줄러 핸들러 ====================

/// 스케줄러 상태 조회.
///
/// GET /api/v1/etf/scheduler/status
#[utoipa::path(
    get,
    path = "/api/v1/etf/scheduler/status",
    responses((status = 200, description = "스케줄러 상태", body = SchedulerStatus)),
    tag = "etf"
)]
pub async fn get_scheduler_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status().await)
}

/// 예약된 업데이트 작업 즉시 실행.
///
/// POST /api/v1/etf/scheduler/run-now
#[utoipa::path(
    post,
    path = "/api/v1/etf/scheduler/run-now",
    responses((status = 200, description = "작업 시작 (또는 이미 진행 중)", body = RunNowResponse)),
    tag = "etf"
)]
pub async fn run_scheduler_now(State(state): State<Arc<AppState>>) -> Json<RunNowResponse> {
    let started = state.scheduler.run_now();
    if !started {
        warn!("업데이트 작업이 이미 진행 중");
    }

    Json(RunNowResponse {
        message: if started {
            "Update job started".to_string()
        } else {
            "Update job already running".to_string()
        },
        status: "running".to_string(),
        started,
    })
}

// ==================== 배당금 시뮬레이션 ====================

/// 배당금 시뮬레이션.
///
/// POST /api/v1/etf/simulate-dividend
#[utoipa::path(
    post,
    path = "/api/v1/etf/simulate-dividend",
    request_body = DividendSimulationRequest,
    responses(
        (status = 200, description = "시뮬레이션 결과", body = DividendSimulationResult),
        (status = 400, description = "잘못된 입력 또는 배당 정보 없음", body = ApiErrorResponse),
        (status = 404, description = "ETF 없음", body = ApiErrorResponse)
    ),
    tag = "etf"
)]
pub async fn simulate_dividend_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DividendSimulationRequest>,
) -> ApiResult<Json<DividendSimulationResult>> {
    let etf = state
        .updater
        .find_etf(&request.ticker)
        .await
        .map_err(data_error)?
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("ETF '{}' not found", request.ticker),
            )
        })?;

    let result = simulate_dividend(&etf, &request).map_err(etf_error)?;
    Ok(Json(result))
}

/// ETF 라우터 생성.
pub fn etf_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(get_all_etf_lists))
        .route("/list/{provider}", get(get_etf_list))
        .route("/all", get(get_all_etfs_combined))
        .route("/providers", get(get_providers))
        .route("/update", post(update_all))
        .route("/update/{provider}", post(update_provider))
        .route("/scheduler/status", get(get_scheduler_status))
        .route("/scheduler/run-now", post(run_scheduler_now))
        .route("/simulate-dividend", post(simulate_dividend_handler))
}
