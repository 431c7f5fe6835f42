//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use etf_core::{
    DistributionFrequency, DividendSimulationRequest, DividendSimulationResult, Etf, StorageFormat,
};
use etf_data::{ProviderUpdate, SchedulerStatus, UpdateSummary};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    etf, health, ComponentHealth, ComponentStatus, HealthResponse, ProviderInfo,
    ProvidersResponse, RunNowResponse,
};

/// ETF Atlas API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ETF Atlas API",
        version = "0.1.0",
        description = r#"
# ETF Atlas REST API

운용사 웹사이트에서 수집한 ETF 메타데이터를 제공합니다.

## 주요 기능

- **조회**: 운용사별 또는 전체 ETF 목록
- **업데이트**: 운용사 크롤링 즉시 실행 (`force=true`로 24시간 제한 무시)
- **스케줄러**: 매일 18:00 (America/New_York) 자동 업데이트
- **배당금 시뮬레이션**: 투자 금액과 보유 기간으로 예상 배당금 계산
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "etf", description = "ETF - 목록 조회, 업데이트, 배당금 시뮬레이션")
    ),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,

            // ===== ETF =====
            Etf,
            DistributionFrequency,
            StorageFormat,
            ProviderInfo,
            ProvidersResponse,
            ProviderUpdate,
            UpdateSummary,
            SchedulerStatus,
            RunNowResponse,
            DividendSimulationRequest,
            DividendSimulationResult,
        )
    ),
    paths(
        health::health_check,
        health::health_ready,
        etf::get_etf_list,
        etf::get_all_etf_lists,
        etf::get_all_etfs_combined,
        etf::get_providers,
        etf::update_provider,
        etf::update_all,
        etf::get_scheduler_status,
        etf::run_scheduler_now,
        etf::simulate_dividend_handler,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// `/swagger-ui`에서 UI를, `/api-docs/openapi.json`에서 스펙을 제공합니다.
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
