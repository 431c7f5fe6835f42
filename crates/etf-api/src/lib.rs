//! ETF Atlas REST API 서버 라이브러리.
//!
//! 라우터, 공유 상태, 에러 응답, OpenAPI 문서를 제공합니다.
//! 바이너리(`main.rs`)는 이 모듈들을 조합해 서버를 시작합니다.

pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::{ApiErrorResponse, ApiResult};
pub use routes::create_api_router;
pub use state::AppState;
