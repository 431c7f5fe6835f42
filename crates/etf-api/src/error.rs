//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 데이터/도메인 에러는 `From` 변환으로 상태 코드와 함께 매핑됩니다.

use axum::{http::StatusCode, Json};
use etf_core::EtfError;
use etf_data::DataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Provider 'vanguard' not found or has no data"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_INPUT", "NOT_FOUND", "DATA_CORRUPTION")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보를 포함한 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 타임스탬프 없는 간단한 에러 생성.
    pub fn simple(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: None,
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 상태 코드와 에러 응답 쌍 생성.
pub fn api_error(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}

impl From<DataError> for ApiErrorResponse {
    fn from(err: DataError) -> Self {
        let code = match &err {
            DataError::NotFound(_) => "NOT_FOUND",
            DataError::InvalidKey(_) => "INVALID_INPUT",
            DataError::DataCorruption { .. } => "DATA_CORRUPTION",
            DataError::RecordTooLarge { .. } => "RECORD_TOO_LARGE",
            DataError::FetchError(_) | DataError::Http(_) => "FETCH_ERROR",
            DataError::ParseError(_) => "PARSE_ERROR",
            DataError::Io { .. } | DataError::SerializationError(_) => "STORAGE_ERROR",
        };
        Self::new(code, err.to_string())
    }
}

/// `DataError`를 HTTP 상태 코드와 함께 변환.
///
/// 5xx 에러는 로그에 남깁니다.
pub fn data_error(err: DataError) -> (StatusCode, Json<ApiErrorResponse>) {
    let status = match &err {
        DataError::NotFound(_) => StatusCode::NOT_FOUND,
        DataError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        DataError::FetchError(_) | DataError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "데이터 처리 실패");
    }
    (status, Json(ApiErrorResponse::from(err)))
}

/// `EtfError`를 HTTP 상태 코드와 함께 변환.
pub fn etf_error(err: EtfError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match &err {
        EtfError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        EtfError::MissingData(_) => (StatusCode::BAD_REQUEST, "MISSING_DATA"),
        EtfError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        EtfError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        EtfError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
    };
    if !err.is_client_error() {
        error!(error = %err, "요청 처리 실패");
    }
    (status, Json(ApiErrorResponse::new(code, err.to_string())))
}
