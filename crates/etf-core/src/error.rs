//! ETF Atlas 핵심 에러 타입.
//!
//! 도메인 계산, 설정 로드 등 크레이트 전반에서 사용하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum EtfError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 계산에 필요한 데이터 없음
    #[error("데이터 없음: {0}")]
    MissingData(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type EtfResult<T> = Result<T, EtfError>;

impl EtfError {
    /// 클라이언트 입력 문제로 발생한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EtfError::InvalidInput(_) | EtfError::MissingData(_) | EtfError::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for EtfError {
    fn from(err: serde_json::Error) -> Self {
        EtfError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for EtfError {
    fn from(err: config::ConfigError) -> Self {
        EtfError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_client_classification() {
        assert!(EtfError::InvalidInput("x".to_string()).is_client_error());
        assert!(EtfError::NotFound("x".to_string()).is_client_error());
        assert!(!EtfError::Config("x".to_string()).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = EtfError::MissingData("ETF 'SCHD'".to_string());
        assert_eq!(err.to_string(), "데이터 없음: ETF 'SCHD'");
    }
}
