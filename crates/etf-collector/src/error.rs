//! 에러 타입 정의.

use std::fmt;

use etf_core::EtfError;
use etf_data::DataError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 저장소/크롤링 에러
    Data(DataError),
    /// 등록되지 않은 운용사 또는 데이터셋
    NotFound(String),
    /// 출력 직렬화 에러
    Output(serde_json::Error),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Data(e) => write!(f, "Data error: {}", e),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::Output(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Data(e) => Some(e),
            Self::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EtfError> for CollectorError {
    fn from(err: EtfError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(what) => Self::NotFound(what),
            other => Self::Data(other),
        }
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
