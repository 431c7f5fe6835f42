//! 데이터 모듈 오류 타입.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 파일 입출력 오류
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 매니페스트와 실제 파일이 일치하지 않음
    #[error("Data corruption in dataset {dataset}: {reason}")]
    DataCorruption { dataset: String, reason: String },

    /// 데이터셋 없음
    #[error("Dataset not found: {0}")]
    NotFound(String),

    /// 단일 레코드가 파일 크기 제한을 초과
    #[error("Record {index} encodes to {size} bytes, exceeding the {limit} byte limit")]
    RecordTooLarge {
        index: usize,
        size: usize,
        limit: usize,
    },

    /// 경로로 쓸 수 없는 운용사/데이터셋 이름
    #[error("Invalid dataset key: {0}")]
    InvalidKey(String),

    /// 데이터 가져오기 오류 (외부 소스)
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// HTTP 요청 오류
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DataError {
    /// 경로 정보를 포함한 I/O 오류 생성.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// 데이터 손상 오류 생성.
    pub fn corruption(dataset: impl ToString, reason: impl Into<String>) -> Self {
        DataError::DataCorruption {
            dataset: dataset.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for DataError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for DataError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
