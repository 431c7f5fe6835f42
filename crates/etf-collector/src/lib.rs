//! Standalone ETF collector for ETF Atlas.
//!
//! 이 crate는 API 서버와 독립적으로 ETF 데이터를 수집하는 바이너리를 제공합니다:
//! - 운용사 크롤링 및 데이터셋 저장 (단일/전체, 강제 실행)
//! - 저장된 데이터셋 매니페스트 조회
//! - 데몬 모드 (일일 스케줄)

pub mod error;
pub mod modules;
pub mod stats;

pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
