//! # ETF Core
//!
//! ETF Atlas의 핵심 도메인 모델과 공통 인프라를 제공합니다:
//! - ETF 레코드 및 배당 주기 타입
//! - 배당금 시뮬레이션
//! - 설정 관리 (파일 + 환경 변수)
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
