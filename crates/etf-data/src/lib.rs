//! 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 청크 분할 데이터셋 저장소 (JSON / MessagePack + 매니페스트)
//! - 운용사별 ETF 크롤러와 Yahoo Finance NAV 보강
//! - 크롤링 결과를 저장하는 업데이터와 일일 스케줄러

pub mod error;
pub mod provider;
pub mod scheduler;
pub mod storage;
pub mod updater;

pub use error::{DataError, Result};
pub use provider::{build_http_client, default_crawlers, Crawler, EtfEnricher, YahooEnricher};
pub use scheduler::{next_run_after, SchedulerStatus, UpdateScheduler};
pub use storage::{ChunkEntry, DatasetKey, DatasetStore, Manifest};
pub use updater::{EtfUpdater, ProviderUpdate, UpdateSummary, ETF_LIST_DATASET};
