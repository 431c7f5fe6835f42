//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use std::sync::Arc;

use etf_core::{AppConfig, EtfError};
use etf_data::{DatasetStore, EtfUpdater, UpdateScheduler};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 크롤링/저장 업데이터 (데이터셋 저장소 포함)
    pub updater: Arc<EtfUpdater>,

    /// 일일 자동 업데이트 스케줄러
    pub scheduler: Arc<UpdateScheduler>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 업데이터와 스케줄러로 AppState 생성.
    pub fn new(updater: Arc<EtfUpdater>, scheduler: Arc<UpdateScheduler>) -> Self {
        Self {
            updater,
            scheduler,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 설정으로 업데이터와 스케줄러를 구성합니다.
    pub fn from_config(config: &AppConfig) -> Result<Self, EtfError> {
        let updater = EtfUpdater::from_config(config)
            .map_err(|e| EtfError::Config(format!("업데이터 초기화 실패: {}", e)))?;
        let updater = Arc::new(updater);
        let scheduler = Arc::new(UpdateScheduler::new(updater.clone(), &config.scheduler)?);

        Ok(Self::new(updater, scheduler))
    }

    /// 데이터셋 저장소.
    pub fn store(&self) -> &Arc<DatasetStore> {
        self.updater.store()
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 네트워크 없이 주어진 크롤러와 데이터 디렉토리로 상태를 구성합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(
    data_dir: &std::path::Path,
    crawlers: Vec<Arc<dyn etf_data::Crawler>>,
) -> AppState {
    let store = Arc::new(DatasetStore::new(data_dir));
    let updater = Arc::new(EtfUpdater::new(store, crawlers));
    let scheduler = Arc::new(
        UpdateScheduler::new(updater.clone(), &etf_core::SchedulerConfig::default())
            .expect("default scheduler config is valid"),
    );
    AppState::new(updater, scheduler)
}
