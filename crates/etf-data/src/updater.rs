//! ETF 데이터 업데이터.
//!
//! 등록된 크롤러를 실행하고 결과를 운용사별 `etf_list` 데이터셋으로 저장합니다.
//! 최근(기본 24시간) 저장된 운용사는 강제 실행이 아니면 건너뜁니다.

use chrono::{DateTime, Utc};
use etf_core::{AppConfig, Etf};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use crate::error::{DataError, Result};
use crate::provider::{build_http_client, default_crawlers, Crawler, EtfEnricher, YahooEnricher};
use crate::storage::{DatasetKey, DatasetStore, Manifest};

/// ETF 목록 데이터셋 이름.
pub const ETF_LIST_DATASET: &str = "etf_list";

/// 운용사 하나의 업데이트 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ProviderUpdate {
    pub provider: String,
    pub success: bool,
    pub skipped: bool,
    /// 건너뛴 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 실패 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 저장된 ETF 수
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<Object>))]
    pub manifest: Option<Manifest>,
}

impl ProviderUpdate {
    fn skipped(provider: &str, reason: String) -> Self {
        Self {
            provider: provider.to_string(),
            success: true,
            skipped: true,
            reason: Some(reason),
            error: None,
            count: 0,
            manifest: None,
        }
    }

    fn failed(provider: &str, error: String) -> Self {
        Self {
            provider: provider.to_string(),
            success: false,
            skipped: false,
            reason: None,
            error: Some(error),
            count: 0,
            manifest: None,
        }
    }

    fn saved(provider: &str, manifest: Manifest) -> Self {
        Self {
            provider: provider.to_string(),
            success: true,
            skipped: false,
            reason: None,
            error: None,
            count: manifest.total_count,
            manifest: Some(manifest),
        }
    }
}

/// 전체 업데이트 요약.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UpdateSummary {
    pub timestamp: DateTime<Utc>,
    pub total_providers: usize,
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_etfs: usize,
    pub results: Vec<ProviderUpdate>,
}

impl UpdateSummary {
    /// 운용사별 결과를 집계합니다.
    pub fn from_results(results: Vec<ProviderUpdate>) -> Self {
        let skipped = results.iter().filter(|r| r.skipped).count();
        let failed = results.iter().filter(|r| !r.success).count();
        Self {
            timestamp: Utc::now(),
            total_providers: results.len(),
            successful: results.len() - skipped - failed,
            skipped,
            failed,
            total_etfs: results.iter().map(|r| r.count).sum(),
            results,
        }
    }
}

/// 크롤링과 저장을 조율하는 업데이터.
pub struct EtfUpdater {
    store: Arc<DatasetStore>,
    crawlers: Vec<Arc<dyn Crawler>>,
    enricher: Option<Arc<dyn EtfEnricher>>,
    fresh_hours: i64,
}

impl EtfUpdater {
    pub fn new(store: Arc<DatasetStore>, crawlers: Vec<Arc<dyn Crawler>>) -> Self {
        Self {
            store,
            crawlers,
            enricher: None,
            fresh_hours: 24,
        }
    }

    /// 설정으로 저장소, 기본 크롤러, (선택) Yahoo 보강기를 구성합니다.
    ///
    /// Yahoo Finance 연결에 실패하면 보강 없이 진행합니다.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(DatasetStore::from_config(&config.storage));
        info!(
            data_dir = %store.root().display(),
            format = %store.format(),
            max_file_size = store.max_file_size(),
            "데이터셋 저장소 초기화"
        );

        let client = build_http_client(&config.crawler)?;
        let crawlers = default_crawlers(client, &config.crawler);
        let mut updater = Self::new(store, crawlers).with_fresh_hours(config.crawler.fresh_hours);

        if config.crawler.enrich_with_yahoo {
            match YahooEnricher::new() {
                Ok(enricher) => {
                    updater = updater
                        .with_enricher(Arc::new(enricher.with_delay(config.crawler.request_delay())));
                    info!("Yahoo Finance NAV 보강 활성화");
                }
                Err(e) => warn!(error = %e, "Yahoo Finance 연결 실패, NAV 보강 없이 진행"),
            }
        }

        Ok(updater)
    }

    /// NAV 보강기 설정.
    pub fn with_enricher(mut self, enricher: Arc<dyn EtfEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// 최근 크롤링 판정 기준(시간) 설정.
    pub fn with_fresh_hours(mut self, hours: i64) -> Self {
        self.fresh_hours = hours;
        self
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    pub fn crawlers(&self) -> &[Arc<dyn Crawler>] {
        &self.crawlers
    }

    /// 등록된 운용사 이름 목록.
    pub fn provider_names(&self) -> Vec<String> {
        self.crawlers
            .iter()
            .map(|c| c.provider_name().to_string())
            .collect()
    }

    /// 이름으로 크롤러 조회 (대소문자 무시).
    pub fn crawler(&self, provider: &str) -> Option<Arc<dyn Crawler>> {
        self.crawlers
            .iter()
            .find(|c| c.provider_name().eq_ignore_ascii_case(provider))
            .cloned()
    }

    fn dataset_key(provider: &str) -> Result<DatasetKey> {
        DatasetKey::new(provider, ETF_LIST_DATASET)
    }

    /// 운용사가 `hours` 시간 이내에 크롤링되었는지 확인.
    ///
    /// 매니페스트가 없거나 읽을 수 없으면 `false`.
    pub async fn is_recently_crawled(&self, provider: &str, hours: i64) -> bool {
        let key = match Self::dataset_key(provider) {
            Ok(key) => key,
            Err(_) => return false,
        };

        match self.store.is_fresh(&key, chrono::Duration::hours(hours)).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(provider, error = %e, "매니페스트 확인 실패");
                false
            }
        }
    }

    /// 운용사 하나 업데이트.
    ///
    /// 실패는 에러로 전파하지 않고 결과에 기록합니다.
    pub async fn update_provider(&self, crawler: &dyn Crawler, force: bool) -> ProviderUpdate {
        let provider = crawler.provider_name().to_string();
        let span = etf_core::dataset_span!("update_provider", provider, ETF_LIST_DATASET);

        async {
            if !force && self.is_recently_crawled(&provider, self.fresh_hours).await {
                info!("최근 크롤링됨, 건너뜀");
                return ProviderUpdate::skipped(
                    &provider,
                    format!("Already crawled within {} hours", self.fresh_hours),
                );
            }

            let mut etfs = match crawler.crawl().await {
                Ok(etfs) => etfs,
                Err(e) => {
                    error!(error = %e, "크롤링 실패");
                    return ProviderUpdate::failed(&provider, e.to_string());
                }
            };

            if etfs.is_empty() {
                warn!("크롤링 결과 없음");
                return ProviderUpdate::failed(&provider, "No data retrieved".to_string());
            }
            info!(count = etfs.len(), "크롤링 완료");

            if let Some(enricher) = &self.enricher {
                enricher.enrich(&mut etfs).await;
            }

            let saved = match Self::dataset_key(&provider) {
                Ok(key) => self.store.save(&key, &etfs).await,
                Err(e) => Err(e),
            };

            match saved {
                Ok(manifest) => ProviderUpdate::saved(&provider, manifest),
                Err(e) => {
                    error!(error = %e, "저장 실패");
                    ProviderUpdate::failed(&provider, e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// 이름으로 운용사 업데이트. 등록되지 않은 운용사면 `NotFound`.
    pub async fn update_by_name(&self, provider: &str, force: bool) -> Result<ProviderUpdate> {
        let crawler = self
            .crawler(provider)
            .ok_or_else(|| DataError::NotFound(format!("provider '{}'", provider)))?;
        Ok(self.update_provider(crawler.as_ref(), force).await)
    }

    /// 모든 운용사를 동시에 업데이트.
    pub async fn update_all(&self, force: bool) -> UpdateSummary {
        info!(providers = self.crawlers.len(), force, "전체 업데이트 시작");

        let results = join_all(
            self.crawlers
                .iter()
                .map(|crawler| self.update_provider(crawler.as_ref(), force)),
        )
        .await;

        let summary = UpdateSummary::from_results(results);
        info!(
            successful = summary.successful,
            skipped = summary.skipped,
            failed = summary.failed,
            total_etfs = summary.total_etfs,
            "전체 업데이트 완료"
        );
        summary
    }

    /// 운용사의 ETF 목록. 저장된 데이터가 없으면 빈 목록.
    pub async fn etf_list(&self, provider: &str) -> Result<Vec<Etf>> {
        let key = Self::dataset_key(provider)?;
        match self.store.load(&key).await {
            Ok(etfs) => Ok(etfs),
            Err(DataError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// 등록된 모든 운용사의 ETF 목록.
    pub async fn all_etfs(&self) -> Result<BTreeMap<String, Vec<Etf>>> {
        let mut all = BTreeMap::new();
        for provider in self.provider_names() {
            let etfs = self.etf_list(&provider).await?;
            all.insert(provider, etfs);
        }
        Ok(all)
    }

    /// 티커로 ETF 검색 (대소문자 무시, 등록 순서상 첫 운용사 우선).
    pub async fn find_etf(&self, ticker: &str) -> Result<Option<Etf>> {
        for provider in self.provider_names() {
            if let Some(etf) = self
                .etf_list(&provider)
                .await?
                .into_iter()
                .find(|e| e.matches_ticker(ticker))
            {
                return Ok(Some(etf));
            }
        }
        Ok(None)
    }
}
