//! 저장된 데이터셋 조회.

use chrono::{DateTime, Utc};
use etf_core::StorageFormat;
use etf_data::{DatasetKey, DatasetStore, EtfUpdater, Manifest, ETF_LIST_DATASET};
use serde::Serialize;

use crate::error::{CollectorError, Result};

/// 운용사별 저장 현황.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOverview {
    pub provider: String,
    pub etf_count: usize,
    pub updated_at: Option<DateTime<Utc>>,
    pub format: Option<StorageFormat>,
    pub chunk_count: usize,
}

impl std::fmt::Display for ProviderOverview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.updated_at {
            Some(updated_at) => write!(
                f,
                "{:<14} {:>6} ETFs  {:<8} chunks={:<3} updated {}",
                self.provider,
                self.etf_count,
                self.format.map(|fmt| fmt.to_string()).unwrap_or_default(),
                self.chunk_count,
                updated_at.format("%Y-%m-%d %H:%M UTC")
            ),
            None => write!(f, "{:<14}   (no data)", self.provider),
        }
    }
}

/// 등록된 운용사의 `etf_list` 저장 현황.
pub async fn provider_overview(updater: &EtfUpdater) -> Result<Vec<ProviderOverview>> {
    let mut rows = Vec::new();
    for provider in updater.provider_names() {
        let key = DatasetKey::new(&provider, ETF_LIST_DATASET)?;
        let manifest = updater.store().manifest(&key).await?;
        rows.push(ProviderOverview {
            provider,
            etf_count: manifest.as_ref().map_or(0, |m| m.total_count),
            updated_at: manifest.as_ref().map(|m| m.updated_at),
            format: manifest.as_ref().map(|m| m.format),
            chunk_count: manifest.as_ref().map_or(0, |m| m.chunk_count),
        });
    }
    Ok(rows)
}

/// 데이터셋 매니페스트 조회. 매니페스트가 없으면 `NotFound`.
pub async fn inspect_dataset(
    store: &DatasetStore,
    provider: &str,
    dataset: &str,
) -> Result<Manifest> {
    let key = DatasetKey::new(provider, dataset)?;
    store
        .manifest(&key)
        .await?
        .ok_or_else(|| CollectorError::NotFound(format!("dataset {}", key)))
}
