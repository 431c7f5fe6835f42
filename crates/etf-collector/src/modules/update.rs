//! 운용사 크롤링 및 저장.

use std::time::Instant;

use etf_data::{EtfUpdater, UpdateSummary};
use tracing::{info, warn};

use crate::error::Result;
use crate::stats::CollectionStats;

/// 운용사 업데이트 실행.
///
/// `provider`가 주어지면 해당 운용사만, 아니면 등록된 모든 운용사를 동시에 업데이트합니다.
/// 등록되지 않은 운용사면 `CollectorError::NotFound`.
pub async fn run_update(
    updater: &EtfUpdater,
    provider: Option<&str>,
    force: bool,
) -> Result<(UpdateSummary, CollectionStats)> {
    let started = Instant::now();

    let summary = match provider {
        Some(name) => {
            info!(provider = name, force, "운용사 업데이트 시작");
            let result = updater.update_by_name(name, force).await?;
            UpdateSummary::from_results(vec![result])
        }
        None => updater.update_all(force).await,
    };

    for result in &summary.results {
        if result.skipped {
            info!(
                provider = %result.provider,
                reason = result.reason.as_deref().unwrap_or(""),
                "건너뜀"
            );
        } else if result.success {
            info!(provider = %result.provider, count = result.count, "저장 완료");
        } else {
            warn!(
                provider = %result.provider,
                error = result.error.as_deref().unwrap_or("unknown"),
                "업데이트 실패"
            );
        }
    }

    let stats = CollectionStats::from_summary(&summary, started.elapsed());
    Ok((summary, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectorError;
    use async_trait::async_trait;
    use etf_core::Etf;
    use etf_data::{Crawler, DatasetStore};
    use std::sync::Arc;

    struct StaticCrawler(&'static str, usize);

    #[async_trait]
    impl Crawler for StaticCrawler {
        fn provider_name(&self) -> &str {
            self.0
        }

        async fn crawl(&self) -> etf_data::Result<Vec<Etf>> {
            Ok((0..self.1)
                .map(|i| Etf::new(format!("T{}", i), format!("Fund {}", i), "https://example.com"))
                .collect())
        }
    }

    fn updater(dir: &std::path::Path) -> EtfUpdater {
        let store = Arc::new(DatasetStore::new(dir));
        let crawlers: Vec<Arc<dyn Crawler>> = vec![
            Arc::new(StaticCrawler("alpha", 3)),
            Arc::new(StaticCrawler("empty", 0)),
        ];
        EtfUpdater::new(store, crawlers)
    }

    #[tokio::test]
    async fn test_run_update_all() {
        let dir = tempfile::tempdir().unwrap();
        let updater = updater(dir.path());

        let (summary, stats) = run_update(&updater, None, false).await.unwrap();
        assert_eq!(summary.total_providers, 2);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_etfs, 3);
    }

    #[tokio::test]
    async fn test_run_update_single_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let updater = updater(dir.path());

        let (_, stats) = run_update(&updater, Some("alpha"), false).await.unwrap();
        assert_eq!(stats.success, 1);

        let (_, stats) = run_update(&updater, Some("ALPHA"), false).await.unwrap();
        assert_eq!(stats.skipped, 1);

        let (_, stats) = run_update(&updater, Some("alpha"), true).await.unwrap();
        assert_eq!(stats.success, 1);
        assert_eq!(stats.total_etfs, 3);
    }

    #[tokio::test]
    async fn test_run_update_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let updater = updater(dir.path());

        let err = run_update(&updater, Some("vanguard"), false).await.unwrap_err();
        assert!(matches!(err, CollectorError::NotFound(_)));
    }
}
