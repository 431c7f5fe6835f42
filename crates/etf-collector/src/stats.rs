//! 업데이트 통계 구조체.

use etf_data::UpdateSummary;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 업데이트 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 운용사 수
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 건너뛴 횟수 (최근 크롤링됨)
    pub skipped: usize,
    /// 저장된 총 ETF 수
    pub total_etfs: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 업데이트 요약에서 통계 생성
    pub fn from_summary(summary: &UpdateSummary, elapsed: Duration) -> Self {
        Self {
            total: summary.total_providers,
            success: summary.successful,
            errors: summary.failed,
            skipped: summary.skipped,
            total_etfs: summary.total_etfs,
            elapsed,
        }
    }

    /// 성공률 계산 (%). 건너뛴 운용사는 성공으로 칩니다.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.success + self.skipped) as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            total_etfs = self.total_etfs,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "업데이트 완료"
        );
    }
}
