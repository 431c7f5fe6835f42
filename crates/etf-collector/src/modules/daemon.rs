//! 데몬 모드: 일일 스케줄에 따라 전체 업데이트 실행.

use std::sync::Arc;

use etf_data::UpdateScheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::Result;

/// Ctrl+C를 받을 때까지 스케줄러를 실행합니다.
///
/// `run_immediately`가 참이면 시작 직후 한 번 업데이트합니다.
pub async fn run_daemon(scheduler: Arc<UpdateScheduler>, run_immediately: bool) -> Result<()> {
    let token = CancellationToken::new();

    if run_immediately {
        if let Some(summary) = scheduler.run_scheduled().await {
            info!(
                successful = summary.successful,
                total = summary.total_providers,
                "시작 시 업데이트 완료"
            );
        }
    }

    let Some(handle) = scheduler.start(token.clone()) else {
        return Ok(());
    };

    let status = scheduler.status().await;
    info!(
        time = %status.scheduled_time,
        timezone = %status.timezone,
        "=== 데몬 모드 시작 ==="
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Ctrl+C 핸들러 설치 실패");
    }
    info!("종료 신호 수신, 데몬 종료 중...");
    token.cancel();

    if let Err(e) = handle.await {
        error!(error = %e, "스케줄러 태스크 비정상 종료");
    }
    Ok(())
}
