//! 일일 자동 업데이트 스케줄러.
//!
//! 매일 지정된 현지 시각(기본: 18:00 America/New_York)에 전체 운용사를 업데이트합니다.
//! 다음 실행 시각은 타임존의 일광 절약 시간(DST) 전환을 반영해 계산합니다.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use etf_core::{EtfResult, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::updater::{EtfUpdater, UpdateSummary};

/// 스케줄러 상태.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct SchedulerStatus {
    /// 스케줄 루프 실행 여부
    pub running: bool,
    /// 업데이트 작업 진행 중 여부
    pub job_running: bool,
    /// 다음 실행 예정 시각 (UTC)
    pub next_run: Option<DateTime<Utc>>,
    /// IANA 타임존 이름
    pub timezone: String,
    /// 현지 실행 시각 (HH:MM)
    pub scheduled_time: String,
    /// 마지막 실행 결과
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<UpdateSummary>,
}

/// `now` 이후 처음 돌아오는 `hour:minute` (현지 시각)를 UTC로 계산.
///
/// - 현지 시각이 두 번 존재하면(DST 종료) 앞선 시각을 사용
/// - 현지 시각이 존재하지 않으면(DST 시작) 한 시간 뒤로 이동
///
/// `hour`/`minute`가 범위를 벗어나면 `None`.
pub fn next_run_after(now: DateTime<Utc>, hour: u32, minute: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(&tz).date_naive();

    (0..=2)
        .filter_map(|offset| today.checked_add_days(chrono::Days::new(offset)))
        .filter_map(|date| resolve_local(date, hour, minute, tz))
        .find(|candidate| *candidate > now)
}

fn resolve_local(date: NaiveDate, hour: u32, minute: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive + ChronoDuration::hours(1)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
}

/// 업데이트 실행 표시. 실행이 패닉으로 끝나도 drop 시점에 해제됩니다.
struct JobGuard<'a>(&'a AtomicBool);

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 일일 업데이트 스케줄러.
pub struct UpdateScheduler {
    updater: Arc<EtfUpdater>,
    hour: u32,
    minute: u32,
    tz: Tz,
    running: AtomicBool,
    job_running: AtomicBool,
    next_run: RwLock<Option<DateTime<Utc>>>,
    last_run: RwLock<Option<UpdateSummary>>,
}

impl UpdateScheduler {
    /// 설정으로 스케줄러 생성. 실행 시각이나 타임존이 잘못되면 에러.
    pub fn new(updater: Arc<EtfUpdater>, config: &SchedulerConfig) -> EtfResult<Self> {
        config.validate()?;
        Ok(Self {
            updater,
            hour: config.hour,
            minute: config.minute,
            tz: config.tz()?,
            running: AtomicBool::new(false),
            job_running: AtomicBool::new(false),
            next_run: RwLock::new(None),
            last_run: RwLock::new(None),
        })
    }

    pub fn updater(&self) -> &Arc<EtfUpdater> {
        &self.updater
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_job_running(&self) -> bool {
        self.job_running.load(Ordering::SeqCst)
    }

    /// 현지 실행 시각 문자열 (예: "18:00").
    pub fn scheduled_time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// `now` 이후 다음 실행 시각.
    pub fn next_run_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        next_run_after(now, self.hour, self.minute, self.tz)
    }

    /// 현재 상태 조회.
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            job_running: self.is_job_running(),
            next_run: *self.next_run.read().await,
            timezone: self.tz.name().to_string(),
            scheduled_time: self.scheduled_time(),
            last_run: self.last_run.read().await.clone(),
        }
    }

    /// 스케줄 루프 시작.
    ///
    /// `shutdown`이 취소될 때까지 매일 실행합니다. 이미 실행 중이면 `None`.
    pub fn start(self: &Arc<Self>, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("스케줄러가 이미 실행 중입니다");
            return None;
        }

        let this = Arc::clone(self);
        Some(tokio::spawn(async move {
            info!(
                time = %this.scheduled_time(),
                timezone = %this.tz.name(),
                "스케줄러 시작"
            );

            loop {
                let now = Utc::now();
                let Some(next) = this.next_run_from(now) else {
                    error!("다음 실행 시각을 계산할 수 없습니다");
                    break;
                };
                *this.next_run.write().await = Some(next);
                info!(next_run = %next, "다음 자동 업데이트 예약");

                let wait = (next - now).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        if this.run_scheduled().await.is_none() {
                            warn!("이전 업데이트가 진행 중이라 예약 실행을 건너뜀");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("스케줄러: 종료 시그널 수신");
                        break;
                    }
                }
            }

            *this.next_run.write().await = None;
            this.running.store(false, Ordering::SeqCst);
            info!("스케줄러 종료됨");
        }))
    }

    /// 업데이트를 현재 태스크에서 실행. 다른 실행이 진행 중이면 `None`.
    pub async fn run_scheduled(&self) -> Option<UpdateSummary> {
        if !self.try_begin() {
            return None;
        }
        Some(self.execute().await)
    }

    /// 업데이트를 백그라운드에서 즉시 시작.
    ///
    /// 이미 진행 중인 실행이 있으면 새로 시작하지 않고 `false`를 반환합니다.
    pub fn run_now(self: &Arc<Self>) -> bool {
        if !self.try_begin() {
            return false;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.execute().await;
        });
        true
    }

    fn try_begin(&self) -> bool {
        !self.job_running.swap(true, Ordering::SeqCst)
    }

    async fn execute(&self) -> UpdateSummary {
        let _job = JobGuard(&self.job_running);
        info!("자동 업데이트 실행");
        let summary = self.updater.update_all(false).await;
        info!(
            successful = summary.successful,
            total = summary.total_providers,
            "자동 업데이트 완료"
        );
        *self.last_run.write().await = Some(summary.clone());
        summary
    }
}
