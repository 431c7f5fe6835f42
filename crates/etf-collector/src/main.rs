//! Standalone ETF collector CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use etf_collector::{modules, CollectorError};
use etf_core::{init_logging, AppConfig};
use etf_data::{EtfUpdater, UpdateScheduler, ETF_LIST_DATASET};

#[derive(Parser)]
#[command(name = "etf-collector")]
#[command(about = "ETF Atlas Standalone Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). 지정하지 않으면 설정 파일 값 사용
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 운용사 크롤링 및 저장 (기본: 전체 운용사)
    Update {
        /// 특정 운용사만 업데이트 (예: ishares)
        #[arg(long)]
        provider: Option<String>,

        /// 최근 크롤링 여부와 관계없이 실행
        #[arg(long)]
        force: bool,
    },

    /// 등록된 운용사와 저장 현황 출력
    Providers,

    /// 데이터셋 매니페스트 출력
    Inspect {
        /// 운용사 이름
        provider: String,

        /// 데이터셋 이름
        #[arg(long, default_value = ETF_LIST_DATASET)]
        dataset: String,
    },

    /// 데몬 모드: 매일 설정된 시각에 전체 업데이트 실행
    Daemon {
        /// 시작 직후 한 번 업데이트
        #[arg(long)]
        run_now: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 설정 로드
    let config = AppConfig::from_env().map_err(CollectorError::from)?;

    // 로깅 초기화
    let mut log_config = config.logging.to_log_config();
    if let Some(level) = &cli.log_level {
        log_config.level = level.clone();
    }
    init_logging(log_config)?;

    tracing::info!("ETF Atlas Collector 시작");

    let updater = Arc::new(EtfUpdater::from_config(&config).map_err(CollectorError::from)?);

    match cli.command {
        Commands::Update { provider, force } => {
            let (_, stats) = modules::run_update(&updater, provider.as_deref(), force).await?;
            stats.log_summary("ETF 업데이트");
        }
        Commands::Providers => {
            for row in modules::provider_overview(&updater).await? {
                println!("{}", row);
            }
        }
        Commands::Inspect { provider, dataset } => {
            let manifest = modules::inspect_dataset(updater.store(), &provider, &dataset).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&manifest).map_err(CollectorError::from)?
            );
        }
        Commands::Daemon { run_now } => {
            let scheduler = Arc::new(
                UpdateScheduler::new(updater.clone(), &config.scheduler)
                    .map_err(CollectorError::from)?,
            );
            modules::run_daemon(scheduler, run_now).await?;
        }
    }

    tracing::info!("ETF Atlas Collector 종료");

    Ok(())
}
