//! 설정 관리.
//!
//! 기본값 → TOML 파일 → 환경 변수(`ETF__SECTION__KEY`) 순으로 덮어씁니다.
//!
//! ```toml
//! [storage]
//! data_dir = "data"
//! format = "json"
//!
//! [scheduler]
//! hour = 18
//! timezone = "America/New_York"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EtfError, EtfResult};
use crate::logging::{LogConfig, LogFormat};
use crate::types::StorageFormat;

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 단일 파일 최대 크기 (4MB). 초과 시 청크로 분할됩니다.
pub const DEFAULT_MAX_FILE_SIZE: usize = 4 * 1024 * 1024;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터셋 저장소 설정
    pub storage: StorageConfig,
    /// 크롤러 설정
    pub crawler: CrawlerConfig,
    /// 자동 업데이트 스케줄러 설정
    pub scheduler: SchedulerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초). 전체 업데이트 요청이 오래 걸리므로 여유 있게 잡습니다.
    pub request_timeout_secs: u64,
    /// 허용 CORS origin (쉼표 구분). 비어 있으면 모든 origin 허용
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 300,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 데이터셋 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 데이터 루트 디렉토리 (운용사별 하위 디렉토리가 생성됨)
    pub data_dir: PathBuf,
    /// 단일 파일 최대 크기 (바이트)
    pub max_file_size: usize,
    /// 저장 형식 (개발: json, 운영: msgpack 권장)
    pub format: StorageFormat,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            format: StorageFormat::Json,
        }
    }
}

/// 크롤러 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// User-Agent 헤더
    pub user_agent: String,
    /// 상세 페이지 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 최근 크롤링 판정 기준 (시간). 이 시간 이내 저장된 데이터는 건너뜀
    pub fresh_hours: i64,
    /// NAV가 비어 있는 레코드를 Yahoo Finance로 보강할지 여부
    pub enrich_with_yahoo: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            request_delay_ms: 200,
            fresh_hours: 24,
            enrich_with_yahoo: false,
        }
    }
}

impl CrawlerConfig {
    /// HTTP 타임아웃을 Duration으로 반환
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 최근 크롤링 판정 기준을 chrono Duration으로 반환
    pub fn fresh_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.fresh_hours)
    }
}

/// 자동 업데이트 스케줄러 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 서버 시작 시 스케줄러 활성화 여부
    pub enabled: bool,
    /// 실행 시각 (시, 0-23)
    pub hour: u32,
    /// 실행 시각 (분, 0-59)
    pub minute: u32,
    /// IANA 타임존 이름
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 18,
            minute: 0,
            timezone: "America/New_York".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// 타임존 파싱.
    pub fn tz(&self) -> EtfResult<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| EtfError::Config(format!("잘못된 타임존 '{}': {}", self.timezone, e)))
    }

    /// 실행 시각과 타임존 검증.
    pub fn validate(&self) -> EtfResult<()> {
        if self.hour > 23 || self.minute > 59 {
            return Err(EtfError::Config(format!(
                "잘못된 실행 시각: {:02}:{:02}",
                self.hour, self.minute
            )));
        }
        self.tz().map(|_| ())
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// tracing 초기화용 LogConfig로 변환
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> EtfResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("ETF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.scheduler.validate()?;
        Ok(app_config)
    }

    /// `.env`를 읽은 뒤 `ETF_CONFIG` 또는 기본 경로의 파일이 있으면 함께 로드합니다.
    pub fn from_env() -> EtfResult<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var("ETF_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                default.exists().then_some(default)
            });

        Self::load(path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.storage.max_file_size, 4 * 1024 * 1024);
        assert_eq!(config.storage.format, StorageFormat::Json);
        assert_eq!(config.scheduler.hour, 18);
        assert_eq!(config.crawler.fresh_hours, 24);
        assert!(config.scheduler.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[storage]
data_dir = "/tmp/etf-data"
format = "msgpack"

[scheduler]
hour = 6
minute = 30
timezone = "Asia/Seoul"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/etf-data"));
        assert_eq!(config.storage.format, StorageFormat::MsgPack);
        // 파일에 없는 값은 기본값 유지
        assert_eq!(config.storage.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.scheduler.hour, 6);
        assert_eq!(config.scheduler.tz().unwrap(), chrono_tz::Asia::Seoul);
    }

    #[test]
    fn test_invalid_scheduler_rejected() {
        let bad_time = SchedulerConfig {
            hour: 24,
            ..Default::default()
        };
        assert!(bad_time.validate().is_err());

        let bad_tz = SchedulerConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_tz.validate(), Err(EtfError::Config(_))));
    }

    #[test]
    fn test_logging_config_conversion() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let log_config = logging.to_log_config();
        assert_eq!(log_config.level, "debug");
        assert_eq!(log_config.format, LogFormat::Json);
    }

    #[test]
    fn test_repository_default_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.scheduler.timezone, "America/New_York");
    }
}
