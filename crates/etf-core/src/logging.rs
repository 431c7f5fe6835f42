//! 로깅 초기화.
//!
//! 레벨과 출력 형식은 설정 파일(`[logging]`)에서 읽고, `RUST_LOG`/`LOG_FORMAT`
//! 환경 변수가 있으면 그 값을 씁니다. 크롤링과 데이터셋 저장 이벤트는
//! `provider`, `dataset` 필드를 달고 기록됩니다 ([`dataset_span!`](crate::dataset_span)).

use std::fmt;

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 여러 줄, 색상 (개발용)
    #[default]
    Pretty,
    /// 이벤트당 JSON 한 줄, 필드는 최상위로 펼침
    Json,
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "unknown log format '{}' (expected pretty, json or compact)",
                other
            )),
        }
    }
}

/// `init_logging` 입력.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// EnvFilter 지시문 (예: "info,etf_data=debug")
    pub level: String,
    pub format: LogFormat,
    /// span 생성/종료도 이벤트로 출력
    pub span_events: bool,
    /// 소스 파일과 줄 번호 출력
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            span_events: false,
            source_location: false,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.source_location = enabled;
        self
    }

    /// `LOG_FORMAT` 값이 올바르면 그 형식, 아니면 설정된 형식.
    fn effective_format(&self, env_format: Option<&str>) -> LogFormat {
        env_format
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.format)
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn output_layer(config: &LogConfig, format: LogFormat) -> BoxedLayer {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(span_events);

    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// 전역 tracing subscriber 설치.
///
/// 프로세스당 한 번만 성공합니다. 두 번째 호출이나 잘못된 필터 지시문은 에러.
///
/// ```no_run
/// use etf_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("info,etf_data=debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let format = config.effective_format(std::env::var("LOG_FORMAT").ok().as_deref());

    tracing_subscriber::registry()
        .with(output_layer(&config, format).with_filter(filter))
        .try_init()?;

    tracing::debug!(%format, level = %config.level, "로깅 초기화");
    Ok(())
}

/// 운용사(와 데이터셋) 필드를 단 info span.
#[macro_export]
macro_rules! dataset_span {
    ($name:expr, $provider:expr) => {
        tracing::info_span!($name, provider = %$provider)
    };
    ($name:expr, $provider:expr, $dataset:expr) => {
        tracing::info_span!($name, provider = %$provider, dataset = %$dataset)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse_and_display() {
        for format in [LogFormat::Pretty, LogFormat::Json, LogFormat::Compact] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().unwrap_err().contains("xml"));
    }

    #[test]
    fn test_env_format_overrides_config() {
        let config = LogConfig::new("info").with_format(LogFormat::Compact);

        assert_eq!(config.effective_format(None), LogFormat::Compact);
        assert_eq!(config.effective_format(Some("json")), LogFormat::Json);
        // 잘못된 값은 무시
        assert_eq!(config.effective_format(Some("yaml")), LogFormat::Compact);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new("etf_data=trace")
            .with_span_events(true)
            .with_source_location(true);

        assert_eq!(config.level, "etf_data=trace");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.source_location);
        assert!(!LogConfig::default().source_location);
    }
}
