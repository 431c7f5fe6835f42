//! 운용사 크롤러.
//!
//! 각 운용사 웹사이트(또는 공개 JSON)에서 ETF 목록을 수집합니다.
//!
//! JSON API:
//! - `ISharesCrawler`: 상품 스크리너 (`{d, r}` 필드)
//! - `VanguardCrawler`, `SpdrCrawler`, `InvescoCrawler`, `JpMorganCrawler`,
//!   `DimensionalCrawler`, `PimcoCrawler`: 운용사별 펀드 목록 API
//! - `FranklinTempletonCrawler`, `GoldmanSachsCrawler`: GraphQL POST
//!
//! HTML 페이지:
//! - `RoundhillCrawler`: 목록 페이지 + 티커별 상세 페이지
//! - `FirstTrustCrawler`, `YieldMaxCrawler`: 목록 표
//! - `GlobalXCrawler`, `GraniteSharesCrawler`, `AlphaArchitectCrawler`, `PacerCrawler`:
//!   상세 페이지 링크
//! - `VanEckCrawler`, `WisdomTreeCrawler`, `FidelityCrawler`: 스크립트에 심어진 펀드 JSON
//!   (앞의 둘은 없으면 링크로 대체)
//!
//! 기타:
//! - `DirexionCrawler`: 큐레이션된 레버리지/인버스 ETF 목록
//! - `YahooEnricher`: NAV가 비어 있는 레코드를 Yahoo Finance 종가로 보강
//!
//! 각 크롤러는 HTTP 요청과 분리된 순수 파싱 함수를 제공합니다.

pub mod alphaarchitect;
pub mod dimensional;
pub mod direxion;
pub mod fidelity;
pub mod firsttrust;
pub mod franklintempleton;
pub mod globalx;
pub mod goldmansachs;
pub mod graniteshares;
pub mod invesco;
pub mod ishares;
pub mod jpmorgan;
pub mod pacer;
mod page;
pub mod pimco;
pub mod roundhill;
pub mod spdr;
pub mod vaneck;
pub mod vanguard;
pub mod wisdomtree;
pub mod yahoo;
pub mod yieldmax;

pub use alphaarchitect::AlphaArchitectCrawler;
pub use dimensional::DimensionalCrawler;
pub use direxion::DirexionCrawler;
pub use fidelity::FidelityCrawler;
pub use firsttrust::FirstTrustCrawler;
pub use franklintempleton::FranklinTempletonCrawler;
pub use globalx::GlobalXCrawler;
pub use goldmansachs::GoldmanSachsCrawler;
pub use graniteshares::GraniteSharesCrawler;
pub use invesco::InvescoCrawler;
pub use ishares::ISharesCrawler;
pub use jpmorgan::JpMorganCrawler;
pub use pacer::PacerCrawler;
pub use pimco::PimcoCrawler;
pub use roundhill::RoundhillCrawler;
pub use spdr::SpdrCrawler;
pub use vaneck::VanEckCrawler;
pub use vanguard::VanguardCrawler;
pub use wisdomtree::WisdomTreeCrawler;
pub use yahoo::YahooEnricher;
pub use yieldmax::YieldMaxCrawler;

use async_trait::async_trait;
use chrono::NaiveDate;
use etf_core::{CrawlerConfig, Etf};
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use scraper::Selector;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DataError, Result};

/// 운용사 ETF 목록 크롤러.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// 운용사 식별자 (소문자, 데이터셋 디렉토리명으로 사용).
    fn provider_name(&self) -> &str;

    /// ETF 목록 수집.
    async fn crawl(&self) -> Result<Vec<Etf>>;
}

/// 크롤링 결과 보강.
#[async_trait]
pub trait EtfEnricher: Send + Sync {
    /// 레코드를 제자리에서 보강하고 보강된 개수를 반환합니다.
    ///
    /// 개별 레코드의 실패는 로그만 남기고 무시합니다.
    async fn enrich(&self, etfs: &mut [Etf]) -> usize;
}

/// 크롤러 공용 HTTP 클라이언트 생성.
///
/// 타임아웃과 데스크톱 User-Agent를 설정하며 리다이렉트는 따라갑니다.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?)
}

/// 등록된 기본 크롤러 목록 (업데이트 순서).
pub fn default_crawlers(client: Client, config: &CrawlerConfig) -> Vec<Arc<dyn Crawler>> {
    vec![
        Arc::new(ISharesCrawler::new(client.clone())),
        Arc::new(RoundhillCrawler::new(client.clone()).with_delay(config.request_delay())),
        Arc::new(VanguardCrawler::new(client.clone())),
        Arc::new(SpdrCrawler::new(client.clone())),
        Arc::new(InvescoCrawler::new(client.clone())),
        Arc::new(JpMorganCrawler::new(client.clone())),
        Arc::new(DimensionalCrawler::new(client.clone())),
        Arc::new(FirstTrustCrawler::new(client.clone())),
        Arc::new(FidelityCrawler::new(client.clone())),
        Arc::new(FranklinTempletonCrawler::new(client.clone())),
        Arc::new(VanEckCrawler::new(client.clone())),
        Arc::new(WisdomTreeCrawler::new(client.clone())),
        Arc::new(GlobalXCrawler::new(client.clone())),
        Arc::new(DirexionCrawler::new()),
        Arc::new(PimcoCrawler::new(client.clone())),
        Arc::new(GraniteSharesCrawler::new(client.clone())),
        Arc::new(AlphaArchitectCrawler::new(client.clone())),
        Arc::new(PacerCrawler::new(client.clone())),
        Arc::new(GoldmanSachsCrawler::new(client.clone())),
        Arc::new(YieldMaxCrawler::new(client)),
    ]
}

/// GET 요청 후 본문 텍스트 반환.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    read_text(client.get(url)).await
}

/// 요청을 보내고 본문 텍스트 반환. 429는 `FetchError`.
pub(crate) async fn read_text(request: RequestBuilder) -> Result<String> {
    let response = request.send().await?;

    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::FetchError(format!(
            "rate limited: {}",
            response.url()
        )));
    }

    Ok(response.error_for_status()?.text().await?)
}

/// 요청을 보내고 본문을 JSON으로 파싱.
pub(crate) async fn read_json(request: RequestBuilder, source: &str) -> Result<Value> {
    let body = read_text(request).await?;
    serde_json::from_str(&body)
        .map_err(|e| DataError::ParseError(format!("{} JSON: {}", source, e)))
}

/// CSS 셀렉터 파싱.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DataError::ParseError(format!("selector '{}': {}", css, e)))
}

/// 상대 경로를 절대 URL로 변환.
pub(crate) fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href)
    }
}

/// "0.59%", "$1,234.5" 같은 텍스트에서 숫자 추출.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&cleaned).ok())
}

/// JSON 숫자 또는 숫자 문자열.
pub(crate) fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// 0.0528 같은 비율을 백분율(5.28)로.
pub(crate) fn json_percent(value: &Value) -> Option<Decimal> {
    json_decimal(value).map(|v| (v * Decimal::ONE_HUNDRED).round_dp(2))
}

/// 비어 있지 않은 문자열 필드.
pub(crate) fn json_text(value: &Value, key: &str) -> Option<String> {
    let text = value.get(key)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// "2017-09-22" 또는 "2017-09-22T00:00:00" 형식 날짜.
pub(crate) fn iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim().get(..10)?, "%Y-%m-%d").ok()
}

/// 여러 형식을 차례로 시도하는 날짜 파싱.
pub(crate) fn parse_date_any(text: &str, formats: &[&str]) -> Option<NaiveDate> {
    let text = text.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// 요청 간 딜레이.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("0.59%"), Some(dec!(0.59)));
        assert_eq!(parse_decimal(" 1,234.50 "), Some(dec!(1234.50)));
        assert_eq!(parse_decimal("1e-2"), Some(dec!(0.01)));
        assert_eq!(parse_decimal("$21.27"), Some(dec!(21.27)));
        assert_eq!(parse_decimal("N/A"), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_json_helpers() {
        use serde_json::json;

        let fund = json!({"ticker": " VOO ", "empty": "", "ratio": 0.0528, "nav": "45.46"});
        assert_eq!(json_text(&fund, "ticker").as_deref(), Some("VOO"));
        assert_eq!(json_text(&fund, "empty"), None);
        assert_eq!(json_text(&fund, "missing"), None);
        assert_eq!(json_percent(&fund["ratio"]), Some(dec!(5.28)));
        assert_eq!(json_decimal(&fund["nav"]), Some(dec!(45.46)));
        assert_eq!(json_decimal(&json!(null)), None);

        assert_eq!(iso_date("2010-09-07T00:00:00-04:00"), NaiveDate::from_ymd_opt(2010, 9, 7));
        assert_eq!(iso_date("09/07/2010"), None);
        assert_eq!(
            parse_date_any("05/18/16", &["%Y-%m-%d", "%m/%d/%y"]),
            NaiveDate::from_ymd_opt(2016, 5, 18)
        );
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://www.globalxetfs.com", "/funds/qyld"),
            "https://www.globalxetfs.com/funds/qyld"
        );
        assert_eq!(
            absolute_url("https://a.com/", "https://b.com/x"),
            "https://b.com/x"
        );
    }

    #[test]
    fn test_default_crawlers_registered() {
        let config = CrawlerConfig::default();
        let client = build_http_client(&config).unwrap();
        let names: Vec<String> = default_crawlers(client, &config)
            .iter()
            .map(|c| c.provider_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "ishares",
                "roundhill",
                "vanguard",
                "spdr",
                "invesco",
                "jpmorgan",
                "dimensional",
                "firsttrust",
                "fidelity",
                "franklintempleton",
                "vaneck",
                "wisdomtree",
                "globalx",
                "direxion",
                "pimco",
                "graniteshares",
                "alphaarchitect",
                "pacer",
                "goldmansachs",
                "yieldmax",
            ]
        );
        // 운용사 이름은 데이터셋 디렉토리로 쓰이므로 겹치면 안 됨
        let unique: std::collections::HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
