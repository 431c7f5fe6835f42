//! GraniteShares 크롤러.
//!
//! ETF 목록 페이지의 `/etf/<TICKER>` 링크를 수집합니다.
//! 펀드명은 링크 텍스트, title 속성, 티커 순으로 선택합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::info;

use super::page::ticker_links;
use super::{fetch_text, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://graniteshares.com";
const LIST_PATH: &str = "/institutional/us/en-us/etfs/";

static ETF_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/etf/([A-Z]{1,5})(?:/|$)").expect("etf link pattern is valid"));

pub struct GraniteSharesCrawler {
    client: Client,
    base_url: String,
}

impl GraniteSharesCrawler {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Crawler for GraniteSharesCrawler {
    fn provider_name(&self) -> &str {
        "graniteshares"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, LIST_PATH)).await?;
        let etfs = parse_etf_index(&html, &self.base_url)?;
        info!(provider = "graniteshares", count = etfs.len(), "GraniteShares 파싱 완료");
        Ok(etfs)
    }
}

/// ETF 목록 페이지 파싱.
pub fn parse_etf_index(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    ticker_links(html, base_url, &ETF_LINK, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_etf_index() {
        let html = r#"
            <a href="/institutional/us/en-us/etf/NVDL/">GraniteShares 2x Long NVDA Daily ETF</a>
            <a href="/institutional/us/en-us/etf/nvdl">duplicate</a>
            <a href="/institutional/us/en-us/etf/TSLR/" title="GraniteShares 2x Long TSLA Daily ETF"></a>
            <a href="/institutional/us/en-us/etf/BAR"></a>
            <a href="/institutional/us/en-us/etfs/">all</a>
        "#;
        let etfs = parse_etf_index(html, "https://graniteshares.com").unwrap();
        let tickers: Vec<&str> = etfs.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["NVDL", "TSLR", "BAR"]);
        assert_eq!(etfs[0].fund_name, "GraniteShares 2x Long NVDA Daily ETF");
        assert_eq!(etfs[1].fund_name, "GraniteShares 2x Long TSLA Daily ETF");
        assert_eq!(etfs[2].fund_name, "BAR");
        assert_eq!(
            etfs[0].product_page_url,
            "https://graniteshares.com/institutional/us/en-us/etf/NVDL/"
        );
    }
}
