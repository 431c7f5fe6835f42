//! Alpha Architect 크롤러.
//!
//! 펀드 사이트의 `/<ticker>`, `/fund/<ticker>`, `/etf/<ticker>` 링크를 수집합니다.
//! 같은 모양의 일반 메뉴 링크(`/funds`, `/about` 등)는 제외합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::info;

use super::page::ticker_links;
use super::{fetch_text, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://funds.alphaarchitect.com";

static FUND_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:/(?:fund|etf))?/([a-z]{3,5})/?$").expect("fund link pattern is valid")
});

const MENU_WORDS: [&str; 5] = ["FUNDS", "HOME", "ABOUT", "NEWS", "BLOG"];

pub struct AlphaArchitectCrawler {
    client: Client,
    base_url: String,
}

impl AlphaArchitectCrawler {
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
impl Crawler for AlphaArchitectCrawler {
    fn provider_name(&self) -> &str {
        "alphaarchitect"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}/", self.base_url)).await?;
        let etfs = parse_fund_links(&html, &self.base_url)?;
        info!(provider = "alphaarchitect", count = etfs.len(), "Alpha Architect 파싱 완료");
        Ok(etfs)
    }
}

/// 펀드 사이트 첫 페이지 파싱.
pub fn parse_fund_links(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let etfs = ticker_links(html, base_url, &FUND_LINK, &MENU_WORDS)?;
    Ok(etfs
        .into_iter()
        .map(|etf| etf.with_classification("Unknown", "US", "ETF"))
        .collect())
}
