//! Pacer 크롤러.
//!
//! 상품 목록 페이지의 `/products/<TICKER>` 링크를 수집합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::info;

use super::page::ticker_links;
use super::{fetch_text, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.paceretfs.com";
const LIST_PATH: &str = "/products";

static PRODUCT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/products/([A-Z]{2,5})/?$").expect("product link pattern is valid")
});

pub struct PacerCrawler {
    client: Client,
    base_url: String,
}

impl PacerCrawler {
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
impl Crawler for PacerCrawler {
    fn provider_name(&self) -> &str {
        "pacer"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, LIST_PATH)).await?;
        let etfs = parse_products(&html, &self.base_url)?;
        info!(provider = "pacer", count = etfs.len(), "Pacer 파싱 완료");
        Ok(etfs)
    }
}

/// 상품 목록 페이지 파싱.
pub fn parse_products(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    ticker_links(html, base_url, &PRODUCT_LINK, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_products() {
        let html = r#"
            <a href="/products/COWZ">Pacer US Cash Cows 100 ETF</a>
            <a href="/products/TPSC/">Pacer Trendpilot US Small Cap ETF</a>
            <a href="/products/VAMO">Pacer Valkyrie Global Asset Management ETF</a>
            <a href="/products/cowz/">Cash Cows again</a>
            <a href="/products/COWZ/holdings">Holdings</a>
        "#;
        let etfs = parse_products(html, "https://www.paceretfs.com").unwrap();
        let tickers: Vec<&str> = etfs.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["COWZ", "TPSC", "VAMO"]);
        assert_eq!(etfs[0].fund_name, "Pacer US Cash Cows 100 ETF");
        assert_eq!(etfs[1].product_page_url, "https://www.paceretfs.com/products/TPSC/");
    }

    #[test]
    fn test_parse_products_empty_page() {
        assert!(parse_products("", "https://www.paceretfs.com").unwrap().is_empty());
    }
}
