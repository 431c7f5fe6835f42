//! VanEck 크롤러.
//!
//! 펀드 파인더 페이지 스크립트에 심어진 펀드 객체를 먼저 읽고,
//! 없으면 `/etf/<ticker>` 링크로 대신합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

use super::page::{embedded_funds, ticker_links};
use super::{fetch_text, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.vaneck.com";
const FINDER_PATH: &str = "/us/en/etf-mutual-fund-finder/";

static ETF_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/etf/([a-z]+)/?$").expect("etf link pattern is valid"));

pub struct VanEckCrawler {
    client: Client,
    base_url: String,
}

impl VanEckCrawler {
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
impl Crawler for VanEckCrawler {
    fn provider_name(&self) -> &str {
        "vaneck"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, FINDER_PATH)).await?;
        let etfs = parse_fund_finder(&html, &self.base_url)?;
        info!(provider = "vaneck", count = etfs.len(), "VanEck 파싱 완료");
        Ok(etfs)
    }
}

/// 펀드 파인더 페이지 파싱.
pub fn parse_fund_finder(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let funds = embedded_funds(html)?;
    if funds.is_empty() {
        debug!(provider = "vaneck", "스크립트 데이터 없음, 링크로 대체");
        return ticker_links(html, base_url, &ETF_LINK, &[]);
    }

    let finder_url = format!("{}{}", base_url, FINDER_PATH);
    Ok(funds
        .into_iter()
        .map(|fund| fund.into_etf(finder_url.as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_fund_finder_from_script() {
        let html = r#"
            <script>
                var etfFunds = {"smh": {"ticker": "smh", "name": "Semiconductor ETF", "nav": "$250.25"}};
            </script>
            <a href="/us/en/investments/gold-miners-etf-gdx/etf/gdx/">ignored</a>
        "#;
        let etfs = parse_fund_finder(html, "https://www.vaneck.com").unwrap();
        assert_eq!(etfs.len(), 1);
        assert_eq!(etfs[0].ticker, "SMH");
        assert_eq!(etfs[0].nav_amount, dec!(250.25));
        assert_eq!(
            etfs[0].product_page_url,
            "https://www.vaneck.com/us/en/etf-mutual-fund-finder/"
        );
    }

    #[test]
    fn test_parse_fund_finder_falls_back_to_links() {
        let html = r#"
            <a href="/us/en/investments/gold-miners-etf-gdx/etf/gdx/">Gold Miners ETF</a>
            <a href="/us/en/investments/etf/moat">Morningstar Wide Moat ETF</a>
            <a href="/us/en/insights/etf/">Insights</a>
        "#;
        let etfs = parse_fund_finder(html, "https://www.vaneck.com").unwrap();
        let tickers: Vec<&str> = etfs.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["GDX", "MOAT"]);
        assert_eq!(etfs[1].fund_name, "Morningstar Wide Moat ETF");
    }
}
