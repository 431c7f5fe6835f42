//! WisdomTree 크롤러.
//!
//! 목록 페이지 스크립트의 펀드 배열을 우선 사용하고, 없으면 `/etf/<ticker>` 링크를 수집합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::info;

use super::page::{embedded_funds, ticker_links};
use super::{fetch_text, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.wisdomtree.com";
const LIST_PATH: &str = "/investments/etfs";

static ETF_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/etf/([a-z]+)").expect("etf link pattern is valid"));

pub struct WisdomTreeCrawler {
    client: Client,
    base_url: String,
}

impl WisdomTreeCrawler {
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
impl Crawler for WisdomTreeCrawler {
    fn provider_name(&self) -> &str {
        "wisdomtree"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, LIST_PATH)).await?;
        let etfs = parse_etf_list(&html, &self.base_url)?;
        info!(provider = "wisdomtree", count = etfs.len(), "WisdomTree 파싱 완료");
        Ok(etfs)
    }
}

/// ETF 목록 페이지 파싱.
pub fn parse_etf_list(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let funds = embedded_funds(html)?;
    if funds.is_empty() {
        return ticker_links(html, base_url, &ETF_LINK, &[]);
    }

    Ok(funds
        .into_iter()
        .map(|fund| {
            let url = format!("{}/investments/etfs/{}", base_url, fund.ticker.to_lowercase());
            fund.into_etf(url)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_etf_list_from_script() {
        let html = r#"
            <script>
                window.__ETF_LIST__ = [
                    {"ticker": "dgrw", "fundName": "WisdomTree U.S. Quality Dividend Growth Fund",
                     "inceptionDate": "2013-05-22", "expenseRatio": 0.28},
                    {"ticker": "dxj", "fundName": "WisdomTree Japan Hedged Equity Fund"}
                ];
            </script>
        "#;
        let etfs = parse_etf_list(html, "https://www.wisdomtree.com").unwrap();
        assert_eq!(etfs.len(), 2);
        assert_eq!(etfs[0].ticker, "DGRW");
        assert_eq!(etfs[0].inception_date, NaiveDate::from_ymd_opt(2013, 5, 22));
        assert_eq!(etfs[0].expense_ratio, dec!(0.28));
        assert_eq!(
            etfs[1].product_page_url,
            "https://www.wisdomtree.com/investments/etfs/dxj"
        );
    }

    #[test]
    fn test_parse_etf_list_links() {
        let html = r#"
            <a href="/investments/etf/dgrw/overview">WisdomTree U.S. Quality Dividend Growth Fund</a>
            <a href="https://www.wisdomtree.com/investments/etf/HEDJ">Europe Hedged Equity Fund</a>
            <a href="/investments/etfs">All ETFs</a>
        "#;
        let etfs = parse_etf_list(html, "https://www.wisdomtree.com").unwrap();
        let tickers: Vec<&str> = etfs.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["DGRW", "HEDJ"]);
        assert_eq!(
            etfs[1].product_page_url,
            "https://www.wisdomtree.com/investments/etf/HEDJ"
        );
    }
}
