//! Global X 크롤러.
//!
//! explore 페이지의 `/funds/<ticker>` 링크에서 티커와 펀드명을 추출합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use std::collections::HashSet;
use tracing::info;

use super::{absolute_url, fetch_text, selector, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.globalxetfs.com";

static FUND_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/funds/([a-z]+)/?$").expect("fund link pattern is valid"));

pub struct GlobalXCrawler {
    client: Client,
    base_url: String,
}

impl GlobalXCrawler {
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
impl Crawler for GlobalXCrawler {
    fn provider_name(&self) -> &str {
        "globalx"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}/explore", self.base_url)).await?;
        let etfs = parse_explore(&html, &self.base_url)?;
        info!(provider = "globalx", count = etfs.len(), "Global X 파싱 완료");
        Ok(etfs)
    }
}

/// explore 페이지 파싱.
///
/// 링크 텍스트가 비어 있는 링크(아이콘 등)는 건너뛰며 같은 티커는 처음 것만 사용합니다.
pub fn parse_explore(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let document = Html::parse_document(html);
    let links = selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut etfs = Vec::new();
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(ticker) = FUND_LINK
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_uppercase())
        else {
            continue;
        };

        let name = link.text().collect::<String>().trim().to_string();
        if name.is_empty() || !seen.insert(ticker.clone()) {
            continue;
        }

        etfs.push(Etf::new(ticker, name, absolute_url(base_url, href)));
    }

    Ok(etfs)
}
