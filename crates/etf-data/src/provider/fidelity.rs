//! Fidelity 크롤러.
//!
//! ETF 찾기 페이지는 스크립트에 펀드 배열을 심어 두고 클라이언트에서 렌더링합니다.
//! 배열을 찾지 못하면 빈 목록을 반환합니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use tracing::{info, warn};

use super::page::embedded_funds;
use super::{fetch_text, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.fidelity.com";
const LIST_PATH: &str = "/etfs/find-an-etf";

pub struct FidelityCrawler {
    client: Client,
    base_url: String,
}

impl FidelityCrawler {
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
impl Crawler for FidelityCrawler {
    fn provider_name(&self) -> &str {
        "fidelity"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, LIST_PATH)).await?;
        let etfs = parse_find_an_etf(&html, &self.base_url)?;
        if etfs.is_empty() {
            warn!(provider = "fidelity", "페이지에 펀드 데이터 없음");
        }
        info!(provider = "fidelity", count = etfs.len(), "Fidelity 파싱 완료");
        Ok(etfs)
    }
}

/// ETF 찾기 페이지 파싱.
pub fn parse_find_an_etf(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let list_url = format!("{}{}", base_url, LIST_PATH);
    Ok(embedded_funds(html)?
        .into_iter()
        .map(|fund| fund.into_etf(list_url.as_str()))
        .collect())
}
