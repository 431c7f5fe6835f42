//! YieldMax 크롤러.
//!
//! `#fundsTableWrap` 표의 행(티커, 펀드명, 보수율, AUM, 설정일)을 읽습니다.
//! 표가 스크립트로 채워지는 경우 정적 HTML에는 행이 없어 빈 목록이 됩니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use scraper::{ElementRef, Html};
use tracing::{info, warn};

use super::{absolute_url, fetch_text, parse_date_any, parse_decimal, selector, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://yieldmaxetfs.com";
const LIST_PATH: &str = "/our-etfs/";

const DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%b %d, %Y", "%B %d, %Y"];

pub struct YieldMaxCrawler {
    client: Client,
    base_url: String,
}

impl YieldMaxCrawler {
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
impl Crawler for YieldMaxCrawler {
    fn provider_name(&self) -> &str {
        "yieldmax"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, LIST_PATH)).await?;
        let etfs = parse_funds_table(&html, &self.base_url)?;
        if etfs.is_empty() {
            warn!(provider = "yieldmax", "펀드 표가 비어 있음");
        }
        info!(provider = "yieldmax", count = etfs.len(), "YieldMax 파싱 완료");
        Ok(etfs)
    }
}

/// 펀드 표 파싱. 칸이 두 개 미만인 행은 건너뜁니다.
pub fn parse_funds_table(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let document = Html::parse_document(html);
    let rows = selector("#fundsTableWrap table tbody tr")?;
    let cells = selector("td")?;
    let links = selector("a[href]")?;
    let list_url = format!("{}{}", base_url, LIST_PATH);

    let mut etfs = Vec::new();
    for row in document.select(&rows) {
        let row_cells: Vec<ElementRef> = row.select(&cells).collect();
        if row_cells.len() < 2 {
            continue;
        }
        let text = |idx: usize| {
            row_cells
                .get(idx)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        };

        let (Some(ticker), Some(name)) = (text(0), text(1)) else {
            continue;
        };
        let url = row_cells[..2]
            .iter()
            .find_map(|cell| cell.select(&links).next())
            .and_then(|link| link.value().attr("href"))
            .map(|href| absolute_url(base_url, href))
            .unwrap_or_else(|| list_url.clone());

        let mut etf = Etf::new(ticker.to_uppercase(), name, url);
        if let Some(expense_ratio) = text(2).and_then(|t| parse_decimal(&t)) {
            etf.expense_ratio = expense_ratio;
        }
        etf.inception_date = text(4).and_then(|t| parse_date_any(&t, &DATE_FORMATS));
        etfs.push(etf);
    }

    Ok(etfs)
}
