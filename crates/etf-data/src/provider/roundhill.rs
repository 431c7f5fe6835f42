//! Roundhill 크롤러.
//!
//! 목록 페이지에서 `/etf/<TICKER>/` 링크로 티커를 모은 뒤
//! 티커별 상세 페이지에서 펀드명(`h1`)과 운용 보수를 추출합니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::Html;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};

use super::{fetch_text, parse_decimal, pause, selector, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.roundhillinvestments.com";

static EXPENSE_RATIO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Expense Ratio|Net Expense)[:\s]*(\d+\.\d+)%")
        .expect("expense ratio pattern is valid")
});

pub struct RoundhillCrawler {
    client: Client,
    base_url: String,
    request_delay: Duration,
}

impl RoundhillCrawler {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_delay: Duration::from_millis(200),
        }
    }

    /// 상세 페이지 요청 간 딜레이 설정.
    pub fn with_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }

    fn detail_url(&self, ticker: &str) -> String {
        format!("{}/etf/{}/", self.base_url, ticker.to_lowercase())
    }
}

#[async_trait]
impl Crawler for RoundhillCrawler {
    fn provider_name(&self) -> &str {
        "roundhill"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let list_html = fetch_text(&self.client, &format!("{}/etf", self.base_url)).await?;
        let tickers = extract_tickers(&list_html)?;
        info!(provider = "roundhill", tickers = tickers.len(), "Roundhill 티커 수집");

        let mut etfs = Vec::with_capacity(tickers.len());
        for (i, ticker) in tickers.iter().enumerate() {
            if i > 0 {
                pause(self.request_delay).await;
            }

            let url = self.detail_url(ticker);
            let html = match fetch_text(&self.client, &url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(provider = "roundhill", ticker = %ticker, error = %e, "상세 페이지 요청 실패");
                    continue;
                }
            };

            match parse_detail(&html, ticker, &url)? {
                Some(etf) => etfs.push(etf),
                None => warn!(provider = "roundhill", ticker = %ticker, "상세 페이지에 h1 없음"),
            }
        }

        info!(provider = "roundhill", count = etfs.len(), "Roundhill 파싱 완료");
        Ok(etfs)
    }
}

/// 목록 페이지에서 티커 추출.
///
/// `../etf/METV/`, `/etf/metv` 형태의 링크를 인식합니다.
/// 5자 이하의 영숫자(`-` 허용)만 받아들이며 대문자로 정규화·중복 제거합니다.
pub fn extract_tickers(html: &str) -> Result<BTreeSet<String>> {
    let document = Html::parse_document(html);
    let links = selector("a[href]")?;

    let mut tickers = BTreeSet::new();
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(pos) = href.rfind("etf/") else {
            continue;
        };

        let ticker = href[pos + "etf/".len()..].trim_matches('/');
        let valid = !ticker.is_empty()
            && ticker.len() <= 5
            && ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if valid {
            tickers.insert(ticker.to_uppercase());
        }
    }

    Ok(tickers)
}

/// 상세 페이지 파싱. `h1`이 없으면 `None`.
///
/// 펀드명은 `h1` 텍스트에서 티커를 제거한 값입니다 ("METV Metaverse ETF" → "Metaverse ETF").
pub fn parse_detail(html: &str, ticker: &str, url: &str) -> Result<Option<Etf>> {
    let document = Html::parse_document(html);
    let h1 = selector("h1")?;

    let Some(heading) = document.select(&h1).next() else {
        return Ok(None);
    };
    let full_name = heading.text().collect::<String>();
    let fund_name = full_name.replace(ticker, "").trim().to_string();

    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    let expense_ratio = EXPENSE_RATIO
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
        .unwrap_or(Decimal::ZERO);

    Ok(Some(
        Etf::new(ticker, fund_name, url).with_expense_ratio(expense_ratio),
    ))
}
