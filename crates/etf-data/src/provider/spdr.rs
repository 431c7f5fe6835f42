//! SPDR (State Street) 크롤러.
//!
//! fund finder JSON의 값은 대부분 `["$21.27", 21.27]`처럼 표시값과 원시값
//! 쌍으로 옵니다. 숫자는 원시값을, 날짜는 두 번째 원소를 사용합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use etf_core::Etf;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use super::{json_decimal, json_text, parse_date_any, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://www.ssga.com";
const FINDER_PATH: &str = "/bin/v1/ssmp/fund/fundfinder";

pub struct SpdrCrawler {
    client: Client,
    base_url: String,
}

impl SpdrCrawler {
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
impl Crawler for SpdrCrawler {
    fn provider_name(&self) -> &str {
        "spdr"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let request = self
            .client
            .get(format!("{}{}", self.base_url, FINDER_PATH))
            .query(&[
                ("country", "us"),
                ("language", "en"),
                ("role", "intermediary"),
                ("product", ""),
                ("ui", "fund-finder"),
            ]);
        let json = read_json(request, "SPDR").await?;
        let etfs = parse_fund_finder(&json, DEFAULT_BASE_URL)?;
        info!(provider = "spdr", count = etfs.len(), "SPDR 파싱 완료");
        Ok(etfs)
    }
}

/// fund finder JSON 파싱. `fundTicker`가 없는 항목은 건너뜁니다.
pub fn parse_fund_finder(json: &Value, site_url: &str) -> Result<Vec<Etf>> {
    let funds = json
        .pointer("/data/funds/etfs/datas")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DataError::ParseError("SPDR data.funds.etfs.datas is missing".to_string())
        })?;

    Ok(funds
        .iter()
        .filter_map(|fund| parse_fund(fund, site_url))
        .collect())
}

fn parse_fund(fund: &Value, site_url: &str) -> Option<Etf> {
    let ticker = json_text(fund, "fundTicker")?;
    let name = json_text(fund, "fundName").unwrap_or_default();
    let url = match json_text(fund, "fundUri") {
        Some(uri) => format!("{}{}", site_url, uri),
        None => format!("{}/us/en/intermediary/etfs/{}", site_url, ticker.to_lowercase()),
    };
    let region = if json_text(fund, "domicile").as_deref() == Some("US") {
        "North America"
    } else {
        "Unknown"
    };

    let mut etf = Etf::new(ticker, name, url).with_classification("Unknown", region, "Developed");
    etf.inception_date = pair_date(fund, "inceptionDate");
    if let Some(nav) = pair_decimal(fund, "nav") {
        etf.nav_amount = nav;
    }
    if let Some(as_of) = pair_date(fund, "asOfDate") {
        etf.nav_as_of = as_of;
    }
    etf.expense_ratio = pair_decimal(fund, "ter").unwrap_or(Decimal::ZERO);
    etf.ytd_return = pair_decimal(fund, "ytd");
    etf.one_year_return = pair_decimal(fund, "yr1");
    etf.three_year_return = pair_decimal(fund, "yr3");
    etf.five_year_return = pair_decimal(fund, "yr5");
    etf.ten_year_return = pair_decimal(fund, "yr10");
    etf.since_inception_return = pair_decimal(fund, "sinceInception");

    Some(etf)
}

/// `[표시값, 원시값]`의 원시값, 또는 단일 값.
fn pair_decimal(fund: &Value, key: &str) -> Option<Decimal> {
    match fund.get(key)? {
        Value::Array(pair) => json_decimal(pair.get(1)?),
        other => json_decimal(other),
    }
}

fn pair_date(fund: &Value, key: &str) -> Option<NaiveDate> {
    let text = fund.get(key)?.as_array()?.get(1)?.as_str()?;
    parse_date_any(text, &["%Y-%m-%d", "%b %d %Y"])
}
