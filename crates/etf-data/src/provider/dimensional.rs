//! Dimensional 크롤러.
//!
//! fundcenter API의 `data.portfolios[]` 중 `meta.isEtf`인 항목을 사용합니다.
//! 식별자와 보수는 `{slug, value}` 목록이고 수치는 `{value, display}` 객체입니다.
//! API는 `X-Selected-Country` 헤더가 없으면 빈 목록을 반환합니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use super::{iso_date, json_decimal, json_percent, json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://etf.dimensional.com";

pub struct DimensionalCrawler {
    client: Client,
    base_url: String,
}

impl DimensionalCrawler {
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
impl Crawler for DimensionalCrawler {
    fn provider_name(&self) -> &str {
        "dimensional"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let request = self
            .client
            .get(format!("{}/public/v2/fundcenter", self.base_url))
            .query(&[("allowMorningstarFixedIncome", "true")])
            .header("X-Selected-Country", "US");
        let json = read_json(request, "Dimensional").await?;
        let etfs = parse_fundcenter(&json)?;
        info!(provider = "dimensional", count = etfs.len(), "Dimensional 파싱 완료");
        Ok(etfs)
    }
}

/// fundcenter 응답 파싱.
pub fn parse_fundcenter(json: &Value) -> Result<Vec<Etf>> {
    let portfolios = json
        .pointer("/data/portfolios")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DataError::ParseError("Dimensional data.portfolios is missing".to_string())
        })?;

    Ok(portfolios.iter().filter_map(parse_portfolio).collect())
}

fn parse_portfolio(portfolio: &Value) -> Option<Etf> {
    let meta = portfolio.get("meta")?;
    if !meta.get("isEtf").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }

    let ticker = slug_value(meta.get("identifiers"), "ticker").and_then(|v| v.as_str())?;
    let ticker = ticker.trim().to_string();
    if ticker.is_empty() {
        return None;
    }

    let name = format!(
        "Dimensional {}",
        json_text(meta, "marketingName").unwrap_or_default()
    );
    let url = format!("{}/us/en/funds/{}", DEFAULT_BASE_URL, ticker.to_lowercase());

    let mut etf = Etf::new(ticker, name, url).with_classification(
        json_text(meta, "category").unwrap_or_else(|| "Unknown".to_string()),
        "North America",
        "Developed",
    );
    for (slug, field) in [("isin", &mut etf.isin), ("cusip", &mut etf.cusip)] {
        if let Some(value) = slug_value(meta.get("identifiers"), slug).and_then(Value::as_str) {
            *field = value.to_string();
        }
    }
    etf.inception_date = meta
        .pointer("/inceptionDate/value")
        .and_then(Value::as_str)
        .and_then(iso_date);

    if let Some(latest) = first(portfolio, "prices") {
        if let Some(nav) = latest.pointer("/nav/value").and_then(json_decimal) {
            etf.nav_amount = nav;
        }
        if let Some(as_of) = latest
            .pointer("/date/value")
            .and_then(Value::as_str)
            .and_then(iso_date)
        {
            etf.nav_as_of = as_of;
        }
    }

    etf.expense_ratio = slug_value(portfolio.get("fees"), "net-exp-ratio")
        .and_then(|v| v.get("value"))
        .and_then(json_percent)
        .unwrap_or(Decimal::ZERO);

    let monthly = first(portfolio, "returnsMonthly");
    let pct = |key: &str| {
        monthly
            .and_then(|m| m.get(key))
            .and_then(|v| v.get("value"))
            .and_then(json_percent)
    };
    etf.one_year_return = pct("annualizedReturn1Year");
    etf.three_year_return = pct("annualizedReturn3Year");
    etf.five_year_return = pct("annualizedReturn5Year");
    etf.ten_year_return = pct("annualizedReturn10Year");
    etf.since_inception_return = pct("annualizedReturnSincePortfolioInception");
    etf.ytd_return = first(portfolio, "returnsDaily")
        .and_then(|d| d.pointer("/annualizedReturnYtd/value"))
        .and_then(json_percent);

    Some(etf)
}

/// `[{slug, value}]` 목록에서 slug에 해당하는 value.
fn slug_value<'a>(list: Option<&'a Value>, slug: &str) -> Option<&'a Value> {
    list?
        .as_array()?
        .iter()
        .find(|item| item.get("slug").and_then(Value::as_str) == Some(slug))?
        .get("value")
}

fn first<'a>(portfolio: &'a Value, key: &str) -> Option<&'a Value> {
    portfolio.get(key)?.as_array()?.first()
}
