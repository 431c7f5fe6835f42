//! PIMCO 크롤러.
//!
//! fund explorer API는 뮤추얼 펀드와 ETF를 함께 반환하며 필드명에 공백이 들어갑니다.
//! `Vehicle` 또는 `Investment Vehicle Two`에 "ETF"가 있는 항목만 사용합니다.
//! NAV는 이 응답에 없으므로 Yahoo 보강 단계에서 채웁니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{iso_date, json_decimal, json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_API_URL: &str = "https://fundexp-ui.pimco.com";
const SITE_URL: &str = "https://www.pimco.com";

pub struct PimcoCrawler {
    client: Client,
    api_url: String,
}

impl PimcoCrawler {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_API_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Crawler for PimcoCrawler {
    fn provider_name(&self) -> &str {
        "pimco"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let request = self
            .client
            .get(format!(
                "{}/fund-explorer-api/api/dashboard/usPerformanceDetails",
                self.api_url
            ))
            .query(&[("selectedViewNav", "NAV")])
            .header("countrycode", "US")
            .header("langcode", "en")
            .header("userrole", "IND")
            .header("origin", SITE_URL)
            .header("referer", format!("{}/", SITE_URL));
        let json = read_json(request, "PIMCO").await?;
        let etfs = parse_performance_details(&json)?;
        info!(provider = "pimco", count = etfs.len(), "PIMCO 파싱 완료");
        Ok(etfs)
    }
}

/// 성과 상세 응답 파싱.
pub fn parse_performance_details(json: &Value) -> Result<Vec<Etf>> {
    let funds = json
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::ParseError("PIMCO data is missing".to_string()))?;

    Ok(funds.iter().filter_map(parse_fund).collect())
}

fn parse_fund(fund: &Value) -> Option<Etf> {
    let is_etf = ["Vehicle", "Investment Vehicle Two"].iter().any(|key| {
        json_text(fund, key).is_some_and(|v| v.to_uppercase().contains("ETF"))
    });
    if !is_etf {
        return None;
    }

    let ticker = json_text(fund, "Ticker")?.to_uppercase();
    let name = json_text(fund, "Name").or_else(|| json_text(fund, "Cusip Name"))?;
    let url = format!("{}/us/en/investments/etf/{}", SITE_URL, ticker.to_lowercase());

    let mut etf = Etf::new(ticker, name, url);
    etf.inception_date = json_text(fund, "Share Class Inception Date")
        .or_else(|| json_text(fund, "Share Class Perf Inception Date"))
        .and_then(|d| iso_date(&d));
    if let Some(expense_ratio) = ["Net Expense Ratio %2", "Gross Expense Ratio %"]
        .iter()
        .find_map(|key| fund.get(*key).and_then(json_decimal))
    {
        etf.expense_ratio = expense_ratio;
    }

    Some(etf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_performance_details() {
        let json = json!({
            "asOfDate": "2024-01-01",
            "data": [
                {
                    "Ticker": "MINT",
                    "Name": "PIMCO Enhanced Short Maturity Active ETF",
                    "Vehicle": "ETF",
                    "Investment Vehicle Two": "ETF",
                    "Share Class Inception Date": "2009-11-16",
                    "Net Expense Ratio %2": 0.35,
                    "Gross Expense Ratio %": 0.36
                },
                {
                    "Ticker": "zroz ",
                    "Cusip Name": "PIMCO 25+ Year Zero Coupon US Treasury ETF",
                    "Vehicle": "Exchange Traded Fund",
                    "Investment Vehicle Two": "etf",
                    "Gross Expense Ratio %": "0.15"
                },
                {
                    "Ticker": "PTTRX",
                    "Name": "PIMCO Total Return Fund",
                    "Vehicle": "Mutual Fund"
                }
            ]
        });

        let etfs = parse_performance_details(&json).unwrap();
        assert_eq!(etfs.len(), 2);

        let mint = &etfs[0];
        assert_eq!(mint.ticker, "MINT");
        assert_eq!(mint.inception_date, NaiveDate::from_ymd_opt(2009, 11, 16));
        assert_eq!(mint.expense_ratio, dec!(0.35));
        assert_eq!(mint.asset_class, "Unknown");

        let zroz = &etfs[1];
        assert_eq!(zroz.ticker, "ZROZ");
        assert_eq!(zroz.fund_name, "PIMCO 25+ Year Zero Coupon US Treasury ETF");
        assert_eq!(zroz.expense_ratio, dec!(0.15));
        assert_eq!(zroz.product_page_url, "https://www.pimco.com/us/en/investments/etf/zroz");
    }

    #[test]
    fn test_parse_performance_details_missing_data() {
        assert!(parse_performance_details(&json!({"asOfDate": "2024-01-01"})).is_err());
    }
}
