//! J.P. Morgan 크롤러.
//!
//! fund explorer API는 펀드 객체 배열을 반환합니다. 수익률과 SEC yield는
//! 비율(0.0528)로 오므로 백분율로 바꿔 저장합니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{iso_date, json_decimal, json_percent, json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://am.jpmorgan.com";
const PRODUCT_URL: &str = "https://am.jpmorgan.com/us/en/asset-management/adv/products/etfs";

pub struct JpMorganCrawler {
    client: Client,
    base_url: String,
}

impl JpMorganCrawler {
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
impl Crawler for JpMorganCrawler {
    fn provider_name(&self) -> &str {
        "jpmorgan"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let request = self
            .client
            .get(format!("{}/FundsMarketingHandler/fund-explorer", self.base_url))
            .query(&[
                ("country", "us"),
                ("role", "adv"),
                ("userLoggedIn", "false"),
                ("language", "en"),
                ("fundType", "etf"),
            ]);
        let json = read_json(request, "JPMorgan").await?;
        let etfs = parse_fund_explorer(&json)?;
        info!(provider = "jpmorgan", count = etfs.len(), "J.P. Morgan 파싱 완료");
        Ok(etfs)
    }
}

/// fund explorer 응답 파싱.
pub fn parse_fund_explorer(json: &Value) -> Result<Vec<Etf>> {
    let funds = json.as_array().ok_or_else(|| {
        DataError::ParseError("JPMorgan fund explorer root is not an array".to_string())
    })?;

    Ok(funds.iter().filter_map(parse_fund).collect())
}

fn parse_fund(fund: &Value) -> Option<Etf> {
    let ticker = json_text(fund, "ticker")?;
    let name = json_text(fund, "name").unwrap_or_default();
    let display_id = json_text(fund, "displayId").unwrap_or_else(|| ticker.to_lowercase());
    let url = format!("{}/{}", PRODUCT_URL, display_id);

    let mut etf = Etf::new(ticker, name, url).with_classification(
        json_text(fund, "assetClass").unwrap_or_else(|| "Unknown".to_string()),
        "North America",
        "Developed",
    );
    if let Some(cusip) = json_text(fund, "identifier") {
        etf.cusip = cusip;
    }
    etf.inception_date = json_text(fund, "fundInceptionDate").and_then(|d| iso_date(&d));
    if let Some(nav) = fund.get("nav").and_then(json_decimal) {
        etf.nav_amount = nav;
    }
    if let Some(as_of) = json_text(fund, "navDate").and_then(|d| iso_date(&d)) {
        etf.nav_as_of = as_of;
    }

    let performance = fund.get("atNavPerformanceReturn");
    let pct = |key: &str| performance.and_then(|p| p.get(key)).and_then(json_percent);
    etf.ytd_return = pct("ytd");
    etf.one_year_return = pct("yr1");
    etf.three_year_return = pct("yr3");
    etf.five_year_return = pct("yr5");
    etf.ten_year_return = pct("yr10");
    etf.since_inception_return = pct("inception");

    etf.distribution_yield = fund.get("secYield").and_then(json_percent);

    Some(etf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_fund_explorer() {
        let json = json!([
            {
                "name": "JPMorgan Equity Premium Income ETF",
                "displayId": "JEPI",
                "ticker": "JEPI",
                "identifier": "46641Q332",
                "assetClass": "U.S. Equity",
                "fundInceptionDate": "2020-05-20",
                "nav": 57.88329363,
                "navDate": "2025-11-28",
                "secYield": 0.0724,
                "atNavPerformanceReturn": {
                    "ytd": 0.0528,
                    "yr1": 0.0527,
                    "yr3": 0.1033,
                    "yr5": 0.1093,
                    "yr10": null,
                    "inception": 0.1147
                }
            },
            {
                "name": "JPMorgan BetaBuilders U.S. Equity ETF",
                "ticker": "BBUS",
                "nav": 108.52
            },
            {"name": "Missing ticker", "ticker": " "}
        ]);

        let etfs = parse_fund_explorer(&json).unwrap();
        assert_eq!(etfs.len(), 2);

        let jepi = &etfs[0];
        assert_eq!(jepi.cusip, "46641Q332");
        assert_eq!(jepi.inception_date, NaiveDate::from_ymd_opt(2020, 5, 20));
        assert_eq!(jepi.nav_amount, dec!(57.88329363));
        assert_eq!(jepi.nav_as_of, NaiveDate::from_ymd_opt(2025, 11, 28).unwrap());
        assert_eq!(jepi.ytd_return, Some(dec!(5.28)));
        assert_eq!(jepi.three_year_return, Some(dec!(10.33)));
        assert_eq!(jepi.ten_year_return, None);
        assert_eq!(jepi.since_inception_return, Some(dec!(11.47)));
        assert_eq!(jepi.distribution_yield, Some(dec!(7.24)));
        assert_eq!(jepi.expense_ratio, dec!(0));
        assert_eq!(jepi.asset_class, "U.S. Equity");
        assert_eq!(
            jepi.product_page_url,
            "https://am.jpmorgan.com/us/en/asset-management/adv/products/etfs/JEPI"
        );

        let bbus = &etfs[1];
        assert_eq!(bbus.asset_class, "Unknown");
        assert!(bbus.product_page_url.ends_with("/etfs/bbus"));
    }

    #[test]
    fn test_parse_fund_explorer_rejects_object() {
        assert!(parse_fund_explorer(&json!({"funds": []})).is_err());
    }
}
