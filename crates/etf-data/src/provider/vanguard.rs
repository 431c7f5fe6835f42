//! Vanguard 크롤러.
//!
//! 펀드 목록 JSON(`fund.entity[]`)에는 ETF와 뮤추얼 펀드가 섞여 있으므로
//! `profile.isETF`가 참인 항목만 사용합니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::{iso_date, json_decimal, json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_API_URL: &str =
    "https://investor.vanguard.com/investment-products/list/funddetail/all";
const PROFILE_URL: &str = "https://investor.vanguard.com/investment-products/etfs/profile";

pub struct VanguardCrawler {
    client: Client,
    api_url: String,
}

impl VanguardCrawler {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: format!(
                "{}/investment-products/list/funddetail/all",
                base_url.into().trim_end_matches('/')
            ),
        }
    }
}

#[async_trait]
impl Crawler for VanguardCrawler {
    fn provider_name(&self) -> &str {
        "vanguard"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let json = read_json(self.client.get(&self.api_url), "Vanguard").await?;
        let etfs = parse_fund_list(&json)?;
        info!(provider = "vanguard", count = etfs.len(), "Vanguard 파싱 완료");
        Ok(etfs)
    }
}

/// 펀드 목록 JSON 파싱.
pub fn parse_fund_list(json: &Value) -> Result<Vec<Etf>> {
    let entities = json
        .pointer("/fund/entity")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::ParseError("Vanguard fund.entity is missing".to_string()))?;

    Ok(entities.iter().filter_map(parse_entity).collect())
}

fn parse_entity(entity: &Value) -> Option<Etf> {
    let profile = entity.get("profile")?;
    if !profile.get("isETF").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }

    let ticker = json_text(profile, "ticker")?;
    let name = json_text(profile, "longName")
        .or_else(|| json_text(profile, "shortName"))
        .unwrap_or_default();
    let url = format!("{}/{}", PROFILE_URL, ticker.to_lowercase());

    let mut etf = Etf::new(ticker, name, url).with_classification(
        json_text(profile, "style").unwrap_or_else(|| "Unknown".to_string()),
        "North America",
        "Developed",
    );
    if let Some(cusip) = json_text(profile, "cusip") {
        etf.cusip = cusip;
    }
    etf.inception_date = json_text(profile, "inceptionDate").and_then(|d| iso_date(&d));
    etf.expense_ratio = profile
        .get("expenseRatio")
        .and_then(json_decimal)
        .unwrap_or_default();

    if let Some(price) = entity.pointer("/dailyPrice/regular") {
        if let Some(nav) = price.get("price").and_then(json_decimal) {
            etf.nav_amount = nav;
        }
        if let Some(as_of) = json_text(price, "asOfDate").and_then(|d| iso_date(&d)) {
            etf.nav_as_of = as_of;
        }
    }

    let returns = entity.pointer("/monthEndAvgAnnualRtn/fundReturn");
    let pct = |key: &str| returns.and_then(|r| r.get(key)).and_then(json_decimal);
    etf.one_year_return = pct("oneYearPct");
    etf.three_year_return = pct("threeYearPct");
    etf.five_year_return = pct("fiveYearPct");
    etf.ten_year_return = pct("tenYearPct");
    etf.since_inception_return = pct("sinceInceptionPct");

    etf.distribution_yield = entity.pointer("/yield/yieldPct").and_then(json_decimal);

    Some(etf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "fund": {
                "entity": [
                    {
                        "profile": {
                            "ticker": "VOO",
                            "longName": "Vanguard S&P 500 ETF",
                            "shortName": "S&P 500 ETF",
                            "cusip": "922908363",
                            "inceptionDate": "2010-09-07T00:00:00-04:00",
                            "expenseRatio": "0.0300",
                            "isETF": true,
                            "style": "Stock - Large-Cap Blend"
                        },
                        "dailyPrice": {
                            "regular": {"price": "575.26", "asOfDate": "2025-11-28T00:00:00-05:00"}
                        },
                        "monthEndAvgAnnualRtn": {
                            "fundReturn": {
                                "oneYearPct": "17.61",
                                "threeYearPct": "22.66",
                                "fiveYearPct": "15.57",
                                "tenYearPct": "14.59",
                                "sinceInceptionPct": "14.93"
                            }
                        },
                        "yield": {"yieldPct": "1.14"}
                    },
                    {
                        "profile": {"ticker": "VFIAX", "longName": "500 Index Admiral", "isETF": false}
                    },
                    {
                        "profile": {"ticker": "", "shortName": "No ticker", "isETF": true}
                    },
                    {
                        "profile": {"ticker": "VXUS", "shortName": "Total Intl Stock ETF", "isETF": true}
                    }
                ]
            }
        })
    }

    #[test]
    fn test_parse_fund_list() {
        let etfs = parse_fund_list(&fixture()).unwrap();
        assert_eq!(etfs.len(), 2);

        let voo = &etfs[0];
        assert_eq!(voo.ticker, "VOO");
        assert_eq!(voo.fund_name, "Vanguard S&P 500 ETF");
        assert_eq!(voo.cusip, "922908363");
        assert_eq!(voo.inception_date, NaiveDate::from_ymd_opt(2010, 9, 7));
        assert_eq!(voo.nav_amount, dec!(575.26));
        assert_eq!(voo.nav_as_of, NaiveDate::from_ymd_opt(2025, 11, 28).unwrap());
        assert_eq!(voo.expense_ratio, dec!(0.03));
        assert_eq!(voo.ytd_return, None);
        assert_eq!(voo.one_year_return, Some(dec!(17.61)));
        assert_eq!(voo.since_inception_return, Some(dec!(14.93)));
        assert_eq!(voo.distribution_yield, Some(dec!(1.14)));
        assert_eq!(voo.asset_class, "Stock - Large-Cap Blend");
        assert_eq!(voo.region, "North America");
        assert_eq!(
            voo.product_page_url,
            "https://investor.vanguard.com/investment-products/etfs/profile/voo"
        );
    }

    #[test]
    fn test_parse_fund_list_short_name_and_defaults() {
        let etfs = parse_fund_list(&fixture()).unwrap();
        let vxus = &etfs[1];
        assert_eq!(vxus.fund_name, "Total Intl Stock ETF");
        assert_eq!(vxus.asset_class, "Unknown");
        assert_eq!(vxus.nav_amount, dec!(0));
        assert!(vxus.distribution_yield.is_none());
    }

    #[test]
    fn test_parse_fund_list_requires_entity_array() {
        assert!(parse_fund_list(&json!({"fund": {}})).is_err());
    }
}
