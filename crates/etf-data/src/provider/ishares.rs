//! iShares 크롤러.
//!
//! 상품 스크리너 JSON은 portfolio ID를 키로 하는 객체이며 각 필드는
//! `{"d": 표시값, "r": 원시값}` 형태입니다. 수익률은 분기 NAV 기준을
//! 우선 사용하고 없으면 가격 기준으로 대체합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use etf_core::Etf;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info};

use super::{absolute_url, fetch_text, parse_decimal, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://www.ishares.com";
const SCREENER_PATH: &str = "/us/product-screener/product-screener-v3.1.jsn";
const SCREENER_CONFIG: &str = "/templatedata/config/product-screener-v3/data/en/us-ishares/ishares-product-screener-backend-config";

pub struct ISharesCrawler {
    client: Client,
    base_url: String,
}

impl ISharesCrawler {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn screener_url(&self) -> String {
        format!(
            "{}{}?dcrPath={}&siteEntryPassthrough=true",
            self.base_url.trim_end_matches('/'),
            SCREENER_PATH,
            SCREENER_CONFIG
        )
    }
}

#[async_trait]
impl Crawler for ISharesCrawler {
    fn provider_name(&self) -> &str {
        "ishares"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let body = fetch_text(&self.client, &self.screener_url()).await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| DataError::ParseError(format!("iShares screener JSON: {}", e)))?;

        let etfs = parse_screener(&json, &self.base_url)?;
        info!(provider = "ishares", count = etfs.len(), "iShares 파싱 완료");
        Ok(etfs)
    }
}

/// 스크리너 JSON을 ETF 목록으로 변환.
///
/// 티커, 펀드명, ISIN 중 하나라도 없는 항목은 건너뜁니다.
/// 결과는 portfolio ID 순으로 정렬됩니다.
pub fn parse_screener(json: &Value, base_url: &str) -> Result<Vec<Etf>> {
    let funds = json
        .as_object()
        .ok_or_else(|| DataError::ParseError("iShares screener root is not an object".to_string()))?;

    let mut entries: Vec<(&String, &Value)> = funds.iter().collect();
    entries.sort_by_key(|(id, _)| id.parse::<u64>().unwrap_or(u64::MAX));

    let mut etfs = Vec::with_capacity(entries.len());
    for (portfolio_id, fund) in entries {
        match parse_fund(fund, base_url) {
            Some(etf) => etfs.push(etf),
            None => debug!(portfolio_id = %portfolio_id, "필수 필드 누락, 건너뜀"),
        }
    }

    Ok(etfs)
}

fn parse_fund(fund: &Value, base_url: &str) -> Option<Etf> {
    let ticker = text_field(fund, "localExchangeTicker")?;
    let fund_name = text_field(fund, "fundName")?;
    let isin = text_field(fund, "isin")?;

    let product_page_url = text_field(fund, "productPageUrl")
        .map(|href| absolute_url(base_url, &href))
        .unwrap_or_default();

    let mut etf = Etf::new(ticker, fund_name, product_page_url);
    etf.isin = isin;
    if let Some(cusip) = text_field(fund, "cusip") {
        etf.cusip = cusip;
    }
    etf.inception_date = date_field(fund, "inceptionDate");
    if let Some(nav) = decimal_field(fund, "navAmount") {
        etf.nav_amount = nav;
    }
    if let Some(as_of) = date_field(fund, "navAmountAsOf") {
        etf.nav_as_of = as_of;
    }
    etf.expense_ratio = decimal_field(fund, "fees").unwrap_or(Decimal::ZERO);

    etf.ytd_return = nav_or_price(fund, "YearToDate");
    etf.one_year_return = nav_or_price(fund, "OneYearAnnualized");
    etf.three_year_return = nav_or_price(fund, "ThreeYearAnnualized");
    etf.five_year_return = nav_or_price(fund, "FiveYearAnnualized");
    etf.ten_year_return = nav_or_price(fund, "TenYearAnnualized");
    etf.since_inception_return = nav_or_price(fund, "SinceInceptionAnnualized");

    if let Some(asset_class) = text_field(fund, "aladdinAssetClass") {
        etf.asset_class = asset_class;
    }
    if let Some(region) = text_field(fund, "aladdinRegion") {
        etf.region = region;
    }
    if let Some(market_type) = text_field(fund, "aladdinMarketType") {
        etf.market_type = market_type;
    }
    etf.distribution_yield = decimal_field(fund, "distributionYield");

    Some(etf)
}

fn nav_or_price(fund: &Value, suffix: &str) -> Option<Decimal> {
    decimal_field(fund, &format!("quarterlyNav{}", suffix))
        .or_else(|| decimal_field(fund, &format!("price{}", suffix)))
}

/// 문자열 필드 또는 `{d: ...}` 객체의 표시값.
fn text_field(fund: &Value, name: &str) -> Option<String> {
    let value = fund.get(name)?;
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("d")?.as_str()?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty() && text != "-").then(|| text.to_string())
}

/// `{r: 원시값}` 객체 또는 숫자/문자열 값을 Decimal로 변환.
fn decimal_field(fund: &Value, name: &str) -> Option<Decimal> {
    let value = match fund.get(name)? {
        Value::Object(obj) => obj.get("r")?,
        other => other,
    };
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// `{d: "Oct 20, 2003"}` 형식 날짜.
fn date_field(fund: &Value, name: &str) -> Option<NaiveDate> {
    let text = text_field(fund, name)?;
    NaiveDate::parse_from_str(&text, "%b %d, %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "239726": {
                "localExchangeTicker": "IVV",
                "fundName": "iShares Core S&P 500 ETF",
                "isin": "US4642872000",
                "cusip": "464287200",
                "inceptionDate": {"d": "May 15, 2000", "r": 20000515},
                "navAmount": {"d": "601.12", "r": 601.12},
                "navAmountAsOf": {"d": "Nov 28, 2025", "r": 20251128},
                "fees": {"d": "0.03", "r": 0.03},
                "quarterlyNavYearToDate": {"d": "14.80", "r": 14.8},
                "priceYearToDate": {"d": "14.70", "r": 14.7},
                "priceOneYearAnnualized": {"d": "17.55", "r": 17.55},
                "aladdinAssetClass": "Equity",
                "aladdinRegion": "North America",
                "aladdinMarketType": "Developed",
                "distributionYield": {"d": "1.21", "r": 1.21},
                "productPageUrl": "/us/products/239726/ishares-core-sp-500-etf"
            },
            "239619": {
                "localExchangeTicker": "",
                "fundName": "No Ticker Fund",
                "isin": "US0000000000"
            },
            "239600": {
                "localExchangeTicker": "SOXX",
                "fundName": "iShares Semiconductor ETF",
                "isin": "US4642875235"
            }
        })
    }

    #[test]
    fn test_parse_screener_fields() {
        let etfs = parse_screener(&fixture(), "https://www.ishares.com").unwrap();
        assert_eq!(etfs.len(), 2);

        // portfolio ID 순 정렬
        assert_eq!(etfs[0].ticker, "SOXX");
        let ivv = &etfs[1];
        assert_eq!(ivv.ticker, "IVV");
        assert_eq!(ivv.cusip, "464287200");
        assert_eq!(ivv.inception_date, NaiveDate::from_ymd_opt(2000, 5, 15));
        assert_eq!(ivv.nav_amount, dec!(601.12));
        assert_eq!(ivv.nav_as_of, NaiveDate::from_ymd_opt(2025, 11, 28).unwrap());
        assert_eq!(ivv.expense_ratio, dec!(0.03));
        assert_eq!(ivv.distribution_yield, Some(dec!(1.21)));
        assert_eq!(ivv.asset_class, "Equity");
        assert_eq!(
            ivv.product_page_url,
            "https://www.ishares.com/us/products/239726/ishares-core-sp-500-etf"
        );
    }

    #[test]
    fn test_parse_screener_prefers_quarterly_nav_returns() {
        let etfs = parse_screener(&fixture(), "https://www.ishares.com").unwrap();
        let ivv = &etfs[1];
        assert_eq!(ivv.ytd_return, Some(dec!(14.8)));
        // 분기 NAV 값이 없으면 가격 기준
        assert_eq!(ivv.one_year_return, Some(dec!(17.55)));
        assert_eq!(ivv.ten_year_return, None);
    }

    #[test]
    fn test_parse_screener_rejects_non_object() {
        assert!(parse_screener(&json!([1, 2]), "").is_err());
    }
}
