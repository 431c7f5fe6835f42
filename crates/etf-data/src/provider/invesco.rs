//! Invesco 크롤러.
//!
//! 상품 검색 API(Solr)의 `response.docs[]`를 사용합니다. NAV는 제공되지 않으므로
//! 0으로 두고 Yahoo 보강 단계에서 채웁니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

use super::{iso_date, json_decimal, json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_API_URL: &str = "https://dng-api.invesco.com";
const SITE_URL: &str = "https://www.invesco.com";

const FILTERS: [&str; 8] = [
    r#"countryCode:"US""#,
    r#"language:"en_us""#,
    r#"accountType:"ETF""#,
    r#"contentType:"Product""#,
    r#"shareClassStatus:"open""#,
    r#"userRoles:"IndividualInvestor""#,
    "assetClass:[* TO *]",
    "assetSubClass:[* TO *]",
];
const FIELDS: &str = "url,ticker,title,accountName,isin,cusip,inceptionDate,totalExpenseRatio,assetClass,assetSubClass";

pub struct InvescoCrawler {
    client: Client,
    api_url: String,
}

impl InvescoCrawler {
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
impl Crawler for InvescoCrawler {
    fn provider_name(&self) -> &str {
        "invesco"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let mut query: Vec<(&str, &str)> = vec![
            ("q", "_suggest_:*"),
            ("fl", FIELDS),
            ("rows", "2000"),
            ("start", "0"),
            ("sort", "shareClassFullName asc"),
        ];
        query.extend(FILTERS.iter().map(|fq| ("fq", *fq)));

        let request = self
            .client
            .get(format!("{}/product/search", self.api_url))
            .query(&query);
        let json = read_json(request, "Invesco").await?;
        let etfs = parse_search(&json)?;
        info!(provider = "invesco", count = etfs.len(), "Invesco 파싱 완료");
        Ok(etfs)
    }
}

/// 검색 응답 파싱.
pub fn parse_search(json: &Value) -> Result<Vec<Etf>> {
    let docs = json
        .pointer("/response/docs")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::ParseError("Invesco response.docs is missing".to_string()))?;

    Ok(docs.iter().filter_map(parse_doc).collect())
}

fn parse_doc(doc: &Value) -> Option<Etf> {
    let ticker = json_text(doc, "ticker")?;
    let name = json_text(doc, "accountName")
        .or_else(|| json_text(doc, "title"))
        .unwrap_or_default();
    let url = match json_text(doc, "url") {
        Some(path) => format!("{}{}", SITE_URL, path),
        None => format!("{}/us/en/financial-products/etfs/{}", SITE_URL, ticker.to_lowercase()),
    };

    let expense_ratio = match doc.get("totalExpenseRatio") {
        Some(raw) => json_decimal(raw).unwrap_or_else(|| {
            warn!(ticker = %ticker, value = %raw, "보수율 파싱 실패");
            Decimal::ZERO
        }),
        None => Decimal::ZERO,
    };

    let mut etf = Etf::new(ticker, name, url)
        .with_classification(
            json_text(doc, "assetClass").unwrap_or_else(|| "Unknown".to_string()),
            "North America",
            "Developed",
        )
        .with_expense_ratio(expense_ratio);
    if let Some(isin) = json_text(doc, "isin") {
        etf.isin = isin;
    }
    if let Some(cusip) = json_text(doc, "cusip") {
        etf.cusip = cusip;
    }
    etf.inception_date = json_text(doc, "inceptionDate").and_then(|d| iso_date(&d));

    Some(etf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_search() {
        let json = json!({
            "response": {
                "numFound": 3,
                "docs": [
                    {
                        "url": "/content/invesco/us/en/financial-products/etfs/invesco-qqq-trust-series-1.html",
                        "title": "Invesco QQQ Trust Series 1",
                        "isin": "US46090E1038",
                        "cusip": "46090E103",
                        "accountName": "Invesco QQQ Trust Series 1",
                        "assetClass": "Equity",
                        "ticker": "QQQ",
                        "inceptionDate": "1999-03-10",
                        "totalExpenseRatio": "0.20"
                    },
                    {
                        "title": "Invesco DB Oil Fund",
                        "ticker": "DBO",
                        "totalExpenseRatio": "n/a"
                    },
                    {
                        "title": "No ticker",
                        "ticker": ""
                    }
                ]
            }
        });

        let etfs = parse_search(&json).unwrap();
        assert_eq!(etfs.len(), 2);

        let qqq = &etfs[0];
        assert_eq!(qqq.ticker, "QQQ");
        assert_eq!(qqq.isin, "US46090E1038");
        assert_eq!(qqq.cusip, "46090E103");
        assert_eq!(qqq.inception_date, NaiveDate::from_ymd_opt(1999, 3, 10));
        assert_eq!(qqq.expense_ratio, dec!(0.20));
        assert_eq!(qqq.asset_class, "Equity");
        assert_eq!(qqq.nav_amount, dec!(0));
        assert!(qqq.product_page_url.starts_with("https://www.invesco.com/content/invesco/"));

        // accountName이 없으면 title, 잘못된 보수율은 0
        let dbo = &etfs[1];
        assert_eq!(dbo.fund_name, "Invesco DB Oil Fund");
        assert_eq!(dbo.expense_ratio, dec!(0));
        assert_eq!(dbo.isin, "N/A");
        assert_eq!(
            dbo.product_page_url,
            "https://www.invesco.com/us/en/financial-products/etfs/dbo"
        );
    }

    #[test]
    fn test_parse_search_missing_docs() {
        assert!(parse_search(&json!({"responseHeader": {}})).is_err());
    }
}
