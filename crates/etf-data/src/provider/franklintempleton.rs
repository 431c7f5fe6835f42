//! Franklin Templeton 크롤러.
//!
//! price-and-performance GraphQL 엔드포인트에 펀드명과 share class 티커만 요청합니다.
//! 한 펀드에 share class가 여럿이면 티커마다 레코드를 만듭니다.

use async_trait::async_trait;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use super::{json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://www.franklintempleton.com";
const LISTING_URL: &str =
    "https://www.franklintempleton.com/investments/options/exchange-traded-funds";

const PPSS_QUERY: &str = r#"
query UsPpss($countrycode: String!, $languagecode: String!, $productType: String!) {
  PPSS(countrycode: $countrycode, languagecode: $languagecode, productType: $productType) {
    fundid
    fundname
    shareclass { identifiers { ticker } }
  }
}
"#;

static TICKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,5}$").expect("ticker pattern is valid"));

pub struct FranklinTempletonCrawler {
    client: Client,
    base_url: String,
}

impl FranklinTempletonCrawler {
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
impl Crawler for FranklinTempletonCrawler {
    fn provider_name(&self) -> &str {
        "franklintempleton"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let payload = json!({
            "query": PPSS_QUERY,
            "variables": {
                "countrycode": "US",
                "productType": "etf",
                "languagecode": "en_US"
            },
            "operationName": "UsPpss"
        });
        let request = self
            .client
            .post(format!("{}/api/pds/price-and-performance", self.base_url))
            .query(&[("op", "UsPpss"), ("pt", "etf"), ("id", "1")])
            .header("origin", DEFAULT_BASE_URL)
            .header("referer", LISTING_URL)
            .json(&payload);
        let json = read_json(request, "Franklin Templeton").await?;
        let etfs = parse_ppss(&json)?;
        info!(provider = "franklintempleton", count = etfs.len(), "Franklin Templeton 파싱 완료");
        Ok(etfs)
    }
}

/// GraphQL 응답 파싱.
///
/// 펀드명이 없거나 티커가 대문자 1~5자가 아닌 share class는 건너뜁니다.
pub fn parse_ppss(json: &Value) -> Result<Vec<Etf>> {
    let funds = json
        .pointer("/data/PPSS")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::ParseError("Franklin Templeton data.PPSS is missing".to_string()))?;

    let mut etfs = Vec::new();
    for fund in funds {
        let Some(name) = json_text(fund, "fundname") else {
            continue;
        };
        let share_classes = fund.get("shareclass").and_then(Value::as_array);
        for share_class in share_classes.into_iter().flatten() {
            let Some(ticker) = share_class
                .get("identifiers")
                .and_then(|ids| json_text(ids, "ticker"))
                .filter(|t| TICKER.is_match(t))
            else {
                continue;
            };
            etfs.push(Etf::new(ticker, name.clone(), LISTING_URL));
        }
    }

    Ok(etfs)
}
