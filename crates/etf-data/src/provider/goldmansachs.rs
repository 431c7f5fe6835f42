//! Goldman Sachs 크롤러.
//!
//! `services/funds` GraphQL 엔드포인트에서 `fundType == "ETF"`인 펀드의
//! share class별 NAV, 연환산 수익률, 분배 주기를 가져옵니다.

use async_trait::async_trait;
use etf_core::{DistributionFrequency, Etf};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use super::{iso_date, json_decimal, json_text, read_json, Crawler};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://am.gs.com";
const PRODUCT_URL: &str = "https://am.gs.com/en-us/institutions/products";

const FUNDS_QUERY: &str = r#"
query getFunds($fundRequest: FundRequest) {
  fundData(fundRequest: $fundRequest) {
    funds {
      fundName
      fundType
      shareClasses {
        shareClassId
        ticker
        shareClassInceptionDate
        distributionFrequency
        dailyPerformance { nav { asAtDate value } }
        monthlyPerformance {
          asAtDate
          annualisedReturns1yr
          annualisedReturns3yr
          annualisedReturns5yr
          annualisedReturns10yr
          annualisedReturnsSinceIncept
        }
      }
    }
  }
}
"#;

pub struct GoldmanSachsCrawler {
    client: Client,
    base_url: String,
}

impl GoldmanSachsCrawler {
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
impl Crawler for GoldmanSachsCrawler {
    fn provider_name(&self) -> &str {
        "goldmansachs"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let payload = json!({
            "operationName": "getFunds",
            "variables": {
                "fundRequest": {
                    "country": "us",
                    "language": "en",
                    "audience": "institutions",
                    "disabledFunds": [],
                    "limit": 500,
                    "offset": 0,
                    "sortBy": "FN",
                    "sortOrder": "ASC",
                    "filterParam": {"searchText": ""}
                }
            },
            "query": FUNDS_QUERY
        });
        let request = self
            .client
            .post(format!("{}/services/funds", self.base_url))
            .json(&payload);
        let json = read_json(request, "Goldman Sachs").await?;
        let etfs = parse_fund_data(&json)?;
        info!(provider = "goldmansachs", count = etfs.len(), "Goldman Sachs 파싱 완료");
        Ok(etfs)
    }
}

/// GraphQL 응답 파싱.
pub fn parse_fund_data(json: &Value) -> Result<Vec<Etf>> {
    let funds = json
        .pointer("/data/fundData/funds")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DataError::ParseError("Goldman Sachs data.fundData.funds is missing".to_string())
        })?;

    let mut etfs = Vec::new();
    for fund in funds {
        if fund.get("fundType").and_then(Value::as_str) != Some("ETF") {
            continue;
        }
        let name = json_text(fund, "fundName").unwrap_or_default();
        let share_classes = fund.get("shareClasses").and_then(Value::as_array);
        etfs.extend(
            share_classes
                .into_iter()
                .flatten()
                .filter_map(|share_class| parse_share_class(share_class, &name)),
        );
    }

    Ok(etfs)
}

fn parse_share_class(share_class: &Value, fund_name: &str) -> Option<Etf> {
    let ticker = json_text(share_class, "ticker")?;
    let url = format!("{}/{}", PRODUCT_URL, ticker);

    let mut etf = Etf::new(ticker, fund_name, url).with_classification("Unknown", "US", "ETF");
    etf.inception_date = json_text(share_class, "shareClassInceptionDate").and_then(|d| iso_date(&d));

    if let Some(nav) = share_class.pointer("/dailyPerformance/nav") {
        if let Some(amount) = nav.get("value").and_then(json_decimal) {
            etf.nav_amount = amount;
        }
        if let Some(as_of) = json_text(nav, "asAtDate").and_then(|d| iso_date(&d)) {
            etf.nav_as_of = as_of;
        }
    }

    let monthly = share_class.get("monthlyPerformance");
    let pct = |key: &str| monthly.and_then(|m| m.get(key)).and_then(json_decimal);
    etf.one_year_return = pct("annualisedReturns1yr");
    etf.three_year_return = pct("annualisedReturns3yr");
    etf.five_year_return = pct("annualisedReturns5yr");
    etf.ten_year_return = pct("annualisedReturns10yr");
    etf.since_inception_return = pct("annualisedReturnsSinceIncept");

    etf.distribution_frequency = json_text(share_class, "distributionFrequency")
        .map(|text| DistributionFrequency::parse_lenient(&text))
        .unwrap_or(DistributionFrequency::Unknown);

    Some(etf)
}
