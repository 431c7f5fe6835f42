//! HTML 목록 페이지 공용 파서.
//!
//! 상세 페이지 링크(`/etf/<ticker>` 등)에서 티커를 뽑는 운용사와
//! `<script>` 안에 펀드 JSON을 심어 두는 운용사가 함께 사용합니다.

use chrono::NaiveDate;
use etf_core::Etf;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::Html;
use serde_json::Value;
use std::collections::HashSet;

use super::{absolute_url, json_decimal, parse_date_any, selector};
use crate::error::Result;

/// 스크립트 안의 객체 배열 리터럴 (`[{...}, {...}]`).
static JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*\{[^\]]+\}\s*\]").expect("json array pattern is valid"));

/// 중첩 없는 객체 중 `"ticker"` 키를 가진 것.
static TICKER_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\{[^{}]*"ticker"[^{}]*\}"#).expect("ticker object pattern is valid")
});

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d"];

/// 정규식 첫 캡처 그룹을 티커로 하는 링크 수집.
///
/// 티커는 대문자로 바꾸고 `skip`에 있으면 버립니다. 같은 티커는 처음 링크만 쓰며
/// 펀드명은 링크 텍스트, title 속성, 티커 순으로 고릅니다.
pub(crate) fn ticker_links(
    html: &str,
    base_url: &str,
    pattern: &Regex,
    skip: &[&str],
) -> Result<Vec<Etf>> {
    let document = Html::parse_document(html);
    let links = selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut etfs = Vec::new();
    for link in document.select(&links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(ticker) = pattern
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_uppercase())
        else {
            continue;
        };
        if skip.contains(&ticker.as_str()) || !seen.insert(ticker.clone()) {
            continue;
        }

        let text = link.text().collect::<String>().trim().to_string();
        let title = link.value().attr("title").unwrap_or("").trim().to_string();
        let fund_name = [text, title]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| ticker.clone());

        etfs.push(Etf::new(ticker, fund_name, absolute_url(base_url, href)));
    }

    Ok(etfs)
}

/// `<script>`에 심어진 펀드 레코드.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EmbeddedFund {
    pub ticker: String,
    pub name: String,
    pub inception_date: Option<NaiveDate>,
    pub nav: Option<Decimal>,
    pub expense_ratio: Option<Decimal>,
}

impl EmbeddedFund {
    fn from_json(item: &Value) -> Option<Self> {
        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| item.get(*key)?.as_str())
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |keys: &[&str]| keys.iter().find_map(|key| item.get(*key).and_then(json_decimal));

        Some(Self {
            ticker: text(&["ticker", "symbol", "Symbol"])?.to_uppercase(),
            name: text(&["name", "fundName", "Name"])?,
            inception_date: text(&["inceptionDate", "InceptionDate", "inception"])
                .and_then(|d| parse_date_any(&d, &DATE_FORMATS)),
            nav: number(&["nav", "NAV", "price"]),
            expense_ratio: number(&["expenseRatio", "ExpenseRatio", "expense"]),
        })
    }

    pub fn into_etf(self, product_page_url: impl Into<String>) -> Etf {
        let mut etf = Etf::new(self.ticker, self.name, product_page_url);
        etf.inception_date = self.inception_date;
        if let Some(nav) = self.nav {
            etf.nav_amount = nav;
        }
        if let Some(expense_ratio) = self.expense_ratio {
            etf.expense_ratio = expense_ratio;
        }
        etf
    }
}

/// 스크립트에 심어진 펀드 레코드 추출.
///
/// "etf"를 언급하는 스크립트에서 객체 배열을 먼저 찾고, 티커/심볼/펀드 키가
/// 보이는 첫 배열을 사용합니다. 배열이 없으면 `"ticker"` 키를 가진 단일 객체를 모읍니다.
/// 티커나 이름이 없는 레코드는 버립니다.
pub(crate) fn embedded_funds(html: &str) -> Result<Vec<EmbeddedFund>> {
    let document = Html::parse_document(html);
    let scripts = selector("script")?;

    let sources: Vec<String> = document
        .select(&scripts)
        .map(|script| script.text().collect::<String>())
        .filter(|source| source.to_lowercase().contains("etf"))
        .collect();

    for source in &sources {
        for candidate in JSON_ARRAY.find_iter(source) {
            let Ok(Value::Array(items)) = serde_json::from_str::<Value>(candidate.as_str()) else {
                continue;
            };
            if !looks_like_funds(&items) {
                continue;
            }
            let funds: Vec<EmbeddedFund> = items.iter().filter_map(EmbeddedFund::from_json).collect();
            if !funds.is_empty() {
                return Ok(funds);
            }
        }
    }

    Ok(sources
        .iter()
        .flat_map(|source| TICKER_OBJECT.find_iter(source))
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter_map(|item| EmbeddedFund::from_json(&item))
        .collect())
}

fn looks_like_funds(items: &[Value]) -> bool {
    let Some(Value::Object(first)) = items.first() else {
        return false;
    };
    first.keys().any(|key| {
        let key = key.to_lowercase();
        key.contains("symbol") || key.contains("ticker") || key.contains("fund")
    })
}
