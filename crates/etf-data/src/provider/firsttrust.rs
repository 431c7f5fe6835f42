//! First Trust 크롤러.
//!
//! ETF 목록 페이지의 표 중 첫 행에 ticker, fund, inception 열이 모두 있는 표만
//! 파싱합니다. 열 위치는 헤더 텍스트로 찾으며 값이 없는 칸은 `-------`로 표시됩니다.

use async_trait::async_trait;
use etf_core::Etf;
use reqwest::Client;
use scraper::{ElementRef, Html};
use tracing::info;

use super::{absolute_url, fetch_text, parse_date_any, parse_decimal, selector, Crawler};
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.ftportfolios.com";
const LIST_PATH: &str = "/Retail/etf/etflist.aspx";
const EMPTY_CELL: &str = "-------";

pub struct FirstTrustCrawler {
    client: Client,
    base_url: String,
}

impl FirstTrustCrawler {
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
impl Crawler for FirstTrustCrawler {
    fn provider_name(&self) -> &str {
        "firsttrust"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let html = fetch_text(&self.client, &format!("{}{}", self.base_url, LIST_PATH)).await?;
        let etfs = parse_etf_list(&html, &self.base_url)?;
        info!(provider = "firsttrust", count = etfs.len(), "First Trust 파싱 완료");
        Ok(etfs)
    }
}

/// 헤더 행으로 찾은 열 위치.
struct Columns {
    ticker: usize,
    name: usize,
    inception: usize,
    nav: Option<usize>,
    sec_yield: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Option<Self> {
        let find = |needle: &str| {
            headers
                .iter()
                .position(|h| h.to_lowercase().contains(needle))
        };
        Some(Self {
            ticker: find("ticker")?,
            name: find("fund")?,
            inception: find("inception")?,
            nav: find("nav"),
            sec_yield: find("sec yield"),
        })
    }
}

/// ETF 목록 페이지 파싱.
pub fn parse_etf_list(html: &str, base_url: &str) -> Result<Vec<Etf>> {
    let document = Html::parse_document(html);
    let tables = selector("table")?;
    let rows = selector("tr")?;
    let cells = selector("td, th")?;
    let links = selector("a[href]")?;

    let mut etfs = Vec::new();
    for table in document.select(&tables) {
        let mut table_rows = table.select(&rows);
        let Some(header_row) = table_rows.next() else {
            continue;
        };
        let headers: Vec<String> = header_row.select(&cells).map(cell_text).collect();
        let Some(columns) = Columns::from_headers(&headers) else {
            continue;
        };

        for row in table_rows {
            let row_cells: Vec<ElementRef> = row.select(&cells).collect();
            if row_cells.len() < 3 {
                continue;
            }
            let text = |idx: usize| row_cells.get(idx).map(|c| cell_text(*c)).unwrap_or_default();
            let value = |idx: Option<usize>| {
                idx.map(text)
                    .filter(|t| !t.is_empty() && t != EMPTY_CELL)
            };

            let ticker = text(columns.ticker);
            let name = text(columns.name);
            if ticker.is_empty() || name.is_empty() || ticker == "TickerSymbol" {
                continue;
            }

            let url = row_cells
                .get(columns.ticker)
                .and_then(|cell| cell.select(&links).next())
                .and_then(|link| link.value().attr("href"))
                .map(|href| absolute_url(base_url, href))
                .unwrap_or_else(|| format!("{}{}", base_url, LIST_PATH));

            let mut etf = Etf::new(ticker, name, url);
            etf.inception_date = value(Some(columns.inception))
                .and_then(|d| parse_date_any(&d, &["%m/%d/%y", "%m/%d/%Y"]));
            if let Some(nav) = value(columns.nav).and_then(|t| parse_decimal(&t)) {
                etf.nav_amount = nav;
            }
            etf.distribution_yield = value(columns.sec_yield)
                .and_then(|t| parse_decimal(&t))
                .map(|v| v.round_dp(2));
            etfs.push(etf);
        }
    }

    Ok(etfs)
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        <table><tr><td>Search</td><td>Go</td></tr></table>
        <table>
            <tr>
                <td>Fund Name</td>
                <td>TickerSymbol</td>
                <td>InceptionDate</td>
                <td>CloseNAV</td>
                <td>30-DaySEC Yield1</td>
                <td>YieldAs OfDate</td>
            </tr>
            <tr>
                <td>First Trust Alternative Absolute Return Strategy ETF</td>
                <td><a href="/Retail/etf/etfsummary.aspx?Ticker=FAAR">FAAR</a></td>
                <td>05/18/16</td>
                <td>$30.12</td>
                <td>2.31%</td>
                <td>10/31/25</td>
            </tr>
            <tr>
                <td>First Trust Cloud Computing ETF</td>
                <td><a href="/Retail/etf/etfsummary.aspx?Ticker=SKYY">SKYY</a></td>
                <td>07/05/11</td>
                <td>$127.79</td>
                <td>-------</td>
                <td>10/31/25</td>
            </tr>
            <tr><td colspan="6">Footnotes</td></tr>
        </table>
    "#;

    #[test]
    fn test_parse_etf_list() {
        let etfs = parse_etf_list(SAMPLE, "https://www.ftportfolios.com").unwrap();
        assert_eq!(etfs.len(), 2);

        let faar = &etfs[0];
        assert_eq!(faar.ticker, "FAAR");
        assert_eq!(faar.fund_name, "First Trust Alternative Absolute Return Strategy ETF");
        assert_eq!(faar.inception_date, NaiveDate::from_ymd_opt(2016, 5, 18));
        assert_eq!(faar.nav_amount, dec!(30.12));
        assert_eq!(faar.distribution_yield, Some(dec!(2.31)));
        assert_eq!(
            faar.product_page_url,
            "https://www.ftportfolios.com/Retail/etf/etfsummary.aspx?Ticker=FAAR"
        );

        let skyy = &etfs[1];
        assert_eq!(skyy.inception_date, NaiveDate::from_ymd_opt(2011, 7, 5));
        assert_eq!(skyy.distribution_yield, None);
    }

    #[test]
    fn test_parse_etf_list_without_etf_table() {
        let etfs = parse_etf_list("<table><tr><td>Name</td></tr></table>", "").unwrap();
        assert!(etfs.is_empty());
    }
}
