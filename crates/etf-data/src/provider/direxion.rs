//! Direxion 크롤러.
//!
//! 상품 페이지가 스크립트로 렌더링되어 HTML 파싱이 어려우므로
//! 주요 레버리지/인버스 ETF를 큐레이션한 목록을 사용합니다.

use async_trait::async_trait;
use etf_core::Etf;
use tracing::info;

use super::Crawler;
use crate::error::Result;

const DEFAULT_BASE_URL: &str = "https://www.direxion.com";

/// (티커, 펀드명)
const CURATED_ETFS: &[(&str, &str)] = &[
    // Bull 3X
    ("TQQQ", "Direxion Daily NASDAQ-100 Bull 3X Shares"),
    ("SOXL", "Direxion Daily Semiconductor Bull 3X Shares"),
    ("SPXL", "Direxion Daily S&P 500 Bull 3X Shares"),
    ("TNA", "Direxion Daily Small Cap Bull 3X Shares"),
    ("TECL", "Direxion Daily Technology Bull 3X Shares"),
    ("CURE", "Direxion Daily Healthcare Bull 3X Shares"),
    ("DPST", "Direxion Daily Regional Banks Bull 3X Shares"),
    ("FAS", "Direxion Daily Financial Bull 3X Shares"),
    ("LABU", "Direxion Daily S&P Biotech Bull 3X Shares"),
    ("NAIL", "Direxion Daily Homebuilders & Supplies Bull 3X Shares"),
    ("WANT", "Direxion Daily Consumer Discretionary Bull 3X Shares"),
    ("UTSL", "Direxion Daily Utilities Bull 3X Shares"),
    ("ERX", "Direxion Daily Energy Bull 2X Shares"),
    ("RETL", "Direxion Daily Retail Bull 3X Shares"),
    ("DFEN", "Direxion Daily Aerospace & Defense Bull 3X Shares"),
    ("PILL", "Direxion Daily Pharmaceutical & Medical Bull 3X Shares"),
    ("HIBL", "Direxion Daily S&P 500 High Beta Bull 3X Shares"),
    ("DUSL", "Direxion Daily Industrials Bull 3X Shares"),
    // Bear 3X
    ("SQQQ", "Direxion Daily NASDAQ-100 Bear 3X Shares"),
    ("SOXS", "Direxion Daily Semiconductor Bear 3X Shares"),
    ("SPXS", "Direxion Daily S&P 500 Bear 3X Shares"),
    ("TZA", "Direxion Daily Small Cap Bear 3X Shares"),
    ("TECS", "Direxion Daily Technology Bear 3X Shares"),
    ("FAZ", "Direxion Daily Financial Bear 3X Shares"),
    ("LABD", "Direxion Daily S&P Biotech Bear 3X Shares"),
    ("DRV", "Direxion Daily Real Estate Bear 3X Shares"),
    ("SPDN", "Direxion Daily S&P 500 Bear 1X Shares"),
    // 개별 종목
    ("NVDU", "Direxion Daily NVDA Bull 2X Shares"),
    ("NVDD", "Direxion Daily NVDA Bear 1X Shares"),
    ("TSLL", "Direxion Daily TSLA Bull 2X Shares"),
    ("TSLQ", "Direxion Daily TSLA Bear 1X Shares"),
    ("GOOU", "Direxion Daily GOOGL Bull 2X Shares"),
    ("GOOD", "Direxion Daily GOOGL Bear 1X Shares"),
    ("AAPU", "Direxion Daily AAPL Bull 2X Shares"),
    ("APLY", "Direxion Daily AAPL Bear 1X Shares"),
    ("AMZU", "Direxion Daily AMZN Bull 2X Shares"),
    ("AMZD", "Direxion Daily AMZN Bear 1X Shares"),
    ("MSFU", "Direxion Daily MSFT Bull 2X Shares"),
    ("MSFD", "Direxion Daily MSFT Bear 1X Shares"),
    ("NFLU", "Direxion Daily NFLX Bull 2X Shares"),
    ("NFLD", "Direxion Daily NFLX Bear 1X Shares"),
    // 금광
    ("JNUG", "Direxion Daily Junior Gold Miners Index Bull 2X Shares"),
    ("JDST", "Direxion Daily Junior Gold Miners Index Bear 2X Shares"),
    ("NUGT", "Direxion Daily Gold Miners Index Bull 2X Shares"),
    ("DUST", "Direxion Daily Gold Miners Index Bear 2X Shares"),
    ("GDXU", "Direxion Daily Gold Miners Index Bull 1.25X Shares"),
    ("GDXD", "Direxion Daily Gold Miners Index Bear 1X Shares"),
    // 해외
    ("YINN", "Direxion Daily FTSE China Bull 3X Shares"),
    ("YANG", "Direxion Daily FTSE China Bear 3X Shares"),
    ("BRZU", "Direxion Daily MSCI Brazil Bull 2X Shares"),
    ("MEXX", "Direxion Daily MSCI Mexico Bull 3X Shares"),
];

pub struct DirexionCrawler {
    base_url: String,
}

impl DirexionCrawler {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// 큐레이션 목록을 ETF 레코드로 변환.
    pub fn curated(&self) -> Vec<Etf> {
        CURATED_ETFS
            .iter()
            .map(|(ticker, name)| {
                let url = format!("{}/product/{}", self.base_url, ticker.to_lowercase());
                Etf::new(*ticker, *name, url).with_classification("Leveraged/Inverse", "US", "ETF")
            })
            .collect()
    }
}

impl Default for DirexionCrawler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Crawler for DirexionCrawler {
    fn provider_name(&self) -> &str {
        "direxion"
    }

    async fn crawl(&self) -> Result<Vec<Etf>> {
        let etfs = self.curated();
        info!(provider = "direxion", count = etfs.len(), "Direxion 목록 로드");
        Ok(etfs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_curated_list_is_unique() {
        let etfs = DirexionCrawler::new().curated();
        let tickers: HashSet<&str> = etfs.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers.len(), etfs.len());
    }

    #[tokio::test]
    async fn test_crawl_returns_classified_records() {
        let etfs = DirexionCrawler::new().crawl().await.unwrap();
        let tqqq = etfs.iter().find(|e| e.ticker == "TQQQ").unwrap();
        assert_eq!(tqqq.asset_class, "Leveraged/Inverse");
        assert_eq!(tqqq.product_page_url, "https://www.direxion.com/product/tqqq");
    }
}
