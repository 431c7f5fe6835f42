//! 크롤러 HTTP 통합 테스트 (mockito).

use etf_core::CrawlerConfig;
use etf_data::provider::{
    build_http_client, Crawler, DimensionalCrawler, GlobalXCrawler, GoldmanSachsCrawler,
    GraniteSharesCrawler, ISharesCrawler, PacerCrawler, RoundhillCrawler, VanguardCrawler,
};
use etf_data::DataError;
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;

fn client() -> reqwest::Client {
    build_http_client(&CrawlerConfig::default()).unwrap()
}

#[tokio::test]
async fn test_ishares_crawl() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/us/product-screener/product-screener-v3.1.jsn")
        .match_query(mockito::Matcher::UrlEncoded(
            "siteEntryPassthrough".into(),
            "true".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "239710": {
                    "localExchangeTicker": "AGG",
                    "fundName": "iShares Core US Aggregate Bond ETF",
                    "isin": "US4642872265",
                    "fees": {"d": "0.03", "r": 0.03},
                    "aladdinAssetClass": "Fixed Income",
                    "productPageUrl": "/us/products/239458/agg"
                }
            }"#,
        )
        .create_async()
        .await;

    let crawler = ISharesCrawler::with_base_url(client(), server.url());
    let etfs = crawler.crawl().await.unwrap();

    mock.assert_async().await;
    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].ticker, "AGG");
    assert_eq!(etfs[0].asset_class, "Fixed Income");
    assert_eq!(etfs[0].product_page_url, format!("{}/us/products/239458/agg", server.url()));
}

#[tokio::test]
async fn test_ishares_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let crawler = ISharesCrawler::with_base_url(client(), server.url());
    let err = crawler.crawl().await.unwrap_err();
    assert!(matches!(err, DataError::Http(_)), "{:?}", err);
}

#[tokio::test]
async fn test_roundhill_crawl_skips_failed_details() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/etf")
        .with_status(200)
        .with_body(r#"<a href="/etf/METV/">METV</a><a href="/etf/NERD/">NERD</a>"#)
        .create_async()
        .await;
    server
        .mock("GET", "/etf/metv/")
        .with_status(200)
        .with_body("<h1>METV Roundhill Ball Metaverse ETF</h1><p>Expense Ratio: 0.59%</p>")
        .create_async()
        .await;
    server
        .mock("GET", "/etf/nerd/")
        .with_status(404)
        .create_async()
        .await;

    let crawler =
        RoundhillCrawler::with_base_url(client(), server.url()).with_delay(Duration::ZERO);
    let etfs = crawler.crawl().await.unwrap();

    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].ticker, "METV");
    assert_eq!(etfs[0].fund_name, "Roundhill Ball Metaverse ETF");
    assert_eq!(etfs[0].expense_ratio, dec!(0.59));
}

#[tokio::test]
async fn test_globalx_and_graniteshares_crawl() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/explore")
        .with_status(200)
        .with_body(r#"<a href="/funds/qyld/">Nasdaq 100 Covered Call ETF</a>"#)
        .create_async()
        .await;
    server
        .mock("GET", "/institutional/us/en-us/etfs/")
        .with_status(200)
        .with_body(r#"<a href="/institutional/us/en-us/etf/BAR/">GraniteShares Gold Trust</a>"#)
        .create_async()
        .await;

    let globalx = GlobalXCrawler::with_base_url(client(), server.url());
    let etfs = globalx.crawl().await.unwrap();
    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].ticker, "QYLD");

    let granite = GraniteSharesCrawler::with_base_url(client(), server.url());
    let etfs = granite.crawl().await.unwrap();
    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].ticker, "BAR");
    assert_eq!(etfs[0].fund_name, "GraniteShares Gold Trust");
}

#[tokio::test]
async fn test_vanguard_crawl_keeps_only_etfs() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/investment-products/list/funddetail/all")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "fund": {
                    "entity": [
                        {"profile": {"ticker": "VTI", "longName": "Vanguard Total Stock Market ETF", "isETF": true},
                         "dailyPrice": {"regular": {"price": "330.10", "asOfDate": "2025-11-28T00:00:00-05:00"}}},
                        {"profile": {"ticker": "VTSAX", "longName": "Total Stock Mkt Idx Adm", "isETF": false}}
                    ]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let crawler = VanguardCrawler::with_base_url(client(), server.url());
    let etfs = crawler.crawl().await.unwrap();
    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].ticker, "VTI");
    assert_eq!(etfs[0].nav_amount, dec!(330.10));
}

#[tokio::test]
async fn test_dimensional_crawl_sends_country_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/public/v2/fundcenter")
        .match_query(mockito::Matcher::UrlEncoded(
            "allowMorningstarFixedIncome".into(),
            "true".into(),
        ))
        .match_header("x-selected-country", "US")
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "portfolios": [{
                        "meta": {
                            "marketingName": "US Marketwide Value ETF",
                            "identifiers": [{"slug": "ticker", "value": "DFUV"}],
                            "isEtf": true
                        },
                        "fees": [{"slug": "net-exp-ratio", "value": {"value": 0.0021}}]
                    }]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let crawler = DimensionalCrawler::with_base_url(client(), server.url());
    let etfs = crawler.crawl().await.unwrap();

    mock.assert_async().await;
    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].fund_name, "Dimensional US Marketwide Value ETF");
    assert_eq!(etfs[0].expense_ratio, dec!(0.21));
}

#[tokio::test]
async fn test_goldmansachs_crawl_posts_graphql_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/services/funds")
        .match_body(mockito::Matcher::PartialJson(json!({
            "operationName": "getFunds",
            "variables": {"fundRequest": {"country": "us", "limit": 500}}
        })))
        .with_status(200)
        .with_body(
            json!({
                "data": {"fundData": {"funds": [{
                    "fundName": "Goldman Sachs ActiveBeta U.S. Large Cap Equity ETF",
                    "fundType": "ETF",
                    "shareClasses": [{"ticker": "GSLC", "distributionFrequency": "Quarterly"}]
                }]}}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let crawler = GoldmanSachsCrawler::with_base_url(client(), server.url());
    let etfs = crawler.crawl().await.unwrap();

    mock.assert_async().await;
    assert_eq!(etfs.len(), 1);
    assert_eq!(etfs[0].ticker, "GSLC");
}

#[tokio::test]
async fn test_json_crawler_rejects_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/services/funds")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let crawler = GoldmanSachsCrawler::with_base_url(client(), server.url());
    let err = crawler.crawl().await.unwrap_err();
    assert!(matches!(err, DataError::ParseError(_)), "{:?}", err);
}

#[tokio::test]
async fn test_pacer_crawl_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/products")
        .with_status(429)
        .create_async()
        .await;

    let crawler = PacerCrawler::with_base_url(client(), server.url());
    let err = crawler.crawl().await.unwrap_err();
    assert!(matches!(err, DataError::FetchError(_)), "{:?}", err);
}
