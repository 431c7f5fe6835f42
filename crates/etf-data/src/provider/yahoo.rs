//! Yahoo Finance NAV 보강.
//!
//! 운용사 페이지에서 NAV를 얻지 못한 레코드(NAV 0)에 대해
//! 최근 5일 일봉의 마지막 종가로 `nav_amount`/`nav_as_of`를 채웁니다.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use etf_core::Etf;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info};
use yahoo_finance_api as yahoo;

use super::{pause, EtfEnricher};
use crate::error::{DataError, Result};

pub struct YahooEnricher {
    connector: yahoo::YahooConnector,
    request_delay: Duration,
}

impl YahooEnricher {
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| DataError::FetchError(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self {
            connector,
            request_delay: Duration::from_millis(200),
        })
    }

    pub fn with_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }

    /// 마지막 종가와 해당 일자 조회.
    pub async fn latest_close(&self, ticker: &str) -> Result<(Decimal, NaiveDate)> {
        let response = self
            .connector
            .get_quote_range(ticker, "1d", "5d")
            .await
            .map_err(|e| DataError::FetchError(format!("시세 조회 실패 ({}): {}", ticker, e)))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::ParseError(format!("Quote 파싱 오류: {}", e)))?;

        let latest = quotes
            .last()
            .ok_or_else(|| DataError::FetchError(format!("시세 데이터 없음: {}", ticker)))?;

        let close = Decimal::from_f64(latest.close)
            .map(|d| d.round_dp(4))
            .filter(|d| *d > Decimal::ZERO)
            .ok_or_else(|| DataError::ParseError(format!("잘못된 종가: {}", latest.close)))?;

        let as_of = Utc
            .timestamp_opt(latest.timestamp as i64, 0)
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| Utc::now().date_naive());

        Ok((close, as_of))
    }
}

#[async_trait]
impl EtfEnricher for YahooEnricher {
    async fn enrich(&self, etfs: &mut [Etf]) -> usize {
        let mut enriched = 0;
        let mut first = true;

        for etf in etfs.iter_mut().filter(|e| e.needs_nav()) {
            if !first {
                pause(self.request_delay).await;
            }
            first = false;

            match self.latest_close(&etf.ticker).await {
                Ok((nav, as_of)) => {
                    etf.nav_amount = nav;
                    etf.nav_as_of = as_of;
                    enriched += 1;
                }
                Err(e) => debug!(ticker = %etf.ticker, error = %e, "NAV 보강 실패"),
            }
        }

        info!(enriched, "Yahoo Finance NAV 보강 완료");
        enriched
    }
}
