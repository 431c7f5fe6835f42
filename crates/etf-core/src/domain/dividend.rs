//! 배당금 시뮬레이션.
//!
//! 투자 금액과 보유 기간으로 ETF의 예상 배당금을 계산합니다.
//! 배당 수익률은 연 기준이며 월 배당금은 연 배당금을 12로 나눈 값입니다.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::etf::Etf;
use crate::error::{EtfError, EtfResult};

/// 배당금 시뮬레이션 요청.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct DividendSimulationRequest {
    /// 티커 심볼 (대소문자 무시)
    pub ticker: String,
    /// 투자 금액
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub investment_amount: Decimal,
    /// 보유 기간 (개월)
    pub holding_period_months: u32,
}

/// 배당금 시뮬레이션 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct DividendSimulationResult {
    pub ticker: String,
    pub fund_name: String,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub investment_amount: Decimal,
    /// 매수 가능 주식 수 (소수점 2자리)
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub shares_purchased: Decimal,
    /// 현재가 (NAV)
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub current_price: Decimal,
    /// 배당 수익률 (%)
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub distribution_yield: Decimal,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub annual_dividend_estimate: Decimal,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub monthly_dividend_estimate: Decimal,
    pub holding_period_months: u32,
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub total_dividend_estimate: Decimal,
}

/// 금액을 소수점 2자리로 반올림 (half-even 아님, 0.005 → 0.01).
fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// ETF에 대한 배당금 시뮬레이션 수행.
///
/// # Errors
/// - 투자 금액이 0 이하이거나 보유 기간이 0개월이면 `InvalidInput`
/// - NAV가 0 이하이면 `InvalidInput`
/// - 계산 중 Decimal 범위를 넘으면 `InvalidInput`
/// - 배당 수익률 정보가 없으면 `MissingData`
pub fn simulate_dividend(
    etf: &Etf,
    request: &DividendSimulationRequest,
) -> EtfResult<DividendSimulationResult> {
    if request.investment_amount <= Decimal::ZERO {
        return Err(EtfError::InvalidInput(
            "investment_amount must be positive".to_string(),
        ));
    }
    if request.holding_period_months == 0 {
        return Err(EtfError::InvalidInput(
            "holding_period_months must be at least 1".to_string(),
        ));
    }

    let distribution_yield = etf.distribution_yield.ok_or_else(|| {
        EtfError::MissingData(format!(
            "ETF '{}' does not have distribution yield data",
            etf.ticker
        ))
    })?;

    let nav = etf.nav_amount;
    if nav <= Decimal::ZERO {
        return Err(EtfError::InvalidInput(format!(
            "ETF '{}' has no NAV to price the purchase",
            etf.ticker
        )));
    }

    let investment = request.investment_amount;
    let overflow = || {
        EtfError::InvalidInput(format!(
            "investment_amount {} is too large to simulate",
            investment
        ))
    };

    let shares = investment.checked_div(nav).ok_or_else(overflow)?;
    let annual_dividend = investment
        .checked_mul(distribution_yield)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;
    let monthly_dividend = annual_dividend / Decimal::from(12);
    let total_dividend = monthly_dividend
        .checked_mul(Decimal::from(request.holding_period_months))
        .ok_or_else(overflow)?;

    Ok(DividendSimulationResult {
        ticker: etf.ticker.clone(),
        fund_name: etf.fund_name.clone(),
        investment_amount: investment,
        shares_purchased: round_cents(shares),
        current_price: nav,
        distribution_yield,
        annual_dividend_estimate: round_cents(annual_dividend),
        monthly_dividend_estimate: round_cents(monthly_dividend),
        holding_period_months: request.holding_period_months,
        total_dividend_estimate: round_cents(total_dividend),
    })
}
