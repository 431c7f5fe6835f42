//! ETF 기본 정보 모델.
//!
//! 운용사 크롤러가 생성하고 데이터셋 저장소에 기록되는 레코드입니다.
//! `Decimal` 필드는 정밀도 손실을 막기 위해 문자열로 직렬화됩니다.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 배당 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub enum DistributionFrequency {
    /// 주배당
    Weekly,
    /// 월배당
    Monthly,
    /// 분기배당
    Quarterly,
    /// 반기배당
    #[serde(rename = "Semi-Annual")]
    SemiAnnual,
    /// 연배당
    Annual,
    /// 가변
    Variable,
    /// 무배당
    None,
    /// 알 수 없음
    #[default]
    Unknown,
}

impl DistributionFrequency {
    /// 직렬화 이름 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::SemiAnnual => "Semi-Annual",
            Self::Annual => "Annual",
            Self::Variable => "Variable",
            Self::None => "None",
            Self::Unknown => "Unknown",
        }
    }

    /// 운용사 페이지의 자유 텍스트에서 배당 주기 파싱.
    ///
    /// "Paid Monthly", "semi annually", "Quarterly distributions" 등을 인식하며
    /// 인식하지 못한 텍스트는 `Unknown`으로 처리합니다.
    pub fn parse_lenient(text: &str) -> Self {
        let s = text.trim().to_lowercase();
        if s.is_empty() {
            Self::Unknown
        } else if s.contains("semi") {
            Self::SemiAnnual
        } else if s.contains("week") {
            Self::Weekly
        } else if s.contains("month") {
            Self::Monthly
        } else if s.contains("quarter") {
            Self::Quarterly
        } else if s.contains("annual") || s.contains("year") {
            Self::Annual
        } else if s.contains("variable") || s.contains("irregular") {
            Self::Variable
        } else if s == "none" || s.contains("no distribution") {
            Self::None
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for DistributionFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ETF 기본 정보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Etf {
    // ===== 식별 정보 =====
    /// 티커 심볼 (예: SCHD)
    pub ticker: String,
    /// 펀드명
    pub fund_name: String,
    /// ISIN 코드 (제공되지 않으면 "N/A")
    pub isin: String,
    /// CUSIP 코드 (제공되지 않으면 "N/A")
    pub cusip: String,
    /// 설정일
    #[serde(default)]
    pub inception_date: Option<NaiveDate>,

    // ===== 가격 정보 =====
    /// 현재 NAV (순자산가치). ETF는 NAV 기준으로 거래되므로 실질 가격 역할을 합니다.
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub nav_amount: Decimal,
    /// NAV 기준일
    pub nav_as_of: NaiveDate,

    // ===== 비용 정보 =====
    /// 운용 보수율 (% 단위, 예: 0.06 = 0.06%)
    #[cfg_attr(feature = "utoipa-support", schema(value_type = String))]
    pub expense_ratio: Decimal,

    // ===== 수익률 정보 (%) =====
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub ytd_return: Option<Decimal>,
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub one_year_return: Option<Decimal>,
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub three_year_return: Option<Decimal>,
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub five_year_return: Option<Decimal>,
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub ten_year_return: Option<Decimal>,
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub since_inception_return: Option<Decimal>,

    // ===== 자산 분류 =====
    /// 자산군 (Equity, Fixed Income 등)
    pub asset_class: String,
    /// 지역 (North America, Global 등)
    pub region: String,
    /// 시장 유형 (Developed, Emerging 등)
    pub market_type: String,

    // ===== 배당 정보 =====
    /// 배당 수익률 (%)
    #[serde(default)]
    #[cfg_attr(feature = "utoipa-support", schema(value_type = Option<String>))]
    pub distribution_yield: Option<Decimal>,
    /// 배당 주기
    #[serde(default)]
    pub distribution_frequency: DistributionFrequency,

    // ===== URL =====
    /// 상품 페이지 URL
    pub product_page_url: String,
    /// 상세 정보 페이지 URL (ETF 정보 갱신용)
    #[serde(default)]
    pub detail_page_url: Option<String>,
}

impl Etf {
    /// 최소 정보로 ETF 레코드 생성.
    ///
    /// 운용사가 제공하지 않는 필드는 "N/A", "Unknown", 0 등 기본값으로 채워지며
    /// NAV 기준일은 오늘(UTC)로 설정됩니다.
    pub fn new(
        ticker: impl Into<String>,
        fund_name: impl Into<String>,
        product_page_url: impl Into<String>,
    ) -> Self {
        let product_page_url = product_page_url.into();
        Self {
            ticker: ticker.into(),
            fund_name: fund_name.into(),
            isin: "N/A".to_string(),
            cusip: "N/A".to_string(),
            inception_date: None,
            nav_amount: Decimal::ZERO,
            nav_as_of: Utc::now().date_naive(),
            expense_ratio: Decimal::ZERO,
            ytd_return: None,
            one_year_return: None,
            three_year_return: None,
            five_year_return: None,
            ten_year_return: None,
            since_inception_return: None,
            asset_class: "Unknown".to_string(),
            region: "Unknown".to_string(),
            market_type: "Unknown".to_string(),
            distribution_yield: None,
            distribution_frequency: DistributionFrequency::Unknown,
            detail_page_url: Some(product_page_url.clone()),
            product_page_url,
        }
    }

    /// 자산 분류 설정.
    #[must_use]
    pub fn with_classification(
        mut self,
        asset_class: impl Into<String>,
        region: impl Into<String>,
        market_type: impl Into<String>,
    ) -> Self {
        self.asset_class = asset_class.into();
        self.region = region.into();
        self.market_type = market_type.into();
        self
    }

    /// 운용 보수율 설정.
    #[must_use]
    pub fn with_expense_ratio(mut self, expense_ratio: Decimal) -> Self {
        self.expense_ratio = expense_ratio;
        self
    }

    /// NAV가 비어 있는지 (0 이하) 확인.
    ///
    /// 보강(enrichment) 대상 판별에 사용됩니다.
    pub fn needs_nav(&self) -> bool {
        self.nav_amount <= Decimal::ZERO
    }

    /// 티커 비교 (대소문자 무시).
    pub fn matches_ticker(&self, ticker: &str) -> bool {
        self.ticker.eq_ignore_ascii_case(ticker.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_distribution_frequency_serde_names() {
        let json = serde_json::to_string(&DistributionFrequency::SemiAnnual).unwrap();
        assert_eq!(json, r#""Semi-Annual""#);

        let parsed: DistributionFrequency = serde_json::from_str(r#""Monthly""#).unwrap();
        assert_eq!(parsed, DistributionFrequency::Monthly);
    }

    #[test]
    fn test_distribution_frequency_parse_lenient() {
        assert_eq!(
            DistributionFrequency::parse_lenient("Paid Monthly"),
            DistributionFrequency::Monthly
        );
        assert_eq!(
            DistributionFrequency::parse_lenient("semi annually"),
            DistributionFrequency::SemiAnnual
        );
        assert_eq!(
            DistributionFrequency::parse_lenient("Quarterly distributions"),
            DistributionFrequency::Quarterly
        );
        assert_eq!(
            DistributionFrequency::parse_lenient("Annually"),
            DistributionFrequency::Annual
        );
        assert_eq!(DistributionFrequency::parse_lenient(""), DistributionFrequency::Unknown);
        assert_eq!(
            DistributionFrequency::parse_lenient("whenever"),
            DistributionFrequency::Unknown
        );
    }

    #[test]
    fn test_etf_new_defaults() {
        let etf = Etf::new("TQQQ", "ProShares UltraPro QQQ", "https://example.com/tqqq");
        assert_eq!(etf.isin, "N/A");
        assert_eq!(etf.asset_class, "Unknown");
        assert_eq!(etf.detail_page_url.as_deref(), Some("https://example.com/tqqq"));
        assert!(etf.needs_nav());
        assert!(etf.matches_ticker(" tqqq "));
    }

    #[test]
    fn test_etf_decimal_serialized_as_string() {
        let etf = Etf::new("SCHD", "Schwab U.S. Dividend Equity ETF", "/schd")
            .with_expense_ratio(dec!(0.06));
        let value = serde_json::to_value(&etf).unwrap();
        assert_eq!(value["expense_ratio"], "0.06");
        assert_eq!(value["distribution_frequency"], "Unknown");

        let back: Etf = serde_json::from_value(value).unwrap();
        assert_eq!(back, etf);
    }

    #[test]
    fn test_etf_deserialize_without_optional_fields() {
        let json = r#"{
            "ticker": "METV",
            "fund_name": "Metaverse ETF",
            "isin": "N/A",
            "cusip": "N/A",
            "nav_amount": "12.30",
            "nav_as_of": "2025-11-28",
            "expense_ratio": "0.59",
            "asset_class": "Equity",
            "region": "Global",
            "market_type": "Developed",
            "product_page_url": "https://www.roundhillinvestments.com/etf/metv/"
        }"#;
        let etf: Etf = serde_json::from_str(json).unwrap();
        assert_eq!(etf.nav_amount, dec!(12.30));
        assert_eq!(etf.distribution_frequency, DistributionFrequency::Unknown);
        assert!(etf.inception_date.is_none());
        assert!(etf.detail_page_url.is_none());
    }
}
