//! ETF 도메인 모델.

mod dividend;
mod etf;

pub use dividend::*;
pub use etf::*;
