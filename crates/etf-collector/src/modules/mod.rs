//! 수집 작업 모듈.

pub mod daemon;
pub mod inspect;
pub mod update;

pub use daemon::run_daemon;
pub use inspect::{inspect_dataset, provider_overview, ProviderOverview};
pub use update::run_update;
