//! Envelope budgeting: the fixed bucket set, the ratio configuration, the
//! balances, and the engine that moves money between them.

pub mod balances;
pub mod bucket;
pub mod desk;
pub mod engine;
pub mod ratios;

pub use balances::{parse_amount, BucketBalances};
pub(crate) use balances::StoredBalances;
pub use bucket::BucketKey;
pub use desk::FundDesk;
pub use engine::{AllocationEngine, FUND_BALANCES_KEY, FUND_RATIOS_KEY};
pub use ratios::RatioConfig;
