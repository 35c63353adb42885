pub mod backend;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod funds;
pub mod sync;

pub use error::{FundError, FundResult, StoreError, SyncError};
