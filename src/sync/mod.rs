//! One-way sync of bucket balances with a remote JSON endpoint.
//!
//! The endpoint contract is deliberately small: a POST carrying
//! `{"action": "sync_funds", "data": {...}}` stores the balances, and a GET
//! with `?action=get_funds` returns them. Nothing is merged; a pull replaces
//! local balances wholesale.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;
use crate::funds::BucketBalances;

pub use http::HttpSync;

pub const PUSH_FUNDS_ACTION: &str = "sync_funds";
pub const PULL_FUNDS_ACTION: &str = "get_funds";

/// Body of a push request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload<T> {
    pub action: String,
    pub data: T,
}

#[async_trait]
pub trait FundRemote: Send + Sync {
    /// Sends the balances; returns whatever text the endpoint answered with.
    async fn push(&self, balances: &BucketBalances) -> SyncResult<String>;

    /// Fetches a complete set of balances. Partial or non-numeric payloads
    /// are rejected before anything reaches local state.
    async fn pull(&self) -> SyncResult<BucketBalances>;
}
