//! The allocation engine: one owner for the ratio configuration and the
//! bucket balances.
//!
//! Every mutating operation validates first, computes the next document on
//! a copy, writes it to the store, and only then swaps it into memory. A
//! rejected or failed operation therefore leaves both memory and storage as
//! they were.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{parse_amount, BucketBalances, BucketKey, RatioConfig, StoredBalances};
use crate::database::db::RecordStore;
use crate::error::{FundError, FundResult, StoreResult};

pub const FUND_RATIOS_KEY: &str = "fund_ratios";
pub const FUND_BALANCES_KEY: &str = "fund_balances";

pub struct AllocationEngine<S> {
    store: S,
    /// Ratios as currently edited; may not sum to 100.
    working: RatioConfig,
    /// Last configuration written by `commit_ratios`.
    committed: RatioConfig,
    balances: BucketBalances,
}

impl<S: RecordStore> AllocationEngine<S> {
    /// Loads both documents, writing defaults for any that are absent.
    pub async fn load(store: S) -> FundResult<Self> {
        let committed: RatioConfig = load_or_init(&store, FUND_RATIOS_KEY).await?;
        let StoredBalances(balances): StoredBalances = load_or_init(&store, FUND_BALANCES_KEY).await?;

        tracing::debug!(
            ratio_total = committed.total(),
            total_balance = %balances.total(),
            "allocation engine loaded"
        );

        Ok(Self {
            store,
            working: committed.clone(),
            committed,
            balances,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The working (possibly unsaved) ratios.
    pub fn ratios(&self) -> &RatioConfig {
        &self.working
    }

    pub fn committed_ratios(&self) -> &RatioConfig {
        &self.committed
    }

    pub fn has_unsaved_ratios(&self) -> bool {
        self.working != self.committed
    }

    pub fn balances(&self) -> &BucketBalances {
        &self.balances
    }

    pub fn total_balance(&self) -> Decimal {
        self.balances.total()
    }

    /// What `distribute(amount)` would add to each bucket; all zero when the
    /// shares would overflow.
    pub fn preview_distribution(&self, amount: Decimal) -> BucketBalances {
        BucketBalances::shares(amount, &self.working).unwrap_or_default()
    }

    /// Splits `amount` across every bucket by the working ratios.
    ///
    /// A zero amount is a no-op and does not touch the store. The ratios are
    /// not required to sum to 100 here; an unbalanced configuration simply
    /// distributes proportionally more or less than `amount`. Fails with
    /// `AmountOutOfRange`, touching nothing, if any result would overflow.
    pub async fn distribute(&mut self, amount: Decimal) -> FundResult<&BucketBalances> {
        if amount.is_zero() {
            return Ok(&self.balances);
        }
        let next = self
            .balances
            .with_distribution(amount, &self.working)
            .ok_or(FundError::AmountOutOfRange)?;
        self.replace_balances(next).await?;
        tracing::info!(%amount, ratio_total = self.working.total(), "distributed deposit");
        Ok(&self.balances)
    }

    /// `distribute` for raw user input. Blank or non-numeric text is a
    /// silent no-op, same as zero.
    pub async fn distribute_input(&mut self, raw: &str) -> FundResult<&BucketBalances> {
        match parse_amount(raw) {
            Some(amount) => self.distribute(amount).await,
            None => Ok(&self.balances),
        }
    }

    /// Adds a signed amount to one bucket. Balances may go negative.
    pub async fn adjust_balance(&mut self, key: BucketKey, delta: Decimal) -> FundResult<&BucketBalances> {
        let next = self
            .balances
            .with_adjustment(key, delta)
            .ok_or(FundError::AmountOutOfRange)?;
        self.replace_balances(next).await?;
        tracing::info!(bucket = %key, %delta, "adjusted balance");
        Ok(&self.balances)
    }

    /// `adjust_balance` addressed by bucket name.
    pub async fn adjust_balance_named(&mut self, bucket: &str, delta: Decimal) -> FundResult<&BucketBalances> {
        let key: BucketKey = bucket.parse()?;
        self.adjust_balance(key, delta).await
    }

    /// Edits the working ratios only; nothing is persisted until `commit_ratios`.
    pub fn update_ratio(&mut self, key: BucketKey, percent: i64) -> FundResult<()> {
        self.working.set(key, percent)?;
        tracing::debug!(bucket = %key, percent, working_total = self.working.total(), "ratio edited");
        Ok(())
    }

    /// Persists the working ratios if they sum to exactly 100.
    pub async fn commit_ratios(&mut self) -> FundResult<()> {
        let total = self.working.total();
        if total != 100 {
            tracing::warn!(total, "refusing to commit unbalanced ratios");
            return Err(FundError::UnbalancedRatio(total));
        }
        save(&self.store, FUND_RATIOS_KEY, &self.working).await?;
        self.committed = self.working.clone();
        tracing::info!("ratios committed");
        Ok(())
    }

    /// Throws away uncommitted ratio edits.
    pub fn discard_ratio_edits(&mut self) {
        self.working = self.committed.clone();
    }

    /// Replaces every balance, e.g. with the result of a remote pull. No merge.
    pub async fn overwrite_balances(&mut self, balances: BucketBalances) -> FundResult<&BucketBalances> {
        let total = balances.checked_total().ok_or(FundError::AmountOutOfRange)?;
        self.replace_balances(balances).await?;
        tracing::info!(total_balance = %total, "balances overwritten");
        Ok(&self.balances)
    }

    async fn replace_balances(&mut self, next: BucketBalances) -> StoreResult<()> {
        save(&self.store, FUND_BALANCES_KEY, &StoredBalances(next.clone())).await?;
        self.balances = next;
        Ok(())
    }
}

async fn load_or_init<S, T>(store: &S, key: &str) -> StoreResult<T>
where
    S: RecordStore,
    T: Serialize + DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => {
            let fresh = T::default();
            save(store, key, &fresh).await?;
            Ok(fresh)
        }
    }
}

async fn save<S: RecordStore, T: Serialize>(store: &S, key: &str, doc: &T) -> StoreResult<()> {
    let value = serde_json::to_value(doc)?;
    store.set(key, &value).await
}
