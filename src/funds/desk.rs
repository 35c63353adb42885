//! A session around one [`AllocationEngine`] plus its sync endpoint.
//!
//! The desk is the only place that mixes local edits with remote I/O, so it
//! carries the single in-flight-sync flag: while a push or pull runs, local
//! mutations fail fast with [`FundError::SyncInFlight`] instead of racing a
//! pull that is about to overwrite them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{AllocationEngine, BucketBalances, BucketKey, RatioConfig};
use crate::database::db::RecordStore;
use crate::error::{FundError, FundResult, SyncError};
use crate::sync::{FundRemote, HttpSync};

pub const SYNC_ENDPOINT_KEY: &str = "sync_endpoint_url";

/// Read-only copy of the desk state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FundView {
    pub ratios: RatioConfig,
    pub committed: RatioConfig,
    pub balances: BucketBalances,
    pub total: Decimal,
    pub endpoint: Option<String>,
}

#[derive(Clone)]
struct RemoteSlot {
    endpoint: String,
    remote: Arc<dyn FundRemote>,
}

pub struct FundDesk<S> {
    engine: Mutex<AllocationEngine<S>>,
    remote: RwLock<Option<RemoteSlot>>,
    sync_timeout: Duration,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the sync call ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: RecordStore> FundDesk<S> {
    pub fn new(engine: AllocationEngine<S>, sync_timeout: Duration) -> Self {
        Self {
            engine: Mutex::new(engine),
            remote: RwLock::new(None),
            sync_timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Loads the engine from `store` and wires up the sync endpoint.
    ///
    /// `endpoint_override` (from the environment) wins over the endpoint
    /// saved in the store. An unusable saved endpoint is logged and left
    /// unconfigured; an unusable override is an error.
    pub async fn open(store: S, endpoint_override: Option<&str>, sync_timeout: Duration) -> FundResult<Self> {
        let saved = match store.get(SYNC_ENDPOINT_KEY).await? {
            Some(value) => value.as_str().map(str::to_string),
            None => None,
        };
        let desk = Self::new(AllocationEngine::load(store).await?, sync_timeout);

        if let Some(url) = endpoint_override {
            let remote = HttpSync::new(url, sync_timeout)?;
            desk.set_remote(url, Arc::new(remote));
        } else if let Some(url) = saved {
            match HttpSync::new(&url, sync_timeout) {
                Ok(remote) => desk.set_remote(&url, Arc::new(remote)),
                Err(e) => tracing::warn!(error = %e, "ignoring saved sync endpoint"),
            }
        }
        Ok(desk)
    }

    /// Installs a remote without persisting it.
    pub fn with_remote(self, endpoint: &str, remote: Arc<dyn FundRemote>) -> Self {
        self.set_remote(endpoint, remote);
        self
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn view(&self) -> FundView {
        let engine = self.engine.lock().await;
        FundView {
            ratios: engine.ratios().clone(),
            committed: engine.committed_ratios().clone(),
            balances: engine.balances().clone(),
            total: engine.total_balance(),
            endpoint: self.remote_slot().map(|slot| slot.endpoint),
        }
    }

    pub async fn distribute(&self, amount: Decimal) -> FundResult<BucketBalances> {
        self.ensure_idle()?;
        let mut engine = self.engine.lock().await;
        engine.distribute(amount).await.cloned()
    }

    pub async fn distribute_input(&self, raw: &str) -> FundResult<BucketBalances> {
        self.ensure_idle()?;
        let mut engine = self.engine.lock().await;
        engine.distribute_input(raw).await.cloned()
    }

    pub async fn adjust_balance(&self, key: BucketKey, delta: Decimal) -> FundResult<BucketBalances> {
        self.ensure_idle()?;
        let mut engine = self.engine.lock().await;
        engine.adjust_balance(key, delta).await.cloned()
    }

    pub async fn update_ratio(&self, key: BucketKey, percent: i64) -> FundResult<()> {
        self.ensure_idle()?;
        self.engine.lock().await.update_ratio(key, percent)
    }

    pub async fn commit_ratios(&self) -> FundResult<()> {
        self.ensure_idle()?;
        self.engine.lock().await.commit_ratios().await
    }

    pub async fn discard_ratio_edits(&self) {
        self.engine.lock().await.discard_ratio_edits();
    }

    /// Validates and saves a new endpoint, replacing the current adapter.
    pub async fn configure_endpoint(&self, url: &str) -> FundResult<()> {
        self.ensure_idle()?;
        let url = url.trim();
        let remote = HttpSync::new(url, self.sync_timeout)?;
        {
            let engine = self.engine.lock().await;
            engine
                .store()
                .set(SYNC_ENDPOINT_KEY, &serde_json::Value::String(url.to_string()))
                .await?;
        }
        self.set_remote(url, Arc::new(remote));
        tracing::info!(endpoint = url, "sync endpoint configured");
        Ok(())
    }

    /// Sends the current balances to the endpoint. Local state is never
    /// modified, whether or not the push succeeds.
    pub async fn push(&self) -> FundResult<String> {
        let _flight = self.begin_sync()?;
        let slot = self.remote_slot().ok_or(SyncError::NotConfigured)?;
        let balances = self.engine.lock().await.balances().clone();

        match slot.remote.push(&balances).await {
            Ok(reply) => {
                tracing::info!(endpoint = %slot.endpoint, "pushed fund balances");
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(endpoint = %slot.endpoint, error = %e, "push failed");
                Err(e.into())
            }
        }
    }

    /// Replaces local balances with the endpoint's copy.
    ///
    /// The engine stays locked from request to overwrite so no local edit can
    /// land in between and be silently discarded. On any failure nothing is
    /// applied.
    pub async fn pull(&self) -> FundResult<BucketBalances> {
        let _flight = self.begin_sync()?;
        let slot = self.remote_slot().ok_or(SyncError::NotConfigured)?;
        let mut engine = self.engine.lock().await;

        let fresh = match slot.remote.pull().await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(endpoint = %slot.endpoint, error = %e, "pull failed");
                return Err(e.into());
            }
        };
        engine.overwrite_balances(fresh).await.cloned()
    }

    fn ensure_idle(&self) -> FundResult<()> {
        if self.is_syncing() {
            return Err(FundError::SyncInFlight);
        }
        Ok(())
    }

    fn begin_sync(&self) -> FundResult<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| FundError::SyncInFlight)?;
        Ok(InFlight(&self.in_flight))
    }

    fn remote_slot(&self) -> Option<RemoteSlot> {
        self.remote
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_remote(&self, endpoint: &str, remote: Arc<dyn FundRemote>) {
        *self.remote.write().unwrap_or_else(|e| e.into_inner()) = Some(RemoteSlot {
            endpoint: endpoint.to_string(),
            remote,
        });
    }
}
