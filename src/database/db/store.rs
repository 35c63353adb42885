//! Persisted key-value record store.
//!
//! Documents are whole JSON values keyed by name. The store only supports
//! whole-document reads and overwrites; there is no field-level update and
//! no concurrency token.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Sqlite};

use super::{connection, migrate, queries};
use crate::error::StoreResult;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read a document, `None` when the key was never written.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Overwrite a document.
    async fn set(&self, key: &str, value: &Value) -> StoreResult<()>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        (**self).set(key, value).await
    }
}

/// SQLite-backed store, one row per document.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `db_url` and applies migrations.
    pub async fn connect(db_url: &str) -> StoreResult<Self> {
        let pool = connection::get_db_pool(db_url).await?;
        migrate::run_migrations(&pool).await?;
        tracing::debug!(db_url, "record store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        match queries::get_record(&self.pool, key).await? {
            Some(record) => Ok(Some(serde_json::from_str(&record.record_value)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        queries::put_record(&self.pool, key, &text).await?;
        Ok(())
    }
}

/// In-process store. Counts writes so callers can check that a no-op did
/// not touch storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn docs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // a poisoned map is still a consistent map: every write is a single insert
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.docs().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        self.docs().insert(key.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
