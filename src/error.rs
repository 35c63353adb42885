//! Error types shared by the allocation engine, the record store and the
//! sync adapter.

use thiserror::Error;

use crate::funds::BucketKey;

/// Errors raised by the allocation engine and the fund desk.
#[derive(Debug, Error)]
pub enum FundError {
    /// A bucket name outside the fixed set was supplied.
    #[error("unknown bucket: {0}")]
    InvalidBucket(String),

    /// A ratio percent outside `0..=100` was supplied.
    #[error("ratio {percent}% for {bucket} is outside 0..=100")]
    InvalidRange { bucket: BucketKey, percent: i64 },

    /// Commit attempted while the working ratios do not sum to 100.
    #[error("ratios sum to {0}%, expected 100%")]
    UnbalancedRatio(u32),

    /// The result of a distribution or adjustment does not fit in a `Decimal`.
    #[error("amount is out of range")]
    AmountOutOfRange,

    /// A push or pull is still running; local edits are refused until it ends.
    #[error("a sync is already in flight")]
    SyncInFlight,

    #[error(transparent)]
    SyncTransport(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type FundResult<T> = Result<T, FundError>;

/// Errors from the persisted record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored document could not be encoded or decoded.
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transport-level failures of the remote sync adapter.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no sync endpoint configured")]
    NotConfigured,

    #[error("invalid sync endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The pulled body is not a complete set of numeric bucket balances.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = FundError::InvalidBucket("rent".into());
        assert_eq!(err.to_string(), "unknown bucket: rent");

        let err = FundError::InvalidRange {
            bucket: BucketKey::Give,
            percent: 101,
        };
        assert_eq!(err.to_string(), "ratio 101% for give is outside 0..=100");

        let err = FundError::UnbalancedRatio(145);
        assert_eq!(err.to_string(), "ratios sum to 145%, expected 100%");

        let err = FundError::from(SyncError::Status {
            status: 502,
            body: "bad gateway".into(),
        });
        assert_eq!(err.to_string(), "endpoint returned 502: bad gateway");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FundError>();
        assert_send_sync::<StoreError>();
        assert_send_sync::<SyncError>();
    }
}
