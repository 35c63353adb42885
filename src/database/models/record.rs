use sqlx::FromRow;

// One stored JSON document. The value is kept as text and decoded by the store.
#[derive(FromRow, Debug, Clone)]
pub struct Record {
    pub record_key: String,
    pub record_value: String,
    pub updated_at: String,     // RFC 3339, UTC
}
