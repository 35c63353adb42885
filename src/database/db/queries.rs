use sqlx::{Pool, Sqlite};

use crate::database::models::Record;
/*
SQL for the `records` table: whole-document reads and overwrites keyed by
name. There are no partial updates; callers read-modify-write a document.
 */

 /*==========Record Queries=========== */

// Get one document by key
pub async fn get_record(pool: &Pool<Sqlite>, record_key: &str) -> Result<Option<Record>, sqlx::Error> {
    sqlx::query_as::<_, Record>(
        r#"
        SELECT
            record_key,
            record_value,
            updated_at
        FROM records
        WHERE record_key = ?
        "#
    )
    .bind(record_key)
    .fetch_optional(pool)
    .await
}

// Insert or overwrite a document (last write wins)
pub async fn put_record(pool: &Pool<Sqlite>, record_key: &str, record_value: &str) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO records (record_key, record_value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(record_key) DO UPDATE
        SET record_value = excluded.record_value,
            updated_at   = excluded.updated_at
        "#
    )
    .bind(record_key)
    .bind(record_value)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

