use sqlx::{Pool, Sqlite};

use crate::error::StoreResult;

pub async fn run_migrations(pool: &Pool<Sqlite>) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
