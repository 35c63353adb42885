// src/main.rs
use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use fund_allocation::{backend, cli, config::AppConfig, database::db::SqliteStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "server" {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .init();

        let store = SqliteStore::connect(&config.database_url).await?;
        backend::run_server(Arc::new(store), config.server_addr).await?;
    } else {
        // the terminal belongs to the UI, so logs go to a file
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log_file))
            .init();

        cli::run(&config).await?;
    }
    Ok(())
}
