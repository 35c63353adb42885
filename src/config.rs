//! Runtime configuration read from the environment (a `.env` file is loaded
//! first by `main`).

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./fund_allocation.db";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOG_FILE: &str = "fund_allocation.log";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `DATABASE_URL`
    pub database_url: String,
    /// `FUND_SYNC_URL`; overrides the endpoint saved from the UI.
    pub sync_url: Option<String>,
    /// `FUND_SYNC_TIMEOUT_SECS`
    pub sync_timeout: Duration,
    /// `FUND_SERVER_ADDR`
    pub server_addr: SocketAddr,
    /// `FUND_LOG_FILE`; the terminal UI logs here instead of the screen.
    pub log_file: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let sync_timeout = match get("FUND_SYNC_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("FUND_SYNC_TIMEOUT_SECS must be whole seconds, got {raw:?}"))?,
            None => DEFAULT_SYNC_TIMEOUT_SECS,
        };

        let server_addr = get("FUND_SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
        let server_addr = server_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("FUND_SERVER_ADDR is not a socket address: {server_addr:?}"))?;

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            sync_url: get("FUND_SYNC_URL"),
            sync_timeout: Duration::from_secs(sync_timeout),
            server_addr,
            log_file: get("FUND_LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.sync_url, None);
        assert_eq!(cfg.sync_timeout, Duration::from_secs(15));
        assert_eq!(cfg.server_addr.port(), 3000);
        assert_eq!(cfg.log_file, DEFAULT_LOG_FILE);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("FUND_SYNC_URL", "https://script.google.com/macros/s/x/exec"),
            ("FUND_SYNC_TIMEOUT_SECS", "3"),
            ("FUND_SERVER_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.sync_url.as_deref(), Some("https://script.google.com/macros/s/x/exec"));
        assert_eq!(cfg.sync_timeout, Duration::from_secs(3));
        assert_eq!(cfg.server_addr.port(), 8080);
    }

    #[test]
    fn blank_sync_url_is_unset() {
        let cfg = config(&[("FUND_SYNC_URL", "   ")]).unwrap();
        assert_eq!(cfg.sync_url, None);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(config(&[("FUND_SYNC_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config(&[("FUND_SERVER_ADDR", "localhost")]).is_err());
    }
}
