//! Self-hosted sync endpoint.
//!
//! Speaks the same contract as the spreadsheet script the app was built
//! against: `POST /` with `{"action": "sync_funds", "data": {...}}` and
//! `GET /?action=get_funds`.

mod handlers;
mod routes;

use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::database::db::RecordStore;

/// Key under which the server keeps the last pushed balances. Distinct from
/// the client's own key so both can share one database file.
pub const REMOTE_BALANCES_KEY: &str = "remote_fund_balances";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
}

pub fn app(store: Arc<dyn RecordStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .with_state(state)
}

pub async fn run_server(store: Arc<dyn RecordStore>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = app(store);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("sync server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
