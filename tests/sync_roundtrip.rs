//! End-to-end sync through the bundled endpoint server over real HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use fund_allocation::backend;
use fund_allocation::database::db::{MemoryStore, SqliteStore};
use fund_allocation::funds::{BucketKey, FundDesk};
use fund_allocation::{FundError, SyncError};
use rust_decimal::Decimal;

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn desk_for(addr: SocketAddr) -> FundDesk<SqliteStore> {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let endpoint = format!("http://{addr}/");
    FundDesk::open(store, Some(&endpoint), Duration::from_secs(5))
        .await
        .unwrap()
}

#[tokio::test]
async fn push_then_pull_restores_pushed_balances() {
    let addr = serve(backend::app(Arc::new(MemoryStore::new()))).await;
    let desk = desk_for(addr).await;

    desk.distribute(Decimal::from(1_000_000)).await.unwrap();
    let reply = desk.push().await.unwrap();
    assert_eq!(reply, "Synced fund balances");
    let pushed = desk.view().await.balances;

    desk.adjust_balance(BucketKey::Enjoyment, Decimal::from(-300_000)).await.unwrap();
    assert_eq!(desk.view().await.total, Decimal::from(700_000));

    let pulled = desk.pull().await.unwrap();
    assert_eq!(pulled, pushed);
    assert_eq!(desk.view().await.total, Decimal::from(1_000_000));
    assert_eq!(pulled.get(BucketKey::Necessity), Decimal::from(550_000));
}

#[tokio::test]
async fn second_device_pulls_what_first_pushed() {
    let addr = serve(backend::app(Arc::new(MemoryStore::new()))).await;
    let phone = desk_for(addr).await;
    let laptop = desk_for(addr).await;

    phone.adjust_balance(BucketKey::Give, Decimal::new(12_550, 1)).await.unwrap();
    phone.push().await.unwrap();

    laptop.distribute(Decimal::from(10)).await.unwrap();
    laptop.pull().await.unwrap();

    let view = laptop.view().await;
    assert_eq!(view.balances.get(BucketKey::Give), Decimal::new(12_550, 1));
    assert_eq!(view.total, Decimal::new(12_550, 1));
}

#[tokio::test]
async fn partial_payload_is_rejected_and_nothing_applied() {
    let router = Router::new().route(
        "/",
        get(|| async { r#"{"necessity": 1, "education": 2}"# }),
    );
    let addr = serve(router).await;
    let desk = desk_for(addr).await;
    desk.distribute(Decimal::from(100)).await.unwrap();

    let err = desk.pull().await.unwrap_err();
    assert!(matches!(err, FundError::SyncTransport(SyncError::Malformed(_))));
    assert_eq!(desk.view().await.total, Decimal::from(100));
}

#[tokio::test]
async fn overflowing_payload_is_rejected_and_nothing_applied() {
    let router = Router::new().route(
        "/",
        get(|| async {
            r#"{"necessity":5e28,"education":5e28,"enjoyment":0,"investment":0,"saving":0,"give":0}"#
        }),
    );
    let addr = serve(router).await;
    let desk = desk_for(addr).await;
    desk.distribute(Decimal::from(100)).await.unwrap();

    let err = desk.pull().await.unwrap_err();
    assert!(matches!(err, FundError::SyncTransport(SyncError::Malformed(_))));
    assert_eq!(desk.view().await.total, Decimal::from(100));
}

#[tokio::test]
async fn server_error_surfaces_as_status() {
    let router = Router::new().route(
        "/",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "sheet locked") })
            .post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "sheet locked") }),
    );
    let addr = serve(router).await;
    let desk = desk_for(addr).await;

    match desk.push().await {
        Err(FundError::SyncTransport(SyncError::Status { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "sheet locked");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(matches!(
        desk.pull().await,
        Err(FundError::SyncTransport(SyncError::Status { status: 500, .. }))
    ));
    assert!(!desk.is_syncing());
}
