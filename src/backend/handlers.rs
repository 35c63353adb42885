use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::backend::{AppState, REMOTE_BALANCES_KEY};
use crate::funds::{BucketBalances, StoredBalances};
use crate::sync::{SyncPayload, PULL_FUNDS_ACTION, PUSH_FUNDS_ACTION};

#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

// Body is parsed by hand: script-style clients post JSON as text/plain.
pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: SyncPayload<Value> = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("invalid request body: {e}")).into_response(),
    };

    if payload.action != PUSH_FUNDS_ACTION {
        return (StatusCode::BAD_REQUEST, format!("unknown action: {}", payload.action)).into_response();
    }

    let balances: BucketBalances = match serde_json::from_value(payload.data) {
        Ok(b) => b,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, format!("invalid fund balances: {e}")).into_response(),
    };

    let doc = match serde_json::to_value(StoredBalances(balances.clone())) {
        Ok(doc) => doc,
        Err(e) => return internal(e),
    };
    if let Err(e) = state.store.set(REMOTE_BALANCES_KEY, &doc).await {
        return internal(e);
    }

    tracing::info!(total = %balances.total(), "stored pushed fund balances");
    (StatusCode::OK, "Synced fund balances").into_response()
}

pub async fn pull_handler(State(state): State<AppState>, Query(query): Query<ActionQuery>) -> Response {
    match query.action.as_deref() {
        Some(PULL_FUNDS_ACTION) => {}
        Some(other) => return (StatusCode::BAD_REQUEST, format!("unknown action: {other}")).into_response(),
        None => return (StatusCode::BAD_REQUEST, "missing action").into_response(),
    }

    let stored = match state.store.get(REMOTE_BALANCES_KEY).await {
        Ok(stored) => stored,
        Err(e) => return internal(e),
    };
    let balances = match stored.map(serde_json::from_value::<StoredBalances>).transpose() {
        Ok(b) => b.map(|StoredBalances(b)| b).unwrap_or_default(),
        Err(e) => return internal(e),
    };

    tracing::debug!(total = %balances.total(), "serving fund balances");
    Json(balances).into_response()
}

fn internal(e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "sync request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use crate::backend::app;
    use crate::database::db::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn push_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "text/plain;charset=utf-8")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn pull_before_any_push_returns_zeros() {
        let app = app(Arc::new(MemoryStore::new()));
        let resp = app.oneshot(get_request("/?action=get_funds")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 6);
        assert_eq!(json["necessity"].as_f64(), Some(0.0));
    }

    #[tokio::test]
    async fn push_then_pull() {
        let store = Arc::new(MemoryStore::new());
        let body = r#"{"action":"sync_funds","data":{"necessity":550000,"education":100000,"enjoyment":100000,"investment":100000,"saving":100000,"give":50000}}"#;

        let resp = app(store.clone()).oneshot(push_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Synced fund balances");

        let resp = app(store).oneshot(get_request("/?action=get_funds")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json["give"].as_f64(), Some(50000.0));
    }

    #[tokio::test]
    async fn rejects_unknown_action_and_partial_data() {
        let store = Arc::new(MemoryStore::new());

        let resp = app(store.clone())
            .oneshot(push_request(r#"{"action":"sync_loans","data":[]}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app(store.clone())
            .oneshot(push_request(r#"{"action":"sync_funds","data":{"saving":1}}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(store.write_count(), 0);

        let resp = app(store).oneshot(get_request("/?action=get_loans")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_balances_whose_total_overflows() {
        let store = Arc::new(MemoryStore::new());
        let body = r#"{"action":"sync_funds","data":{"necessity":5e28,"education":5e28,"enjoyment":0,"investment":0,"saving":0,"give":0}}"#;

        let resp = app(store.clone()).oneshot(push_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn health() {
        let resp = app(Arc::new(MemoryStore::new()))
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(body_text(resp).await, "Backend is running");
    }
}
