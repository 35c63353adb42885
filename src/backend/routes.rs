use axum::{
    routing::post,
    Router,
};
use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::push_handler).get(handlers::pull_handler))
}
