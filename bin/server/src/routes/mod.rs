//! HTTP routes.

mod analyze;
mod auth;
mod threads;

use crate::state::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use analyze::AnalyzeRequest;
pub use auth::CallbackQuery;
pub use threads::ListThreadsParams;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(analyze::analyze))
        .route("/callback", get(auth::callback))
        .route("/threads", get(threads::list))
        .route("/threads/turn", post(threads::turn))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
