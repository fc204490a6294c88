use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use penwise_assistant::{ListThreadsQuery, Thread, TurnRequest, TurnResult};
use penwise_core::{ThreadId, UserId};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters of `GET /threads`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListThreadsParams {
    pub user_id: Option<String>,
    pub num_items: Option<usize>,
    pub cursor: Option<String>,
}

fn invalid_request(details: String) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "Invalid request").with_details(details)
}

/// Runs one turn of a thread, creating the thread when no id is given.
pub async fn turn(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<TurnResult>, ApiError> {
    let Json(request) = body.map_err(|rejection| invalid_request(rejection.body_text()))?;
    let result = state.threads.run_turn(request).await?;
    Ok(Json(result))
}

/// Lists a user's threads, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListThreadsParams>, QueryRejection>,
) -> Result<Json<Vec<Thread>>, ApiError> {
    let Query(params) = params.map_err(|rejection| invalid_request(rejection.body_text()))?;

    let user_id = match params.user_id {
        Some(id) if !id.trim().is_empty() => UserId::new(id),
        _ => return Err(ApiError::new(StatusCode::BAD_REQUEST, "userId is required")),
    };
    let cursor = params
        .cursor
        .filter(|c| !c.is_empty())
        .map(|c| c.parse::<ThreadId>())
        .transpose()
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "Invalid cursor"))?;

    let query = ListThreadsQuery {
        num_items: params.num_items,
        cursor,
    };
    let threads = state.threads.list_threads(&user_id, &query).await?;
    Ok(Json(threads))
}
