//! Sign-in callback glue.
//!
//! Code exchange and sessions belong to the external identity provider;
//! this route only reports provider errors or sends the user onward.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters the identity provider appends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Handles the identity provider's redirect after sign-in.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, ApiError> {
    if let Some(error) = query.error {
        let details = query.error_description.unwrap_or(error);
        tracing::warn!(details = %details, "identity provider reported a sign-in error");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Authentication error").with_details(details));
    }

    tracing::debug!(has_code = query.code.is_some(), "sign-in callback received");
    Ok(Redirect::to(&state.auth.return_path))
}
