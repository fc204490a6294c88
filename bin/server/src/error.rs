//! HTTP error mapping.
//!
//! Service reports are mapped to a status code and a client-safe JSON body
//! `{ "error": ..., "details": ... }` by inspecting the report's current
//! context. Provider failures are classified by their description.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use penwise_ai::LlmError;
use penwise_assistant::{AnalyzeError, ThreadError, ThreadStoreError, ToolError};
use rootcause::prelude::Report;
use serde::Serialize;
use std::fmt;

/// An error rendered as a JSON response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub details: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, error: &'static str) -> Self {
        Self {
            status,
            error,
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Classifies a provider failure from its description.
    ///
    /// Matching is case-insensitive and checked in this order: rate limit,
    /// unauthorized, invalid request. The description is returned as
    /// `details`.
    #[must_use]
    pub fn from_provider_failure(description: &str) -> Self {
        let lowered = description.to_lowercase();
        let (status, error) = if lowered.contains("rate limit") {
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")
        } else if lowered.contains("unauthorized") {
            (StatusCode::UNAUTHORIZED, "Authentication error")
        } else if lowered.contains("invalid request") {
            (StatusCode::BAD_REQUEST, "Invalid request")
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        };
        Self::new(status, error).with_details(description)
    }

    fn configuration() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error")
    }

    fn from_llm(err: &LlmError) -> Self {
        Self::from_provider_failure(&err.to_string())
    }

    fn from_tool(err: &ToolError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            .with_details(err.to_string())
    }

    fn from_store(err: &ThreadStoreError) -> Self {
        match err {
            ThreadStoreError::InvalidCursor { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid cursor")
            }
            ThreadStoreError::ThreadNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Thread not found")
            }
            ThreadStoreError::StorageFailed { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{} ({}): {}", self.error, self.status, details),
            None => write!(f, "{} ({})", self.error, self.status),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<Report<AnalyzeError>> for ApiError {
    fn from(report: Report<AnalyzeError>) -> Self {
        let api = match report.current_context() {
            AnalyzeError::MessageRequired => {
                Self::new(StatusCode::BAD_REQUEST, "Message is required")
            }
            AnalyzeError::MissingCredential => Self::configuration(),
            AnalyzeError::Llm(err) => Self::from_llm(err),
            AnalyzeError::MalformedResponse { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Empty or invalid response from model",
            ),
        };
        log_failure(&api, &report);
        api
    }
}

impl From<Report<ThreadError>> for ApiError {
    fn from(report: Report<ThreadError>) -> Self {
        let api = match report.current_context() {
            ThreadError::PromptRequired => Self::new(StatusCode::BAD_REQUEST, "Prompt is required"),
            ThreadError::UserRequired => Self::new(StatusCode::BAD_REQUEST, "userId is required"),
            ThreadError::ThreadNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Thread not found")
            }
            ThreadError::ThreadArchived { .. } => {
                Self::new(StatusCode::CONFLICT, "Thread is archived")
            }
            ThreadError::AgentUnavailable => Self::configuration(),
            ThreadError::Store(err) => Self::from_store(err),
            ThreadError::Llm(err) => Self::from_llm(err),
            ThreadError::Tool(err) => Self::from_tool(err),
        };
        log_failure(&api, &report);
        api
    }
}

fn log_failure<C>(api: &ApiError, report: &Report<C>)
where
    Report<C>: fmt::Display,
{
    if api.status.is_server_error() || api.details.is_some() {
        tracing::error!(status = %api.status, error = %report, "request failed");
    } else {
        tracing::debug!(status = %api.status, error = %report, "request rejected");
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}
