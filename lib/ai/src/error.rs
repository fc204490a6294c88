//! Error types for the AI crate.
//!
//! `LlmError` covers every failure of a backend call. The `Display` text of
//! the provider-status variants carries the phrases the HTTP layer classifies
//! on ("rate limit", "unauthorized", "invalid request").

use std::fmt;

/// Errors from LLM backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// No credential configured for the provider.
    MissingCredential { provider: String },
    /// Request could not be sent or the provider failed.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Provider rejected the credential.
    Unauthorized { reason: String },
    /// Provider rejected the request shape.
    InvalidRequest { reason: String },
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl LlmError {
    /// Maps a non-success provider status to an error.
    #[must_use]
    pub fn from_status(status: u16, reason: String, retry_after_secs: Option<u64>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after_secs },
            401 | 403 => Self::Unauthorized { reason },
            400 | 413 | 422 => Self::InvalidRequest { reason },
            _ => Self::RequestFailed {
                reason: format!("provider returned {status}: {reason}"),
            },
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential { provider } => {
                write!(f, "no API key configured for provider '{provider}'")
            }
            Self::RequestFailed { reason } => {
                write!(f, "LLM request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::Timeout => write!(f, "LLM request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limit exceeded, retry after {secs}s")
                } else {
                    write!(f, "rate limit exceeded")
                }
            }
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid LLM configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::ResponseParseFailed {
                reason: err.to_string(),
            }
        } else {
            Self::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}

/// Pulls a human-readable message out of a provider error body.
///
/// Both Anthropic and OpenAI-compatible APIs nest it under `error.message`;
/// anything else is returned as-is.
pub(crate) fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
