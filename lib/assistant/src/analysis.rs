//! Structured outputs the model produces through tool calls.
//!
//! Every string field is read leniently: an absent or non-string value
//! becomes `""`, so a partially compliant model reply still yields a
//! complete value.

use crate::tool::{lenient_optional_string, lenient_string};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Social platforms a post can be drafted for.
pub const SOCIAL_PLATFORMS: [&str; 3] = ["X", "LinkedIn", "BlueSky"];

/// Tone, clarity and grammar analysis of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub formatted: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub clarity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grammar_issues: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub rewritten_message: Option<String>,
}

impl AnalysisResult {
    /// Normalizes a tool-call input into an analysis.
    ///
    /// Non-object inputs normalize to the empty analysis. Applying this to
    /// its own serialized output returns the same value.
    #[must_use]
    pub fn normalize(input: &JsonValue) -> Self {
        if !input.is_object() {
            return Self::default();
        }
        Self::deserialize(input).unwrap_or_default()
    }

    /// Drops the rewritten message, leaving the four analysis fields.
    #[must_use]
    pub fn without_rewrite(mut self) -> Self {
        self.rewritten_message = None;
        self
    }
}

/// A drafted email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipient: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub body: String,
}

/// A drafted social media post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPostDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
}

impl SocialPostDraft {
    /// Whether the platform is one of [`SOCIAL_PLATFORMS`].
    #[must_use]
    pub fn has_known_platform(&self) -> bool {
        SOCIAL_PLATFORMS.contains(&self.platform.as_str())
    }
}
