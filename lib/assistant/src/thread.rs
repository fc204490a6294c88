//! Conversation threads and their messages.

use chrono::{DateTime, Utc};
use penwise_ai::{LlmMessage, MessageRole};
use penwise_core::{MessageId, ThreadId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

const TITLE_MAX_CHARS: usize = 50;

/// Thread lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    #[default]
    Active,
    Archived,
}

impl ThreadStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown thread status: {other}")),
        }
    }
}

/// A user-scoped conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: ThreadStatus,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    /// Builds an active thread from creation parameters.
    #[must_use]
    pub fn new(new: NewThread) -> Self {
        Self {
            id: ThreadId::new(),
            user_id: new.user_id,
            title: new.title,
            summary: new.summary,
            status: ThreadStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }
}

/// Parameters for creating a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub user_id: UserId,
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl NewThread {
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            title: None,
            summary: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Derives a thread title from the first prompt.
///
/// Prompts longer than 50 characters are cut to 47 and ellipsized.
#[must_use]
pub fn title_from_prompt(prompt: &str) -> Option<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return None;
    }
    if prompt.chars().count() <= TITLE_MAX_CHARS {
        return Some(prompt.to_string());
    }
    let cut: String = prompt.chars().take(TITLE_MAX_CHARS - 3).collect();
    Some(format!("{}...", cut.trim_end()))
}

/// One persisted message of a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl ThreadMessage {
    #[must_use]
    pub fn user(thread_id: ThreadId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            thread_id,
            role: MessageRole::User,
            content: content.into(),
            tool_result: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn assistant(
        thread_id: ThreadId,
        content: impl Into<String>,
        tool_result: Option<JsonValue>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            thread_id,
            role: MessageRole::Assistant,
            content: content.into(),
            tool_result,
            created_at: Utc::now(),
        }
    }

    /// Converts to a model history message.
    ///
    /// Assistant turns that only produced a tool result replay that result
    /// as JSON text so the model sees what it drafted.
    #[must_use]
    pub fn to_llm_message(&self) -> LlmMessage {
        let content = match (&self.tool_result, self.content.is_empty()) {
            (Some(result), true) => result.to_string(),
            (Some(result), false) => format!("{}\n{result}", self.content),
            (None, _) => self.content.clone(),
        };
        LlmMessage {
            role: self.role,
            content,
        }
    }
}
