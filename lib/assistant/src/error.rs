//! Error types for the assistant crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ToolError`: Errors from tool registration and execution
//! - `ThreadStoreError`: Errors from thread persistence
//! - `AnalyzeError`: Errors from the single-turn analyzer
//! - `ThreadError`: Errors from thread turns and listings
//!
//! Wrapped provider errors display as the provider error itself, so the
//! text reaching the HTTP layer is the raw failure description.

use penwise_ai::LlmError;
use penwise_core::ThreadId;
use std::fmt;

/// Errors from tool registration and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Tool not found.
    NotFound { name: String },
    /// Invalid tool input.
    InvalidInput { name: String, reason: String },
    /// A tool with this name is already registered.
    DuplicateName { name: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "tool not found: {name}"),
            Self::InvalidInput { name, reason } => {
                write!(f, "invalid input for tool '{name}': {reason}")
            }
            Self::DuplicateName { name } => {
                write!(f, "tool '{name}' is already registered")
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// Errors from thread persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadStoreError {
    /// The thread does not exist.
    ThreadNotFound { id: ThreadId },
    /// The pagination cursor does not name one of the user's threads.
    InvalidCursor { cursor: ThreadId },
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for ThreadStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadNotFound { id } => write!(f, "thread not found: {id}"),
            Self::InvalidCursor { cursor } => write!(f, "unknown pagination cursor: {cursor}"),
            Self::StorageFailed { reason } => write!(f, "thread storage failed: {reason}"),
        }
    }
}

impl std::error::Error for ThreadStoreError {}

/// Errors from the single-turn analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    /// The message was absent or empty.
    MessageRequired,
    /// No model credential is configured.
    MissingCredential,
    /// The model call failed.
    Llm(LlmError),
    /// The model replied with content the analyzer cannot read.
    MalformedResponse { reason: String },
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageRequired => write!(f, "message is required"),
            Self::MissingCredential => write!(f, "analyzer model credential is not configured"),
            Self::Llm(err) => write!(f, "{err}"),
            Self::MalformedResponse { reason } => {
                write!(f, "malformed model response: {reason}")
            }
        }
    }
}

impl std::error::Error for AnalyzeError {}

/// Errors from thread turns and listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// The prompt was empty.
    PromptRequired,
    /// The user id was empty.
    UserRequired,
    /// No thread with this id is visible to the caller.
    ThreadNotFound { id: String },
    /// The thread is archived and does not accept turns.
    ThreadArchived { id: ThreadId },
    /// No agent model is configured.
    AgentUnavailable,
    /// Thread persistence failed.
    Store(ThreadStoreError),
    /// The model call failed.
    Llm(LlmError),
    /// The requested tool could not run.
    Tool(ToolError),
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PromptRequired => write!(f, "prompt is required"),
            Self::UserRequired => write!(f, "user id is required"),
            Self::ThreadNotFound { id } => write!(f, "thread not found: {id}"),
            Self::ThreadArchived { id } => write!(f, "thread {id} is archived"),
            Self::AgentUnavailable => write!(f, "agent model credential is not configured"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Llm(err) => write!(f, "{err}"),
            Self::Tool(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ThreadError {}

impl From<ThreadStoreError> for ThreadError {
    fn from(err: ThreadStoreError) -> Self {
        Self::Store(err)
    }
}
