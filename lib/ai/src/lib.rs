//! Model provider primitives for penwise.
//!
//! This crate provides:
//!
//! - **Backend**: the `LlmBackend` trait and the provider-neutral request and
//!   response types, including tool advertisement and tool-use content blocks
//! - **LLM Call**: single-shot invocation builder shared by the analyzer and
//!   the agent
//! - **Providers**: the Anthropic Messages API and OpenAI-compatible chat
//!   completions (Groq by default)

pub mod anthropic;
pub mod backend;
pub mod error;
pub mod llm_call;
pub mod openai_compat;

pub use anthropic::AnthropicBackend;
pub use backend::{
    ContentBlock, LlmBackend, LlmBackendConfig, LlmMessage, LlmProvider, LlmRequest, LlmResponse,
    MessageRole, TokenUsage, ToolSpec, ToolUse,
};
pub use error::LlmError;
pub use llm_call::{LlmCall, LlmCallConfig, LlmCallResult, LlmInvocationId};
pub use openai_compat::OpenAiCompatibleBackend;
