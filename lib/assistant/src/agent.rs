//! The thread agent: a model backend, standing instructions and a tool set.

use crate::error::{ThreadError, ToolError};
use crate::thread::ThreadMessage;
use crate::tool::ToolRegistry;
use crate::tools::agent_tools;
use penwise_ai::{LlmBackend, LlmCall};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Standing instructions for the thread agent.
pub const AGENT_INSTRUCTIONS: &str = "You are an expert AI assistant. \
    You help the user with writing emails, messages, social media posts, and blog posts.";

/// Number of earlier messages replayed to the model by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// One generated turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTurn {
    /// The model's text, if it produced any.
    pub text: Option<String>,
    /// Name of the tool the model called first.
    pub tool_name: Option<String>,
    /// Result of running that tool.
    pub tool_result: Option<JsonValue>,
}

/// Generates turns for conversation threads.
pub struct Agent {
    backend: Arc<dyn LlmBackend>,
    instructions: String,
    tools: ToolRegistry,
    history_limit: usize,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Agent {
    /// Creates an agent offering the built-in agent tools.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if the built-in registry is inconsistent.
    pub fn new(backend: Arc<dyn LlmBackend>) -> Result<Self, ToolError> {
        Ok(Self {
            backend,
            instructions: AGENT_INSTRUCTIONS.to_string(),
            tools: agent_tools()?,
            history_limit: DEFAULT_HISTORY_LIMIT,
            temperature: None,
            max_tokens: None,
        })
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Generates one turn from the thread history and a new prompt.
    ///
    /// When the model calls tools, only the first call is run.
    ///
    /// # Errors
    ///
    /// Returns `Llm` when the model call fails and `Tool` when the requested
    /// tool is unknown or its arguments cannot be read.
    pub async fn generate(
        &self,
        history: &[ThreadMessage],
        prompt: &str,
    ) -> Result<AgentTurn, ThreadError> {
        let mut call = LlmCall::new(prompt)
            .with_system_prompt(self.instructions.clone())
            .with_tools(self.tools.specs())
            .with_history(history.iter().map(ThreadMessage::to_llm_message).collect());
        if let Some(temperature) = self.temperature {
            call = call.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            call = call.with_max_tokens(max_tokens);
        }

        let result = call
            .invoke(self.backend.as_ref())
            .await
            .map_err(ThreadError::Llm)?;

        let mut turn = AgentTurn {
            text: result.response.text(),
            ..AgentTurn::default()
        };

        if let Some(tool_use) = result.response.first_tool_use() {
            tracing::debug!(tool = %tool_use.name, "running requested tool");
            let output = self
                .tools
                .execute(&tool_use.name, tool_use.input.clone())
                .map_err(ThreadError::Tool)?;
            turn.tool_name = Some(tool_use.name.clone());
            turn.tool_result = Some(output);
        }

        Ok(turn)
    }
}
