//! LLM Call primitive.
//!
//! Single-shot inference with an advertised tool set. Both the stateless
//! analyzer and the thread agent build one `LlmCall` per request and invoke
//! it exactly once; there are no retries.

use crate::backend::{LlmBackend, LlmMessage, LlmRequest, LlmResponse, ToolSpec};
use crate::error::LlmError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use ulid::Ulid;

/// Unique identifier for an LLM invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmInvocationId(Ulid);

impl LlmInvocationId {
    /// Creates a new invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LlmInvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LlmInvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "llm_{}", self.0)
    }
}

/// Configuration for an LLM Call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallConfig {
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Tools offered to the model.
    pub tools: Vec<ToolSpec>,
    /// Temperature for sampling.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmCallConfig {
    /// Creates a new LLM call configuration.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            tools: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// The result of an LLM Call.
#[derive(Debug, Clone)]
pub struct LlmCallResult {
    /// Unique identifier for this invocation.
    pub id: LlmInvocationId,
    /// The provider response.
    pub response: LlmResponse,
    /// When the call completed.
    pub timestamp: DateTime<Utc>,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// An LLM Call executor.
#[derive(Debug, Clone)]
pub struct LlmCall {
    config: LlmCallConfig,
    context: Vec<LlmMessage>,
}

impl LlmCall {
    /// Creates a new LLM Call with the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            config: LlmCallConfig::new(prompt),
            context: Vec::new(),
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.config.system_prompt = Some(system.into());
        self
    }

    /// Offers tools to the model.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.config.tools = tools;
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Adds earlier conversation turns.
    #[must_use]
    pub fn with_history(mut self, history: Vec<LlmMessage>) -> Self {
        self.context = history;
        self
    }

    /// Builds an LLM request from this configuration.
    #[must_use]
    pub fn build_request(&self) -> LlmRequest {
        let mut request = LlmRequest::new(self.config.prompt.clone())
            .with_context(self.context.clone())
            .with_tools(self.config.tools.clone());

        if let Some(ref system) = self.config.system_prompt {
            request = request.with_system(system.clone());
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        request
    }

    /// Sends the request to the backend once.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged.
    pub async fn invoke(&self, backend: &dyn LlmBackend) -> Result<LlmCallResult, LlmError> {
        let id = LlmInvocationId::new();
        let request = self.build_request();
        let started = Instant::now();

        tracing::debug!(
            invocation_id = %id,
            provider = backend.provider().as_str(),
            model = backend.model(),
            tools = request.tools.len(),
            history = request.context.len(),
            "invoking model"
        );

        let response = backend.generate(&request).await.inspect_err(|e| {
            tracing::warn!(invocation_id = %id, error = %e, "model call failed");
        })?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(
            invocation_id = %id,
            latency_ms,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model call completed"
        );

        Ok(LlmCallResult {
            id,
            response,
            timestamp: Utc::now(),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ContentBlock, LlmProvider, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingBackend {
        requests: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: vec![ContentBlock::Text {
                    text: "done".into(),
                }],
                usage: TokenUsage::default(),
                model: "recording".into(),
            })
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::Anthropic
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn llm_call_builder() {
        let call = LlmCall::new("Fix this email")
            .with_system_prompt("You are a helpful editor.")
            .with_temperature(0.7)
            .with_max_tokens(1000)
            .with_history(vec![LlmMessage::user("earlier")])
            .with_tools(vec![ToolSpec {
                name: "analyzeMessage".into(),
                description: "Analyze".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }]);

        let request = call.build_request();
        assert_eq!(request.prompt, "Fix this email");
        assert_eq!(request.system.as_deref(), Some("You are a helpful editor."));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.context.len(), 1);
        assert_eq!(request.tools[0].name, "analyzeMessage");
    }

    #[test]
    fn invocation_id_display() {
        let id = LlmInvocationId::new();
        assert!(id.to_string().starts_with("llm_"));
    }

    #[tokio::test]
    async fn invoke_sends_exactly_one_request() {
        let backend = RecordingBackend {
            requests: Mutex::new(Vec::new()),
        };
        let result = LlmCall::new("hello")
            .invoke(&backend)
            .await
            .expect("call succeeds");

        assert_eq!(result.response.text().as_deref(), Some("done"));
        assert_eq!(backend.requests.lock().unwrap().len(), 1);
    }
}
