//! Single-turn message analyzer.
//!
//! One message in, one model call with the analyzer tool set, and a
//! normalized four-field analysis out. Nothing is persisted.

use crate::analysis::AnalysisResult;
use crate::error::{AnalyzeError, ToolError};
use crate::tool::ToolRegistry;
use crate::tools::analyzer_tools;
use penwise_ai::{LlmBackend, LlmCall, LlmResponse};
use std::sync::Arc;
use tracing::instrument;

/// System prompt sent with every analysis.
pub const ANALYZER_SYSTEM_PROMPT: &str = "You are an expert AI assistant. Your goal is to help the user complete their tasks. These tasks include writing emails, messages, social media posts, and blog posts.

When using the analyzeMessage tool, you MUST provide all required fields:
- formatted: The improved version of the message
- tone: Analysis of the message's tone and suggestions for improvement
- clarity: Specific clarity improvements
- grammarIssues: Any grammar issues found and their corrections

Do not skip any of these fields when using the analyzeMessage tool.";

/// Sampling settings for analysis calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            system_prompt: ANALYZER_SYSTEM_PROMPT.to_string(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Stateless analyzer service.
pub struct Analyzer {
    backend: Option<Arc<dyn LlmBackend>>,
    tools: ToolRegistry,
    settings: AnalyzerSettings,
}

impl Analyzer {
    /// Creates an analyzer offering the built-in analyzer tools.
    ///
    /// A `None` backend means no credential is configured; every analysis
    /// then fails with `MissingCredential`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if the built-in registry is inconsistent.
    pub fn new(
        backend: Option<Arc<dyn LlmBackend>>,
        settings: AnalyzerSettings,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            backend,
            tools: analyzer_tools()?,
            settings,
        })
    }

    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Analyzes a message.
    ///
    /// # Errors
    ///
    /// - `MessageRequired` for an absent or blank message, before any model call
    /// - `MissingCredential` when no backend is configured
    /// - `Llm` when the model call fails
    /// - `MalformedResponse` for empty content or a non-object tool input
    #[instrument(skip_all, fields(message_len = message.map(str::len)))]
    pub async fn analyze(
        &self,
        message: Option<&str>,
    ) -> penwise_core::Result<AnalysisResult, AnalyzeError> {
        let message = match message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return Err(AnalyzeError::MessageRequired.into()),
        };

        let Some(backend) = self.backend.as_deref() else {
            tracing::error!("analyzer has no model credential configured");
            return Err(AnalyzeError::MissingCredential.into());
        };

        let result = LlmCall::new(message)
            .with_system_prompt(self.settings.system_prompt.clone())
            .with_tools(self.tools.specs())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
            .invoke(backend)
            .await
            .map_err(AnalyzeError::Llm)?;

        tracing::debug!(
            invocation_id = %result.id,
            latency_ms = result.latency_ms,
            content = ?result.response.content,
            "raw analyzer output"
        );

        Ok(extract_analysis(&result.response)?)
    }
}

/// Reads the analysis from the first tool-use block of a reply.
fn extract_analysis(response: &LlmResponse) -> Result<AnalysisResult, AnalyzeError> {
    if response.content.is_empty() {
        return Err(AnalyzeError::MalformedResponse {
            reason: "reply has no content".to_string(),
        });
    }

    let Some(tool_use) = response.first_tool_use() else {
        tracing::warn!("model replied without a tool call, returning an empty analysis");
        return Ok(AnalysisResult::default());
    };

    if !tool_use.input.is_object() {
        return Err(AnalyzeError::MalformedResponse {
            reason: format!("input of tool '{}' is not an object", tool_use.name),
        });
    }

    if tool_use.name != "analyzeMessage" {
        tracing::debug!(tool = %tool_use.name, "model answered with a different tool");
    }

    Ok(AnalysisResult::normalize(&tool_use.input).without_rewrite())
}
