//! Shared application state.
//!
//! Built once at startup from [`ServerConfig`] and injected into handlers
//! through axum `State`.

use crate::config::{AuthConfig, ServerConfig};
use penwise_ai::{
    AnthropicBackend, LlmBackend, LlmBackendConfig, LlmError, OpenAiCompatibleBackend,
};
use penwise_assistant::{
    Agent, Analyzer, AnalyzerSettings, ThreadManager, ThreadStore, ToolError,
    analyzer::ANALYZER_SYSTEM_PROMPT,
};
use std::fmt;
use std::sync::Arc;

/// Errors while assembling the application state.
#[derive(Debug)]
pub enum StartupError {
    /// A model backend could not be built.
    Backend(LlmError),
    /// A built-in tool registry is inconsistent.
    Tools(ToolError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "failed to build model backend: {err}"),
            Self::Tools(err) => write!(f, "failed to build tool registry: {err}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Shared application state.
pub struct AppState {
    /// Single-turn analyzer.
    pub analyzer: Analyzer,
    /// Conversation thread manager.
    pub threads: ThreadManager,
    /// Authentication callback settings.
    pub auth: AuthConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(analyzer: Analyzer, threads: ThreadManager, auth: AuthConfig) -> Self {
        Self {
            analyzer,
            threads,
            auth,
        }
    }

    /// Builds the state from configuration and a thread store.
    ///
    /// Missing credentials are not an error here: the affected endpoint
    /// answers with a configuration error instead.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured backend cannot be constructed.
    pub fn from_config(
        config: &ServerConfig,
        store: Arc<dyn ThreadStore>,
    ) -> Result<Self, StartupError> {
        let analyzer_backend = match ServerConfig::credential(&config.anthropic_api_key) {
            Some(key) => {
                let backend_config = LlmBackendConfig::anthropic(key, &config.analyzer.model)
                    .with_base_url(&config.analyzer.base_url)
                    .with_timeout_secs(config.request_timeout_seconds);
                let backend = AnthropicBackend::new(backend_config).map_err(StartupError::Backend)?;
                Some(Arc::new(backend) as Arc<dyn LlmBackend>)
            }
            None => {
                tracing::warn!("ANTHROPIC_API_KEY is not set; /analyze will report a configuration error");
                None
            }
        };

        let agent = match ServerConfig::credential(&config.groq_api_key) {
            Some(key) => {
                let backend_config = LlmBackendConfig::openai_compatible(
                    &config.agent.base_url,
                    key,
                    &config.agent.model,
                )
                .with_timeout_secs(config.request_timeout_seconds);
                let backend =
                    OpenAiCompatibleBackend::new(backend_config).map_err(StartupError::Backend)?;
                let mut agent = Agent::new(Arc::new(backend))
                    .map_err(StartupError::Tools)?
                    .with_history_limit(config.agent.history_limit);
                if let Some(instructions) = &config.agent.instructions {
                    agent = agent.with_instructions(instructions);
                }
                Some(agent)
            }
            None => {
                tracing::warn!("GROQ_API_KEY is not set; thread turns will report a configuration error");
                None
            }
        };

        let settings = AnalyzerSettings {
            system_prompt: ANALYZER_SYSTEM_PROMPT.to_string(),
            max_tokens: config.analyzer.max_tokens,
            temperature: config.analyzer.temperature,
        };
        let analyzer = Analyzer::new(analyzer_backend, settings).map_err(StartupError::Tools)?;

        Ok(Self::new(
            analyzer,
            ThreadManager::new(store, agent),
            config.auth.clone(),
        ))
    }
}
