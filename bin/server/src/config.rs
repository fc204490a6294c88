//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested
//! sections use `__` as separator, e.g. `ANALYZER__MODEL` or
//! `AGENT__HISTORY_LIMIT`.

use penwise_ai::anthropic::ANTHROPIC_API_URL;
use penwise_ai::backend::DEFAULT_TIMEOUT_SECS;
use penwise_ai::openai_compat::GROQ_API_URL;
use penwise_assistant::agent::DEFAULT_HISTORY_LIMIT;
use serde::Deserialize;
use std::fmt;

/// Server configuration.
#[derive(Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection URL. Threads are kept in memory when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Credential for the analyzer model.
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Credential for the thread agent model.
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// Deadline for each outbound model call, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &redacted(&self.database_url))
            .field("anthropic_api_key", &redacted(&self.anthropic_api_key))
            .field("groq_api_key", &redacted(&self.groq_api_key))
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("analyzer", &self.analyzer)
            .field("agent", &self.agent)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Single-turn analyzer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_analyzer_model")]
    pub model: String,

    #[serde(default = "default_analyzer_base_url")]
    pub base_url: String,

    #[serde(default = "default_analyzer_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_analyzer_temperature")]
    pub temperature: f32,
}

fn default_analyzer_model() -> String {
    "claude-3-opus-20240229".to_string()
}

fn default_analyzer_base_url() -> String {
    ANTHROPIC_API_URL.to_string()
}

fn default_analyzer_max_tokens() -> u32 {
    1000
}

fn default_analyzer_temperature() -> f32 {
    0.7
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: default_analyzer_model(),
            base_url: default_analyzer_base_url(),
            max_tokens: default_analyzer_max_tokens(),
            temperature: default_analyzer_temperature(),
        }
    }
}

/// Thread agent settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_model")]
    pub model: String,

    /// OpenAI-compatible endpoint; Groq by default.
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,

    /// Number of earlier thread messages replayed to the model.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Replaces the built-in agent instructions when set.
    #[serde(default)]
    pub instructions: Option<String>,
}

fn default_agent_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_agent_base_url() -> String {
    GROQ_API_URL.to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_agent_model(),
            base_url: default_agent_base_url(),
            history_limit: default_history_limit(),
            instructions: None,
        }
    }
}

/// Authentication callback settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Where a successful sign-in is redirected to.
    #[serde(default = "default_return_path")]
    pub return_path: String,
}

fn default_return_path() -> String {
    "/".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            return_path: default_return_path(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_builder(config::Config::builder().add_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        ))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Returns the credential if it is set and not blank.
    #[must_use]
    pub fn credential(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}
