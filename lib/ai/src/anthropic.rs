//! Anthropic Messages API backend.

use crate::backend::{
    ContentBlock, LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse, TokenUsage,
    ToolUse,
};
use crate::error::{LlmError, provider_error_message};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Default Anthropic API endpoint.
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic's API requires `max_tokens`; used when the request leaves it unset.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Backend for the Anthropic Messages API.
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: LlmBackendConfig,
    api_key: String,
}

impl AnthropicBackend {
    /// Creates a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` when no API key is configured and
    /// `InvalidConfig` when the HTTP client cannot be built.
    pub fn new(config: LlmBackendConfig) -> Result<Self, LlmError> {
        let api_key = config.require_api_key()?;
        let client = config.http_client()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn build_request_body(&self, request: &LlmRequest) -> JsonValue {
        let messages: Vec<JsonValue> = request
            .messages()
            .into_iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role,
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": messages,
        });

        if let Some(ref system) = request.system {
            body["system"] = JsonValue::String(system.clone());
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if !request.tools.is_empty() {
            let tools: Vec<JsonValue> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    })
                })
                .collect();
            body["tools"] = JsonValue::Array(tools);
        }

        body
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ApiContent>,
    #[serde(default)]
    model: String,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: JsonValue,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Parses a Messages API response body.
fn parse_response(body: &str) -> Result<LlmResponse, LlmError> {
    let parsed: MessagesResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let content = parsed
        .content
        .into_iter()
        .filter_map(|c| match c.content_type.as_str() {
            "text" => Some(ContentBlock::Text { text: c.text }),
            "tool_use" => Some(ContentBlock::ToolUse(ToolUse {
                id: c.id.unwrap_or_default(),
                name: c.name.unwrap_or_default(),
                input: c.input,
            })),
            other => {
                tracing::debug!(content_type = other, "skipping unsupported content block");
                None
            }
        })
        .collect();

    Ok(LlmResponse {
        content,
        usage: parsed
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            })
            .unwrap_or_default(),
        model: parsed.model,
    })
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/messages", self.config.trimmed_base_url());
        let body = self.build_request_body(request);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = retry_after_secs(response.headers());
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::from_status(
                status.as_u16(),
                provider_error_message(&text),
                retry_after,
            ));
        }

        parse_response(&text)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
