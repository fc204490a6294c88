//! OpenAI-compatible chat completions backend.
//!
//! Used for the thread agent. Groq is the default host; any provider that
//! speaks the `/chat/completions` function-calling dialect works.

use crate::backend::{
    ContentBlock, LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse, TokenUsage,
    ToolUse,
};
use crate::error::{LlmError, provider_error_message};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Default Groq OpenAI-compatible endpoint.
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Backend for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    config: LlmBackendConfig,
    api_key: String,
}

impl OpenAiCompatibleBackend {
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
        let mut messages: Vec<JsonValue> = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.extend(request.messages().into_iter().map(|m| {
            serde_json::json!({
                "role": m.role,
                "content": m.content,
            })
        }));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            let tools: Vec<JsonValue> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            body["tools"] = JsonValue::Array(tools);
        }

        body
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: String,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

/// Decodes function arguments. Absent, blank or `null` arguments become an
/// empty object so the tool fills in its defaults.
fn decode_arguments(arguments: Option<String>) -> JsonValue {
    let Some(raw) = arguments.filter(|a| !a.trim().is_empty()) else {
        return JsonValue::Object(serde_json::Map::new());
    };
    match serde_json::from_str(&raw) {
        Ok(JsonValue::Null) => JsonValue::Object(serde_json::Map::new()),
        Ok(value) => value,
        Err(_) => JsonValue::String(raw),
    }
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Parses a chat completion body.
///
/// Function arguments arrive as a JSON-encoded string; when that string is
/// not valid JSON it is kept verbatim as a string value so tool validation
/// can reject it with the tool's name attached.
fn parse_response(body: &str) -> Result<LlmResponse, LlmError> {
    let parsed: ChatCompletion =
        serde_json::from_str(body).map_err(|e| LlmError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let mut content = Vec::new();
    if let Some(choice) = parsed.choices.into_iter().next() {
        if let Some(text) = choice.message.content {
            content.push(ContentBlock::Text { text });
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            let input = decode_arguments(call.function.arguments);
            content.push(ContentBlock::ToolUse(ToolUse {
                id: call.id,
                name: call.function.name,
                input,
            }));
        }
    }

    Ok(LlmResponse {
        content,
        usage: parsed
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default(),
        model: parsed.model,
    })
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/chat/completions", self.config.trimmed_base_url());
        let body = self.build_request_body(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
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
        LlmProvider::OpenAiCompatible
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LlmMessage, ToolSpec};

    fn backend() -> OpenAiCompatibleBackend {
        OpenAiCompatibleBackend::new(LlmBackendConfig::openai_compatible(
            GROQ_API_URL,
            "gsk-test",
            "llama3-8b-8192",
        ))
        .expect("backend")
    }

    #[test]
    fn request_body_puts_system_first_and_wraps_tools() {
        let request = LlmRequest::new("draft an email to sam")
            .with_system("You are an assistant.")
            .with_context(vec![LlmMessage::user("hi"), LlmMessage::assistant("hello")])
            .with_tools(vec![ToolSpec {
                name: "writeEmail".into(),
                description: "Write an email".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }]);

        let body = backend().build_request_body(&request);
        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[3]["content"], "draft an email to sam");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "writeEmail");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn parses_tool_calls_with_string_arguments() {
        let body = r#"{
            "model": "llama3-8b-8192",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "writeEmail",
                            "arguments": "{\"recipient\":\"sam@example.com\",\"subject\":\"Hi\",\"body\":\"Hello\",\"type\":\"email\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}
        }"#;

        let response = parse_response(body).expect("parse");
        assert!(response.text().is_none());
        let call = response.first_tool_use().expect("tool call");
        assert_eq!(call.name, "writeEmail");
        assert_eq!(call.input["recipient"], "sam@example.com");
        assert_eq!(response.usage.total(), 42);
    }

    #[test]
    fn unparseable_arguments_are_kept_as_string() {
        let body = r#"{"choices":[{"message":{"tool_calls":[{"id":"c","function":{"name":"writeEmail","arguments":"{oops"}}]}}]}"#;
        let response = parse_response(body).expect("parse");
        assert_eq!(
            response.first_tool_use().map(|t| t.input.clone()),
            Some(JsonValue::String("{oops".into()))
        );
    }

    #[test]
    fn empty_or_null_arguments_become_an_empty_object() {
        for arguments in [r#""""#, r#""  ""#, "null", r#""null""#] {
            let body = format!(
                r#"{{"choices":[{{"message":{{"tool_calls":[{{"id":"c","function":{{"name":"writeEmail","arguments":{arguments}}}}}]}}}}]}}"#
            );
            let response = parse_response(&body).expect("parse");
            assert_eq!(
                response.first_tool_use().map(|t| t.input.clone()),
                Some(serde_json::json!({})),
                "{arguments}"
            );
        }

        let body = r#"{"choices":[{"message":{"tool_calls":[{"id":"c","function":{"name":"writeEmail"}}]}}]}"#;
        let response = parse_response(body).expect("parse");
        assert_eq!(
            response.first_tool_use().map(|t| t.input.clone()),
            Some(serde_json::json!({}))
        );
    }

    #[test]
    fn plain_text_reply() {
        let body = r#"{"model":"m","choices":[{"message":{"content":"Sure, here you go."}}]}"#;
        let response = parse_response(body).expect("parse");
        assert_eq!(response.text().as_deref(), Some("Sure, here you go."));
        assert_eq!(response.tool_uses().count(), 0);
    }
}
