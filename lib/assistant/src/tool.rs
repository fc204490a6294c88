//! Tool registry.
//!
//! Tools are structured-output schemas offered to the model. The model
//! "calls" a tool by replying with arguments that match the schema; running
//! the tool validates those arguments and hands them back as the result.

use crate::error::ToolError;
use penwise_ai::ToolSpec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// The JSON type of a tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Free-form string.
    String,
    /// String restricted to the listed values.
    Enum(Vec<String>),
    /// String fixed to one value, used as a discriminator.
    Literal(String),
}

/// A named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub kind: ParameterKind,
    pub required: bool,
}

impl ParameterSpec {
    /// Creates a required string parameter.
    #[must_use]
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ParameterKind::String,
            required: true,
        }
    }

    /// Creates a required parameter restricted to `values`.
    #[must_use]
    pub fn one_of(
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ParameterKind::Enum(values.iter().map(|v| (*v).to_string()).collect()),
            required: true,
        }
    }

    /// Creates the `type` discriminator parameter fixed to `value`.
    #[must_use]
    pub fn discriminator(value: impl Into<String>) -> Self {
        Self {
            name: "type".to_string(),
            description: String::new(),
            kind: ParameterKind::Literal(value.into()),
            required: true,
        }
    }

    /// Marks this parameter as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn schema(&self) -> JsonValue {
        let mut schema = serde_json::json!({ "type": "string" });
        if !self.description.is_empty() {
            schema["description"] = JsonValue::String(self.description.clone());
        }
        match &self.kind {
            ParameterKind::String => {}
            ParameterKind::Enum(values) => schema["enum"] = serde_json::json!(values),
            ParameterKind::Literal(value) => schema["enum"] = serde_json::json!([value]),
        }
        schema
    }
}

/// Definition of a tool offered to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Named parameters, in declaration order.
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Renders the parameters as a JSON Schema object.
    #[must_use]
    pub fn input_schema(&self) -> JsonValue {
        let properties: serde_json::Map<String, JsonValue> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Converts to the provider-neutral spec sent with a model request.
    #[must_use]
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
        }
    }
}

/// A tool the model may call.
pub trait Tool: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Validates the model's arguments and returns the structured result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the arguments cannot be read.
    fn execute(&self, input: JsonValue) -> Result<JsonValue, ToolError>;
}

/// Ordered set of tools with unique names.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` when a tool with the same name exists.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), ToolError> {
        let name = tool.definition().name;
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateName { name });
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(Arc::new(tool));
        Ok(())
    }

    /// Gets a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).and_then(|&i| self.tools.get(i))
    }

    /// Returns all definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Returns the specs to advertise to the model, in registration order.
    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.definition().to_spec()).collect()
    }

    /// Runs the named tool.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown name, or the tool's own error.
    pub fn execute(&self, name: &str, input: JsonValue) -> Result<JsonValue, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;
        tool.execute(input)
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Reads tool arguments into `T`.
///
/// Anything other than a JSON object is rejected; field-level leniency is
/// up to `T`'s deserializer.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, input: JsonValue) -> Result<T, ToolError> {
    if !input.is_object() {
        return Err(ToolError::InvalidInput {
            name: tool.to_string(),
            reason: "arguments must be a JSON object".to_string(),
        });
    }
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput {
        name: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Serializes a tool result.
pub(crate) fn to_result<T: Serialize>(tool: &str, value: &T) -> Result<JsonValue, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::InvalidInput {
        name: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Deserializes any JSON value as a string; non-strings become `""`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => s,
        _ => String::new(),
    })
}

/// Like [`lenient_string`], but keeps absence distinguishable.
pub(crate) fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Some(s),
        _ => None,
    })
}
