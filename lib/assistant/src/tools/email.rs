use super::Tagged;
use crate::analysis::EmailDraft;
use crate::error::ToolError;
use crate::tool::{ParameterSpec, Tool, ToolDefinition, parse_args, to_result};
use serde_json::Value as JsonValue;

const NAME: &str = "writeEmail";

fn email_parameters(definition: ToolDefinition) -> ToolDefinition {
    definition
        .with_parameter(ParameterSpec::string("recipient", "Recipient email address"))
        .with_parameter(ParameterSpec::string("subject", "Subject of the email"))
        .with_parameter(ParameterSpec::string("body", "Body of the email"))
}

/// Email drafting tool offered by the single-turn analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteEmailTool;

impl Tool for WriteEmailTool {
    fn definition(&self) -> ToolDefinition {
        email_parameters(ToolDefinition::new(
            NAME,
            "Write an email to the given recipient with the given subject and body. \
             Make sure to follow a friendly and professional tone. \
             Don't use -- in the email and avoid using complex words.",
        ))
    }

    fn execute(&self, input: JsonValue) -> Result<JsonValue, ToolError> {
        let draft: EmailDraft = parse_args(NAME, input)?;
        to_result(NAME, &draft)
    }
}

/// Email drafting tool offered by the thread agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailTool;

impl Tool for EmailTool {
    fn definition(&self) -> ToolDefinition {
        email_parameters(ToolDefinition::new(
            NAME,
            "Write an email in a friendly and professional tone.",
        ))
        .with_parameter(ParameterSpec::discriminator("email"))
    }

    fn execute(&self, input: JsonValue) -> Result<JsonValue, ToolError> {
        let draft: EmailDraft = parse_args(NAME, input)?;
        to_result(
            NAME,
            &Tagged {
                kind: "email",
                inner: &draft,
            },
        )
    }
}
