use crate::analysis::{SOCIAL_PLATFORMS, SocialPostDraft};
use crate::error::ToolError;
use crate::tool::{ParameterSpec, Tool, ToolDefinition, parse_args, to_result};
use serde_json::Value as JsonValue;

const NAME: &str = "writeSocialMediaPost";

/// Social post drafting tool offered by the single-turn analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteSocialPostTool;

impl Tool for WriteSocialPostTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            NAME,
            "Write a social media post for X, LinkedIn, and BlueSky. \
             Make sure to follow the algorithm rules for each platform. Don't sound cringey.",
        )
        .with_parameter(ParameterSpec::one_of(
            "platform",
            "Platform to write the post for (X, LinkedIn, or BlueSky)",
            &SOCIAL_PLATFORMS,
        ))
        .with_parameter(ParameterSpec::string("message", "Message"))
    }

    fn execute(&self, input: JsonValue) -> Result<JsonValue, ToolError> {
        let draft: SocialPostDraft = parse_args(NAME, input)?;
        if !draft.has_known_platform() {
            tracing::warn!(platform = %draft.platform, "model chose an unsupported platform");
        }
        to_result(NAME, &draft)
    }
}
