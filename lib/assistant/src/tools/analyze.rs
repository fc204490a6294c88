use super::Tagged;
use crate::analysis::AnalysisResult;
use crate::error::ToolError;
use crate::tool::{ParameterSpec, Tool, ToolDefinition, parse_args, to_result};
use serde_json::Value as JsonValue;

const NAME: &str = "analyzeMessage";

const ANALYZER_DESCRIPTION: &str = r#"Analyze the given message and provide improvements in the following areas:
1. Formatting: Improve the message structure and formatting
2. Tone: Suggest appropriate tone adjustments
3. Clarity: Identify and fix clarity issues
4. Grammar: Point out any grammar issues

Provide your analysis in JSON format with these exact keys:
{
  "formatted": "formatted message here",
  "tone": "tone analysis here",
  "clarity": "clarity improvements here",
  "grammarIssues": "grammar issues here"
}"#;

fn analysis_parameters(definition: ToolDefinition) -> ToolDefinition {
    definition
        .with_parameter(ParameterSpec::string("formatted", "Formatted message"))
        .with_parameter(ParameterSpec::string("tone", "Tone analysis"))
        .with_parameter(ParameterSpec::string("clarity", "Clarity improvements"))
        .with_parameter(ParameterSpec::string("grammarIssues", "Grammar issues"))
}

/// Analysis tool offered by the single-turn analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeMessageTool;

impl Tool for AnalyzeMessageTool {
    fn definition(&self) -> ToolDefinition {
        analysis_parameters(ToolDefinition::new(NAME, ANALYZER_DESCRIPTION))
    }

    fn execute(&self, input: JsonValue) -> Result<JsonValue, ToolError> {
        let analysis: AnalysisResult = parse_args(NAME, input)?;
        to_result(NAME, &analysis.without_rewrite())
    }
}

/// Analysis tool offered by the thread agent; adds a rewritten message.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeTool;

impl Tool for AnalyzeTool {
    fn definition(&self) -> ToolDefinition {
        analysis_parameters(ToolDefinition::new(
            NAME,
            "Analyze a message and improve formatting, tone, clarity, and grammar.",
        ))
        .with_parameter(ParameterSpec::string(
            "rewrittenMessage",
            "The message rewritten with all improvements applied",
        ))
        .with_parameter(ParameterSpec::discriminator("analyze"))
    }

    fn execute(&self, input: JsonValue) -> Result<JsonValue, ToolError> {
        let mut analysis: AnalysisResult = parse_args(NAME, input)?;
        analysis.rewritten_message.get_or_insert_with(String::new);
        to_result(
            NAME,
            &Tagged {
                kind: "analyze",
                inner: &analysis,
            },
        )
    }
}
