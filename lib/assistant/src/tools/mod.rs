//! Built-in tools and the registries that offer them.
//!
//! The analyzer offers three untagged tools. The thread agent offers two
//! tools whose results carry a `type` discriminator so clients can tell an
//! analysis from an email draft.

mod analyze;
mod email;
mod social;

pub use analyze::{AnalyzeMessageTool, AnalyzeTool};
pub use email::{EmailTool, WriteEmailTool};
pub use social::WriteSocialPostTool;

use crate::error::ToolError;
use crate::tool::ToolRegistry;
use serde::Serialize;

/// A tool result tagged with its discriminator.
#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    inner: &'a T,
}

/// Tools offered by the single-turn analyzer.
///
/// # Errors
///
/// Returns `DuplicateName` if two built-in tools share a name.
pub fn analyzer_tools() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(AnalyzeMessageTool)?;
    registry.register(WriteEmailTool)?;
    registry.register(WriteSocialPostTool)?;
    Ok(registry)
}

/// Tools offered by the thread agent.
///
/// # Errors
///
/// Returns `DuplicateName` if two built-in tools share a name.
pub fn agent_tools() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(AnalyzeTool)?;
    registry.register(EmailTool)?;
    Ok(registry)
}
