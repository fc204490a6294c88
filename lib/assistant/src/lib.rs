//! Assistant services for penwise.
//!
//! This crate provides:
//!
//! - **Tool Registry**: the tools offered to the model and the tolerant
//!   validation of the arguments it sends back
//! - **Analyzer**: the stateless single-turn message analysis
//! - **Agent**: model + instructions + tools used to generate a turn
//! - **Thread Manager**: user-scoped thread creation and continuation
//! - **Thread Store**: persistence contract plus an in-memory implementation

pub mod agent;
pub mod analysis;
pub mod analyzer;
pub mod error;
pub mod manager;
pub mod store;
pub mod thread;
pub mod tool;
pub mod tools;

pub use agent::{Agent, AgentTurn};
pub use analysis::{AnalysisResult, EmailDraft, SocialPostDraft};
pub use analyzer::{Analyzer, AnalyzerSettings};
pub use error::{AnalyzeError, ThreadError, ThreadStoreError, ToolError};
pub use manager::{ThreadManager, TurnRequest, TurnResult};
pub use store::{ListThreadsQuery, MemoryThreadStore, ThreadStore};
pub use thread::{NewThread, Thread, ThreadMessage, ThreadStatus};
pub use tool::{ParameterKind, ParameterSpec, Tool, ToolDefinition, ToolRegistry};
