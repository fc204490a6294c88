//! Conversation thread manager.
//!
//! Creates or resumes a user's thread, asks the agent for one turn and
//! records the exchange. Threads belonging to someone else are reported
//! exactly like missing ones.

use crate::agent::Agent;
use crate::error::ThreadError;
use crate::store::{ListThreadsQuery, ThreadStore};
use crate::thread::{NewThread, Thread, ThreadMessage, ThreadStatus, title_from_prompt};
use penwise_core::{ThreadId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::instrument;

/// A request to run one turn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub user_id: UserId,
    /// Thread to continue; a new thread is created when absent.
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// The outcome of one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub thread_id: ThreadId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<JsonValue>,
}

/// Runs turns against user-scoped threads.
pub struct ThreadManager {
    store: Arc<dyn ThreadStore>,
    agent: Option<Agent>,
}

impl ThreadManager {
    /// Creates a manager. Without an agent every turn fails with
    /// `AgentUnavailable`; listing still works.
    #[must_use]
    pub fn new(store: Arc<dyn ThreadStore>, agent: Option<Agent>) -> Self {
        Self { store, agent }
    }

    /// Runs one turn, creating the thread when no id is given.
    ///
    /// A new thread is stored only once the model turn has succeeded.
    ///
    /// # Errors
    ///
    /// - `PromptRequired` / `UserRequired` for blank input
    /// - `AgentUnavailable` when no agent is configured
    /// - `ThreadNotFound` for an unknown, malformed or foreign thread id
    /// - `ThreadArchived` for an archived thread
    /// - `Llm`, `Tool` or `Store` when a collaborator fails
    #[instrument(skip_all, fields(user_id = %request.user_id, thread_id = ?request.thread_id))]
    pub async fn run_turn(
        &self,
        request: TurnRequest,
    ) -> penwise_core::Result<TurnResult, ThreadError> {
        if request.prompt.trim().is_empty() {
            return Err(ThreadError::PromptRequired.into());
        }
        if request.user_id.is_blank() {
            return Err(ThreadError::UserRequired.into());
        }
        let Some(agent) = self.agent.as_ref() else {
            tracing::error!("thread agent has no model credential configured");
            return Err(ThreadError::AgentUnavailable.into());
        };

        let (thread, history, turn) = match request.thread_id.as_deref() {
            None => {
                let turn = agent.generate(&[], &request.prompt).await?;
                let new = NewThread::for_user(request.user_id.clone())
                    .with_title(title_from_prompt(&request.prompt));
                let thread = self.store.create(new).await.map_err(ThreadError::Store)?;
                tracing::info!(thread_id = %thread.id, "created thread");
                (thread, Vec::new(), turn)
            }
            Some(raw) => {
                let thread = self.resume(raw, &request.user_id).await?;
                let history = self
                    .store
                    .recent_messages(thread.id, agent.history_limit())
                    .await
                    .map_err(ThreadError::Store)?;
                let turn = agent.generate(&history, &request.prompt).await?;
                (thread, history, turn)
            }
        };

        let exchange = [
            ThreadMessage::user(thread.id, request.prompt),
            ThreadMessage::assistant(
                thread.id,
                turn.text.clone().unwrap_or_default(),
                turn.tool_result.clone(),
            ),
        ];
        self.store
            .append_messages(thread.id, &exchange)
            .await
            .map_err(ThreadError::Store)?;

        tracing::debug!(
            thread_id = %thread.id,
            tool = ?turn.tool_name,
            history = history.len(),
            "turn completed"
        );

        Ok(TurnResult {
            thread_id: thread.id,
            text: turn.text,
            tool_results: turn.tool_result,
        })
    }

    /// Lists a user's threads, newest first.
    ///
    /// # Errors
    ///
    /// Returns `UserRequired` for a blank user id and `Store` when the
    /// listing fails.
    #[instrument(skip(self, query), fields(user_id = %user_id))]
    pub async fn list_threads(
        &self,
        user_id: &UserId,
        query: &ListThreadsQuery,
    ) -> penwise_core::Result<Vec<Thread>, ThreadError> {
        if user_id.is_blank() {
            return Err(ThreadError::UserRequired.into());
        }
        Ok(self
            .store
            .list_by_user(user_id, query)
            .await
            .map_err(ThreadError::Store)?)
    }

    async fn resume(&self, raw: &str, user_id: &UserId) -> Result<Thread, ThreadError> {
        let not_found = || ThreadError::ThreadNotFound { id: raw.to_string() };

        let id: ThreadId = raw.parse().map_err(|_| not_found())?;
        let thread = self.store.get(id).await?.ok_or_else(not_found)?;

        if !thread.is_owned_by(user_id) {
            tracing::warn!(thread_id = %id, "thread requested by a user who does not own it");
            return Err(not_found());
        }
        if thread.status == ThreadStatus::Archived {
            return Err(ThreadError::ThreadArchived { id });
        }
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::store::MemoryThreadStore;
    use async_trait::async_trait;
    use penwise_ai::{
        ContentBlock, LlmBackend, LlmError, LlmProvider, LlmRequest, LlmResponse, TokenUsage,
        ToolUse,
    };
    use std::sync::Mutex;

    struct ScriptedBackend {
        content: Vec<ContentBlock>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: self.content.clone(),
                usage: TokenUsage::default(),
                model: "scripted".into(),
            })
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::OpenAiCompatible
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    struct Fixture {
        manager: ThreadManager,
        store: Arc<MemoryThreadStore>,
        backend: Arc<ScriptedBackend>,
    }

    fn fixture(content: Vec<ContentBlock>) -> Fixture {
        let store = Arc::new(MemoryThreadStore::new());
        let backend = Arc::new(ScriptedBackend {
            content,
            requests: Mutex::new(Vec::new()),
        });
        let agent = Agent::new(backend.clone()).expect("agent");
        Fixture {
            manager: ThreadManager::new(store.clone(), Some(agent)),
            store,
            backend,
        }
    }

    fn text(reply: &str) -> Vec<ContentBlock> {
        vec![ContentBlock::Text {
            text: reply.to_string(),
        }]
    }

    fn turn(prompt: &str, user: &str, thread_id: Option<String>) -> TurnRequest {
        TurnRequest {
            prompt: prompt.to_string(),
            user_id: UserId::new(user),
            thread_id,
        }
    }

    #[tokio::test]
    async fn first_turn_creates_a_titled_thread() {
        let fx = fixture(text("Sure."));
        let result = fx
            .manager
            .run_turn(turn("Help me write a thank-you note to my landlord for fixing the heater quickly", "alice", None))
            .await
            .expect("turn");

        assert_eq!(result.text.as_deref(), Some("Sure."));
        let thread = fx.store.get(result.thread_id).await.expect("get").expect("thread");
        assert_eq!(thread.user_id, UserId::new("alice"));
        assert_eq!(thread.status, ThreadStatus::Active);
        assert!(thread.title.as_deref().is_some_and(|t| t.ends_with("...")));
    }

    #[tokio::test]
    async fn continuation_keeps_the_thread_and_replays_history() {
        let fx = fixture(text("Done."));
        let first = fx
            .manager
            .run_turn(turn("draft a post", "alice", None))
            .await
            .expect("first");
        let second = fx
            .manager
            .run_turn(turn("make it shorter", "alice", Some(first.thread_id.to_string())))
            .await
            .expect("second");

        assert_eq!(second.thread_id, first.thread_id);
        let requests = fx.backend.requests.lock().unwrap();
        assert_eq!(requests[1].context.len(), 2);
        assert_eq!(requests[1].context[0].content, "draft a post");

        let listed = fx
            .manager
            .list_threads(&UserId::new("alice"), &ListThreadsQuery::default())
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn foreign_unknown_and_malformed_ids_look_the_same() {
        let fx = fixture(text("ok"));
        let owned = fx
            .manager
            .run_turn(turn("hello", "alice", None))
            .await
            .expect("turn");

        for raw in [
            owned.thread_id.to_string(),
            ThreadId::new().to_string(),
            "not-a-thread".to_string(),
        ] {
            let err = fx
                .manager
                .run_turn(turn("let me in", "mallory", Some(raw.clone())))
                .await
                .expect_err("hidden");
            assert_eq!(
                err.current_context(),
                &ThreadError::ThreadNotFound { id: raw }
            );
        }
        assert_eq!(fx.backend.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn archived_thread_rejects_turns() {
        let fx = fixture(text("ok"));
        let mut thread = Thread::new(NewThread::for_user(UserId::new("alice")));
        thread.status = ThreadStatus::Archived;
        let id = thread.id;
        fx.store.insert(thread).await;

        let err = fx
            .manager
            .run_turn(turn("hello", "alice", Some(id.to_string())))
            .await
            .expect_err("archived");
        assert_eq!(err.current_context(), &ThreadError::ThreadArchived { id });
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_anything_runs() {
        let fx = fixture(text("ok"));
        let err = fx
            .manager
            .run_turn(turn("  ", "alice", None))
            .await
            .expect_err("blank prompt");
        assert_eq!(err.current_context(), &ThreadError::PromptRequired);

        let err = fx
            .manager
            .run_turn(turn("hello", "", None))
            .await
            .expect_err("blank user");
        assert_eq!(err.current_context(), &ThreadError::UserRequired);
        assert!(fx.backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tool_result_is_returned_and_stored() {
        let fx = fixture(vec![ContentBlock::ToolUse(ToolUse {
            id: "call_1".into(),
            name: "analyzeMessage".into(),
            input: serde_json::json!({"formatted": "Hi there.", "rewrittenMessage": "Hi there!"}),
        })]);
        let result = fx
            .manager
            .run_turn(turn("hi ther", "alice", None))
            .await
            .expect("turn");

        let tool_results = result.tool_results.expect("tool results");
        assert_eq!(tool_results["type"], "analyze");
        assert_eq!(tool_results["rewrittenMessage"], "Hi there!");
        assert!(result.text.is_none());

        let stored = fx
            .store
            .recent_messages(result.thread_id, 10)
            .await
            .expect("messages");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].tool_result.as_ref(), Some(&tool_results));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let fx = fixture(vec![ContentBlock::ToolUse(ToolUse {
            id: "call_1".into(),
            name: "bookFlight".into(),
            input: serde_json::json!({}),
        })]);
        let err = fx
            .manager
            .run_turn(turn("book it", "alice", None))
            .await
            .expect_err("unknown tool");
        assert!(matches!(
            err.current_context(),
            ThreadError::Tool(ToolError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn failed_first_turn_stores_no_thread() {
        let fx = fixture(vec![ContentBlock::ToolUse(ToolUse {
            id: "call_1".into(),
            name: "writeEmail".into(),
            input: serde_json::json!("not an object"),
        })]);
        for _ in 0..2 {
            let err = fx
                .manager
                .run_turn(turn("email sam", "alice", None))
                .await
                .expect_err("invalid tool input");
            assert!(matches!(
                err.current_context(),
                ThreadError::Tool(ToolError::InvalidInput { .. })
            ));
        }

        let listed = fx
            .manager
            .list_threads(&UserId::new("alice"), &ListThreadsQuery::default())
            .await
            .expect("list");
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn empty_tool_arguments_fall_back_to_defaults() {
        let fx = fixture(vec![ContentBlock::ToolUse(ToolUse {
            id: "call_1".into(),
            name: "writeEmail".into(),
            input: serde_json::json!({}),
        })]);
        let result = fx
            .manager
            .run_turn(turn("email sam", "alice", None))
            .await
            .expect("turn");

        let tool_results = result.tool_results.expect("tool results");
        assert_eq!(tool_results["type"], "email");
        assert_eq!(tool_results["recipient"], "");
        assert_eq!(tool_results["subject"], "");
        assert_eq!(tool_results["body"], "");
    }

    #[tokio::test]
    async fn missing_agent_is_reported() {
        let manager = ThreadManager::new(Arc::new(MemoryThreadStore::new()), None);
        let err = manager
            .run_turn(turn("hello", "alice", None))
            .await
            .expect_err("no agent");
        assert_eq!(err.current_context(), &ThreadError::AgentUnavailable);
    }
}
