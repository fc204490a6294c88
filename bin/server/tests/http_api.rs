//! Router-level tests driving the HTTP API against scripted model backends
//! and the in-memory thread store.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use penwise_ai::{
    ContentBlock, LlmBackend, LlmError, LlmProvider, LlmRequest, LlmResponse, TokenUsage, ToolUse,
};
use penwise_assistant::{
    Agent, Analyzer, AnalyzerSettings, MemoryThreadStore, ThreadManager, ThreadStore,
};
use penwise_server::config::AuthConfig;
use penwise_server::{AppState, router};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

type Reply = Result<Vec<ContentBlock>, LlmError>;

/// Backend that plays back queued replies and counts calls.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<usize>,
}

impl ScriptedBackend {
    fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        *self.calls.lock().unwrap() += 1;
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(vec![ContentBlock::Text {
                text: "ok".into(),
            }])
        });
        reply.map(|content| LlmResponse {
            content,
            usage: TokenUsage::default(),
            model: "scripted".into(),
        })
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Anthropic
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

struct TestApp {
    router: Router,
    analyzer_backend: Arc<ScriptedBackend>,
    agent_backend: Arc<ScriptedBackend>,
    store: Arc<MemoryThreadStore>,
}

fn app(analyzer_replies: Vec<Reply>, agent_replies: Vec<Reply>) -> TestApp {
    let analyzer_backend = ScriptedBackend::with_replies(analyzer_replies);
    let agent_backend = ScriptedBackend::with_replies(agent_replies);
    let store = Arc::new(MemoryThreadStore::new());

    let analyzer = Analyzer::new(Some(analyzer_backend.clone()), AnalyzerSettings::default())
        .expect("analyzer");
    let agent = Agent::new(agent_backend.clone()).expect("agent");
    let threads = ThreadManager::new(store.clone(), Some(agent));
    let state = AppState::new(analyzer, threads, AuthConfig::default());

    TestApp {
        router: router(Arc::new(state)),
        analyzer_backend,
        agent_backend,
        store,
    }
}

fn analysis_reply(input: Value) -> Reply {
    Ok(vec![ContentBlock::ToolUse(ToolUse {
        id: "toolu_1".into(),
        name: "analyzeMessage".into(),
        input,
    })])
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn analyze_rejects_missing_message_without_model_call() {
    let app = app(vec![], vec![]);

    for body in [json!({}), json!({"message": null}), json!({"message": ""})] {
        let (status, body) = send(&app.router, post_json("/analyze", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Message is required"}));
    }
    assert_eq!(app.analyzer_backend.calls(), 0);
}

#[tokio::test]
async fn analyze_returns_compliant_fields_verbatim() {
    let app = app(
        vec![analysis_reply(json!({
            "formatted": "Hey, can you send this? FYI, I need it tomorrow.",
            "tone": "Casual; consider a greeting",
            "clarity": "Spell out abbreviations",
            "grammarIssues": "u -> you, tmrw -> tomorrow"
        }))],
        vec![],
    );

    let (status, body) = send(
        &app.router,
        post_json("/analyze", json!({"message": "hey can u send this fyi tmrw"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "formatted": "Hey, can you send this? FYI, I need it tomorrow.",
            "tone": "Casual; consider a greeting",
            "clarity": "Spell out abbreviations",
            "grammarIssues": "u -> you, tmrw -> tomorrow"
        })
    );
    assert_eq!(app.analyzer_backend.calls(), 1);
}

#[tokio::test]
async fn analyze_fills_missing_fields_with_empty_strings() {
    let app = app(vec![analysis_reply(json!({"formatted": "Hello."}))], vec![]);
    let (status, body) = send(&app.router, post_json("/analyze", json!({"message": "hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"formatted": "Hello.", "tone": "", "clarity": "", "grammarIssues": ""})
    );
}

#[tokio::test]
async fn analyze_classifies_provider_failures() {
    let cases = [
        (
            LlmError::RateLimited {
                retry_after_secs: None,
            },
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
        ),
        (
            LlmError::Unauthorized {
                reason: "invalid x-api-key".into(),
            },
            StatusCode::UNAUTHORIZED,
            "Authentication error",
        ),
        (
            LlmError::InvalidRequest {
                reason: "messages: field required".into(),
            },
            StatusCode::BAD_REQUEST,
            "Invalid request",
        ),
        (
            LlmError::RequestFailed {
                reason: "connection reset".into(),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        ),
    ];

    for (failure, expected_status, expected_error) in cases {
        let description = failure.to_string();
        let app = app(vec![Err(failure)], vec![]);
        let (status, body) = send(&app.router, post_json("/analyze", json!({"message": "hi"}))).await;

        assert_eq!(status, expected_status);
        assert_eq!(body["error"], expected_error);
        assert_eq!(body["details"], description);
    }
}

#[tokio::test]
async fn analyze_rejects_empty_model_content() {
    let app = app(vec![Ok(vec![])], vec![]);
    let (status, body) = send(&app.router, post_json("/analyze", json!({"message": "hi"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Empty or invalid response from model");
}

#[tokio::test]
async fn analyze_without_credential_is_a_configuration_error() {
    let store: Arc<dyn ThreadStore> = Arc::new(MemoryThreadStore::new());
    let analyzer = Analyzer::new(None, AnalyzerSettings::default()).expect("analyzer");
    let state = AppState::new(
        analyzer,
        ThreadManager::new(store, None),
        AuthConfig::default(),
    );
    let router = router(Arc::new(state));

    let (status, body) = send(&router, post_json("/analyze", json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Server configuration error"}));

    let (status, body) = send(
        &router,
        post_json("/threads/turn", json!({"prompt": "hi", "userId": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Server configuration error"}));
}

#[tokio::test]
async fn turn_creates_then_continues_the_same_thread() {
    let app = app(
        vec![],
        vec![
            Ok(vec![ContentBlock::Text {
                text: "What should the email say?".into(),
            }]),
            Ok(vec![ContentBlock::ToolUse(ToolUse {
                id: "call_1".into(),
                name: "writeEmail".into(),
                input: json!({"recipient": "sam@example.com", "subject": "Friday", "body": "See you then."}),
            })]),
        ],
    );

    let (status, first) = send(
        &app.router,
        post_json("/threads/turn", json!({"prompt": "help me email sam", "userId": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["text"], "What should the email say?");
    assert!(first.get("toolResults").is_none());
    let thread_id = first["threadId"].as_str().expect("thread id").to_string();

    let (status, second) = send(
        &app.router,
        post_json(
            "/threads/turn",
            json!({"prompt": "say see you friday", "userId": "alice", "threadId": thread_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["threadId"], thread_id.as_str());
    assert!(second.get("text").is_none());
    assert_eq!(second["toolResults"]["type"], "email");
    assert_eq!(second["toolResults"]["subject"], "Friday");
    assert_eq!(app.agent_backend.calls(), 2);
}

#[tokio::test]
async fn turn_on_another_users_thread_is_not_found() {
    let app = app(vec![], vec![]);
    let (_, created) = send(
        &app.router,
        post_json("/threads/turn", json!({"prompt": "private notes", "userId": "alice"})),
    )
    .await;
    let thread_id = created["threadId"].as_str().expect("thread id").to_string();

    let (status, body) = send(
        &app.router,
        post_json(
            "/threads/turn",
            json!({"prompt": "show me", "userId": "mallory", "threadId": thread_id}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Thread not found"}));
    assert_eq!(app.agent_backend.calls(), 1);

    let (status, unknown) = send(
        &app.router,
        post_json(
            "/threads/turn",
            json!({"prompt": "show me", "userId": "mallory", "threadId": "thr_nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(unknown, body);
}

#[tokio::test]
async fn turn_requires_prompt_and_user() {
    let app = app(vec![], vec![]);

    let (status, body) = send(&app.router, post_json("/threads/turn", json!({"userId": "alice"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");

    let (status, body) = send(&app.router, post_json("/threads/turn", json!({"prompt": "hi"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId is required");
    assert_eq!(app.agent_backend.calls(), 0);
}

#[tokio::test]
async fn listing_returns_only_the_users_threads_newest_first() {
    let app = app(vec![], vec![]);
    let mut alice_ids = Vec::new();
    for prompt in ["first", "second", "third"] {
        let (_, body) = send(
            &app.router,
            post_json("/threads/turn", json!({"prompt": prompt, "userId": "alice"})),
        )
        .await;
        alice_ids.push(body["threadId"].as_str().expect("id").to_string());
    }
    send(
        &app.router,
        post_json("/threads/turn", json!({"prompt": "bob's", "userId": "bob"})),
    )
    .await;

    let (status, body) = send(&app.router, get("/threads?userId=alice")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["id"].as_str().expect("id"))
        .collect();
    alice_ids.reverse();
    assert_eq!(listed, alice_ids);
    assert!(body.as_array().expect("array").iter().all(|t| t["userId"] == "alice"));
    assert_eq!(body[0]["title"], "third");
    assert_eq!(body[0]["status"], "active");

    let (status, page) = send(
        &app.router,
        get(&format!("/threads?userId=alice&numItems=1&cursor={}", alice_ids[0])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page.as_array().map(Vec::len), Some(1));
    assert_eq!(page[0]["id"], alice_ids[1].as_str());

    let stored = app
        .store
        .list_by_user(&"alice".into(), &Default::default())
        .await
        .expect("list");
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn listing_requires_user_id() {
    let app = app(vec![], vec![]);
    let (status, body) = send(&app.router, get("/threads")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId is required");

    let (status, body) = send(&app.router, get("/threads?userId=alice&cursor=garbage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid cursor");
}

#[tokio::test]
async fn callback_redirects_or_reports_provider_error() {
    let app = app(vec![], vec![]);

    let response = app
        .router
        .clone()
        .oneshot(get("/callback?code=abc&state=xyz"))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/")
    );

    let (status, body) = send(
        &app.router,
        get("/callback?error=access_denied&error_description=User%20cancelled"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"error": "Authentication error", "details": "User cancelled"})
    );
}

#[tokio::test]
async fn health_is_ok() {
    let app = app(vec![], vec![]);
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
