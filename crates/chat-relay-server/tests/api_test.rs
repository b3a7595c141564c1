//! HTTP-level tests for the chat relay.
//!
//! The router runs in-process against a stub provider that records every
//! payload it receives.

use anyhow::{anyhow, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use chat_relay_server::app::build_router;
use chat_relay_server::config::Settings;
use chat_relay_server::models::chat::{ChatMessage, Role};
use chat_relay_server::services::{
    ChatService, ConversationAssembler, GenerationProvider, SessionStore, WelcomeExchange,
};
use chat_relay_server::state::AppState;

/// Replies with a fixed text (or fails) and records each payload.
/// An optional delay keeps calls in flight long enough to overlap.
#[derive(Default)]
struct StubProvider {
    reply: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubProvider {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            ..Self::default()
        })
    }

    fn replying_after(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            delay: Some(delay),
            ..Self::default()
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerationProvider for StubProvider {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.reply
            .clone()
            .ok_or_else(|| anyhow!("upstream exploded: secret detail"))
    }
}

fn create_test_app(provider: Arc<StubProvider>) -> Router {
    let mut settings = Settings::default();
    settings.gemini.api_key = "test-key".to_string();
    settings.prompts.persona = "PERSONA".to_string();
    settings.prompts.acknowledgement = "ACK".to_string();
    settings.prompts.welcome_greeting = "Hi, I'm new here.".to_string();
    settings.prompts.welcome_message = "Welcome aboard!".to_string();

    let store = SessionStore::new(WelcomeExchange::new(
        settings.prompts.welcome_greeting.clone(),
        settings.prompts.welcome_message.clone(),
    ));
    let assembler = ConversationAssembler::from_config(&settings.prompts, &settings.conversation);
    let chat_service = ChatService::new(store, assembler, provider);

    build_router(AppState::new(chat_service, settings), None)
}

/// Helper to make a request and get the JSON response.
async fn request_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);

    let request = if let Some(b) = body {
        request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = request_json(app, Method::POST, "/new-session", None).await;
    assert_eq!(status, StatusCode::OK);
    body["userId"].as_str().unwrap().to_string()
}

async fn history(app: &Router, user_id: &str) -> (StatusCode, Value) {
    request_json(app, Method::GET, &format!("/chat-history/{}", user_id), None).await
}

async fn chat(app: &Router, user_id: &str, message: &str) -> (StatusCode, Value) {
    request_json(
        app,
        Method::POST,
        "/chat",
        Some(json!({ "userId": user_id, "message": message })),
    )
    .await
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_session_returns_id_and_welcome() {
    let app = create_test_app(StubProvider::replying("hello"));

    let (status, body) = request_json(&app, Method::POST, "/new-session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["welcomeMessage"], "Welcome aboard!");

    let user_id = body["userId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(user_id).is_ok());
}

#[tokio::test]
async fn test_new_sessions_are_unique_and_seeded() {
    let app = create_test_app(StubProvider::replying("hello"));

    let a = new_session(&app).await;
    let b = new_session(&app).await;
    assert_ne!(a, b);

    let (status, body) = history(&app, &a).await;
    assert_eq!(status, StatusCode::OK);
    let turns = body["history"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["text"], "Hi, I'm new here.");
    assert_eq!(turns[1]["role"], "model");
    assert_eq!(turns[1]["text"], "Welcome aboard!");
    // Seed turns report the session creation time
    assert!(turns[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_history_unknown_session_is_404() {
    let app = create_test_app(StubProvider::replying("hello"));

    let (status, body) = history(&app, "does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Session not found");
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_example_flow() {
    let provider = StubProvider::replying("hello");
    let app = create_test_app(provider.clone());
    let user_id = new_session(&app).await;

    let (status, body) = chat(&app, &user_id, "hi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "response": "hello", "userId": user_id, "historyLength": 4 })
    );

    let (_, body) = history(&app, &user_id).await;
    let turns = body["history"].as_array().unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[2]["role"], "user");
    assert_eq!(turns[2]["text"], "hi");
    assert_eq!(turns[3]["role"], "model");
    assert_eq!(turns[3]["text"], "hello");
}

#[tokio::test]
async fn test_chat_without_user_id_is_400_and_mutates_nothing() {
    let provider = StubProvider::replying("hello");
    let app = create_test_app(provider.clone());
    let user_id = new_session(&app).await;

    let (status, body) =
        request_json(&app, Method::POST, "/chat", Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User ID is required");

    let (status, _) =
        request_json(&app, Method::POST, "/chat", Some(json!({ "userId": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(provider.calls().is_empty());
    let (_, body) = history(&app, &user_id).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_with_unreadable_body_is_400() {
    let app = create_test_app(StubProvider::replying("hello"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_missing_message_defaults_to_hello() {
    let provider = StubProvider::replying("hey");
    let app = create_test_app(provider.clone());
    let user_id = new_session(&app).await;

    let (status, _) =
        request_json(&app, Method::POST, "/chat", Some(json!({ "userId": user_id }))).await;
    assert_eq!(status, StatusCode::OK);

    let calls = provider.calls();
    let last = calls[0].last().unwrap();
    assert_eq!(last, &ChatMessage::new(Role::User, "Hello"));
}

#[tokio::test]
async fn test_chat_unknown_user_id_creates_session() {
    let app = create_test_app(StubProvider::replying("hello"));

    let (status, body) = chat(&app, "client-chosen-id", "hi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["historyLength"], 4);

    let (status, _) = history(&app, "client-chosen-id").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_provider_payload_shape() {
    let provider = StubProvider::replying("ok");
    let app = create_test_app(provider.clone());
    let user_id = new_session(&app).await;

    chat(&app, &user_id, "first").await;

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let payload = &calls[0];
    // persona + ack + 2 seed turns + new user turn
    assert_eq!(payload.len(), 5);
    assert_eq!(payload[0], ChatMessage::new(Role::User, "PERSONA"));
    assert_eq!(payload[1], ChatMessage::new(Role::Model, "ACK"));
    assert_eq!(payload[2], ChatMessage::new(Role::User, "Hi, I'm new here."));
    assert_eq!(payload[3], ChatMessage::new(Role::Model, "Welcome aboard!"));
    assert_eq!(payload[4], ChatMessage::new(Role::User, "first"));
}

#[tokio::test]
async fn test_provider_payload_window_is_ten_turns() {
    let provider = StubProvider::replying("ok");
    let app = create_test_app(provider.clone());
    let user_id = new_session(&app).await;

    for i in 0..8 {
        chat(&app, &user_id, &format!("msg {}", i)).await;
    }

    let calls = provider.calls();
    let payload = calls.last().unwrap();
    assert_eq!(payload.len(), 2 + 10);
    assert_eq!(payload[0].text, "PERSONA");
    assert_eq!(payload[1].text, "ACK");
    assert_eq!(payload.last().unwrap().text, "msg 7");
    // 17 stored turns; the window opens on the reply to "msg 2"
    assert_eq!(payload[2], ChatMessage::new(Role::Model, "ok"));
    assert_eq!(payload[3], ChatMessage::new(Role::User, "msg 3"));
}

#[tokio::test]
async fn test_history_length_grows_by_two_and_caps_at_fifty() {
    let app = create_test_app(StubProvider::replying("ok"));
    let user_id = new_session(&app).await;

    for n in 1..=30 {
        let (status, body) = chat(&app, &user_id, &format!("msg {}", n)).await;
        assert_eq!(status, StatusCode::OK);
        let expected = (2 + 2 * n).min(50);
        assert_eq!(body["historyLength"], expected, "after {} submissions", n);
    }

    let (_, body) = history(&app, &user_id).await;
    let turns = body["history"].as_array().unwrap();
    assert_eq!(turns.len(), 50);
    // Seed exchange and early messages were dropped oldest-first
    assert_eq!(turns[0]["text"], "msg 6");
    assert_eq!(turns[49]["text"], "ok");
}

#[tokio::test]
async fn test_provider_failure_is_500_without_model_turn() {
    let app = create_test_app(StubProvider::failing());
    let user_id = new_session(&app).await;

    let (status, body) = chat(&app, &user_id, "hi").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert_eq!(error, "Failed to get response from IntelliBazar AI assistant.");
    assert!(!error.contains("secret detail"));

    let (_, body) = history(&app, &user_id).await;
    let turns = body["history"].as_array().unwrap();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns.last().unwrap()["role"], "user");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_are_serialized_per_session() {
    let provider = StubProvider::replying_after("ok", Duration::from_millis(20));
    let app = create_test_app(provider.clone());
    let user_id = new_session(&app).await;

    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let app = app.clone();
            let user_id = user_id.clone();
            tokio::spawn(async move { chat(&app, &user_id, &format!("c{}", i)).await })
        })
        .collect();
    for task in tasks {
        let (status, _) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = history(&app, &user_id).await;
    let turns = body["history"].as_array().unwrap();
    assert_eq!(turns.len(), 12);
    // Every user turn is immediately followed by its reply
    for pair in turns[2..].chunks(2) {
        assert_eq!(pair[0]["role"], "user");
        assert_eq!(pair[1]["role"], "model");
    }
    assert_eq!(provider.calls().len(), 5);
    assert_eq!(provider.max_in_flight(), 1);
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(StubProvider::replying("ok"));
    new_session(&app).await;

    let (status, body) = request_json(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["activeSessions"], 1);
    assert!(body.get("active_sessions").is_none());
}
