//! Wire-level tests for the hosted providers, driven through the
//! request coordinator against a mock HTTP server.

mod common;

use glance::{classify, ChatMessage, GlanceError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_gemini_request_and_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-3-flash-preview:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Paris is the capital of France." } ] } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("gemini", &server.uri(), "test-key");
    let reply = coordinator
        .submit_query("What is the capital of France?", &[])
        .await
        .unwrap();
    assert_eq!(reply, "Paris is the capital of France.");
}

#[tokio::test]
async fn test_gemini_flattens_history_into_one_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": "ok" } ] } } ]
        })))
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("gemini", &server.uri(), "test-key");
    let history = vec![
        ChatMessage::user("first question"),
        ChatMessage::assistant("first answer"),
    ];
    coordinator.submit_query("follow-up", &history).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    let text = contents[0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.contains("Conversation history:"));
    assert!(text.contains("User: first question"));
    assert!(text.contains("Assistant: first answer"));
    assert!(text.ends_with("User: follow-up"));
}

#[tokio::test]
async fn test_openai_sends_structured_role_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "role": "assistant", "content": "structured reply" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("chatgpt", &server.uri(), "test-key");
    let history = vec![
        ChatMessage::user("earlier question"),
        ChatMessage::assistant("earlier answer"),
    ];
    let reply = coordinator.submit_query("new question", &history).await.unwrap();
    assert_eq!(reply, "structured reply");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "earlier question");
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[3]["role"], "user");
    assert_eq!(messages[3]["content"], "new question");
}

#[tokio::test]
async fn test_claude_headers_and_token_cap() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [ { "type": "text", "text": "claude reply" } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("claude", &server.uri(), "test-key");
    let reply = coordinator.submit_query("hello", &[]).await.unwrap();
    assert_eq!(reply, "claude reply");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["max_tokens"], 1024);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_empty_candidates_yield_placeholder_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("gemini", &server.uri(), "test-key");
    let reply = coordinator.submit_query("anything", &[]).await.unwrap();
    assert_eq!(reply, "No response");
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid api key"}"#),
        )
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("gemini", &server.uri(), "bad-key");
    let err = coordinator.submit_query("anything", &[]).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GlanceError>(),
        Some(GlanceError::InvalidCredentials(_))
    ));
    let notice = classify(&err);
    assert_eq!(notice.title, "Invalid API Key");
    assert!(!notice.is_retryable);
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("claude", &server.uri(), "test-key");
    let err = coordinator.submit_query("anything", &[]).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GlanceError>(),
        Some(GlanceError::RateLimited(_))
    ));
    assert!(classify(&err).is_retryable);
}

#[tokio::test]
async fn test_server_error_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let coordinator = common::remote_coordinator("chatgpt", &server.uri(), "test-key");
    let err = coordinator.submit_query("anything", &[]).await.unwrap_err();
    match err.downcast_ref::<GlanceError>() {
        Some(GlanceError::Provider(detail)) => {
            assert!(detail.contains("500"));
            assert!(detail.contains("backend exploded"));
        }
        other => panic!("expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_model_override_changes_gemini_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [ { "content": { "parts": [ { "text": "ok" } ] } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prefs = std::sync::Arc::new(glance::MemoryPreferences::with_values(&[
        (glance::prefs::keys::PROVIDER, "gemini"),
        (glance::prefs::keys::API_KEY, "test-key"),
        (glance::prefs::keys::API_BASE, &server.uri()),
        (glance::prefs::keys::MODEL, "gemini-pro"),
    ]));
    let local = std::sync::Arc::new(glance::providers::LocalModelManager::new(
        std::sync::Arc::new(common::FixedEngine::new("")),
    ));
    let coordinator = glance::RequestCoordinator::new(prefs, local);
    assert_eq!(coordinator.submit_query("hi", &[]).await.unwrap(), "ok");
}
