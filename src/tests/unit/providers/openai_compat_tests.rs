//! OpenAI-Compatible Provider Unit Tests

use std::collections::BTreeMap;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::ProviderConfig;
use crate::core::llm::{ChatRequest, LLMError, LLMProvider, OpenAICompatibleProvider, ProviderRegistry};

fn provider(server: &MockServer, api_key: Option<&str>) -> OpenAICompatibleProvider {
    OpenAICompatibleProvider::new(
        "local",
        api_key.map(String::from),
        "test-model",
        512,
        format!("{}/v1/", server.uri()),
    )
    .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "test-model-0613",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
    })
}

// =============================================================================
// Request Formatting
// =============================================================================

#[tokio::test]
async fn test_request_carries_system_prompt_and_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "max_tokens": 128,
            "messages": [
                {"role": "system", "content": "respond in JSON"},
                {"role": "user", "content": "plan a lesson"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"ok\": true}")))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::prompt("plan a lesson")
        .with_system("respond in JSON")
        .with_temperature(0.5)
        .with_max_tokens(128);
    let response = provider(&server, Some("sk-test")).chat(request).await.unwrap();

    assert_eq!(response.content, "{\"ok\": true}");
    assert_eq!(response.model, "test-model-0613");
    assert_eq!(response.provider, "local");
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    let usage = response.usage.unwrap();
    assert_eq!(usage.input_tokens, 42);
    assert_eq!(usage.total(), 49);
}

#[tokio::test]
async fn test_default_max_tokens_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 512})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi")))
        .mount(&server)
        .await;

    let response = provider(&server, None)
        .chat(ChatRequest::prompt("hello"))
        .await
        .unwrap();
    assert_eq!(response.content, "hi");

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

// =============================================================================
// Error Mapping
// =============================================================================

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let err = provider(&server, Some("sk-test"))
        .chat(ChatRequest::prompt("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::RateLimited { retry_after_secs: 17 }));
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = provider(&server, Some("bad"))
        .chat(ChatRequest::prompt("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::AuthError(_)));
}

#[tokio::test]
async fn test_server_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = provider(&server, None)
        .chat(ChatRequest::prompt("x"))
        .await
        .unwrap_err();
    match err {
        LLMError::ApiError { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_content_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider(&server, None)
        .chat(ChatRequest::prompt("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::InvalidResponse(_)));
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
async fn test_registry_routes_by_selector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": "small-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("from small")))
        .mount(&server)
        .await;

    let mut configs = BTreeMap::new();
    configs.insert(
        "small".to_string(),
        ProviderConfig {
            base_url: format!("{}/v1", server.uri()),
            model: "small-model".to_string(),
            api_key_env: None,
        },
    );
    let registry = ProviderRegistry::from_config(&configs, 256).unwrap();

    let provider = registry.get("small").unwrap();
    assert_eq!(provider.model(), "small-model");
    let response = provider.chat(ChatRequest::prompt("x")).await.unwrap();
    assert_eq!(response.content, "from small");
    assert!(registry.get("large").is_none());
}
