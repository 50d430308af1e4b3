//! Integration tests for the provider gateway using wiremock
//!
//! DeepSeek speaks the OpenAI-compatible protocol at a configurable base
//! URL, which makes it the natural target for mock-server tests.

use pulse::config::ProviderConfig;
use pulse::error::Error;
use pulse::llm::{LlmClient, TextCompletion};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn deepseek_config(base_url: &str) -> ProviderConfig {
    ProviderConfig {
        provider: String::from("deepseek"),
        deepseek_api_key: String::from("test-key"),
        deepseek_base_url: base_url.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_chat_completion_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-chat",
            "temperature": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "[]"}}
            ]
        })))
        .mount(&server)
        .await;

    let client = LlmClient::new(deepseek_config(&server.uri())).unwrap();
    let result = client
        .complete("summarize these posts", Some("You are an analyst"), 0.5)
        .await;

    assert_eq!(result.unwrap(), "[]");
}

#[tokio::test]
async fn test_error_status_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = LlmClient::new(deepseek_config(&server.uri())).unwrap();
    let err = client.complete("hello", None, 0.5).await.unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    let message = err.to_string();
    assert!(message.contains("429"), "unexpected message: {message}");
    assert!(message.contains("rate limited"), "unexpected message: {message}");
}

#[tokio::test]
async fn test_unexpected_envelope_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let client = LlmClient::new(deepseek_config(&server.uri())).unwrap();
    let err = client.complete("hello", None, 0.5).await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}

#[tokio::test]
async fn test_empty_choices_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
        )
        .mount(&server)
        .await;

    let client = LlmClient::new(deepseek_config(&server.uri())).unwrap();
    let err = client.complete("hello", None, 0.5).await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}

#[tokio::test]
async fn test_missing_credential_never_hits_network() {
    let server = MockServer::start().await;
    // no mounted mocks: any request would 404 and surface as a provider
    // error rather than a configuration error

    let config = ProviderConfig {
        deepseek_api_key: String::new(),
        ..deepseek_config(&server.uri())
    };
    let client = LlmClient::new(config).unwrap();
    let err = client.complete("hello", None, 0.5).await.unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}
