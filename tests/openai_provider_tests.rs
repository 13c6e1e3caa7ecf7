//! Tests for the OpenAI-compatible chat completions client.
#![cfg(feature = "openai")]

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentx::agent::Agent;
use agentx::config::AgentxConfig;
use agentx::error::AgentxError;
use agentx::provider::openai::OpenAiChatProvider;
use agentx::provider::{ProviderClient, ProviderRegistry, ProviderRequest};
use agentx::types::*;
use agentx::util::retry::RetryPolicy;

fn test_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

fn openai_config(server: &MockServer) -> GenerationConfig {
    GenerationConfig::builder()
        .api_type(ApiType::OpenAi)
        .model("gpt-4o-mini".to_string())
        .api_key("test-key".to_string())
        .base_url(server.uri())
        .build()
}

fn request(config: GenerationConfig, messages: Vec<Message>) -> ProviderRequest {
    ProviderRequest {
        messages,
        config,
        tools: vec![],
        output_schema: None,
    }
}

fn completion(choices: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": choices,
        "usage": { "prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19 }
    }))
}

#[tokio::test]
async fn chat_completion_returns_every_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini", "n": 2, "temperature": 0.5 })))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": "first" } },
            { "index": 1, "message": { "role": "assistant", "content": "second" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = openai_config(&server);
    config.n_candidates = 2;
    config.temperature = Some(0.5);
    let provider = OpenAiChatProvider::from_config(&config, &AgentxConfig::new()).unwrap();

    let response = provider
        .generate(&request(config, vec![Message::user("hi")]))
        .await
        .unwrap();

    assert_eq!(
        response.candidates,
        vec![Message::assistant("first"), Message::assistant("second")]
    );
    assert_eq!(response.usage.total_tokens, 19);
    assert_eq!(provider.provider_name(), "openai");
}

#[tokio::test]
async fn output_schema_adds_instruction_and_json_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
        .and(body_string_contains("You must return a JSON object according to this json schema."))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": "{\"score\": 9}" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let provider = OpenAiChatProvider::from_config(&config, &AgentxConfig::new()).unwrap();
    let mut req = request(config, vec![Message::user("rate this")]);
    req.output_schema = Some(OutputSchema::new(
        "score",
        json!({ "type": "object", "properties": { "score": { "type": "number" } } }),
    ));

    let response = provider.generate(&req).await.unwrap();
    assert_eq!(response.candidates[0].text(), Some("{\"score\": 9}"));
}

#[tokio::test]
async fn tool_calls_to_unoffered_functions_are_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "tools": [{ "type": "function", "function": { "name": "geocode" } }]
        })))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": null, "tool_calls": [
                { "id": "call_a", "type": "function",
                  "function": { "name": "Geocode", "arguments": "{\"address\":\"Napoli\"}" } }
            ] } },
            { "index": 1, "message": { "role": "assistant", "content": null, "tool_calls": [
                { "id": "call_b", "type": "function",
                  "function": { "name": "rm_rf", "arguments": "{}" } }
            ] } }
        ])))
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let provider = OpenAiChatProvider::from_config(&config, &AgentxConfig::new()).unwrap();
    let mut req = request(config, vec![Message::user("where is Napoli?")]);
    req.tools = vec![ToolDefinition {
        name: "geocode".into(),
        description: "address to coordinates".into(),
        parameters: json!({ "type": "object", "properties": {} }),
    }];

    let response = provider.generate(&req).await.unwrap();
    assert_eq!(response.candidates.len(), 1);
    assert_eq!(
        response.candidates[0].tool_calls(),
        &[ToolCall::function("call_a", "geocode", "{\"address\":\"Napoli\"}")]
    );
}

#[tokio::test]
async fn tool_round_trip_is_sent_in_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "user", "content": "where?" },
                { "role": "assistant", "tool_calls": [
                    { "id": "call_1", "type": "function",
                      "function": { "name": "geocode", "arguments": "{}" } }
                ] },
                { "role": "tool", "tool_call_id": "call_1", "content": "{\"lat\":1}" }
            ]
        })))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": "at lat 1" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let provider = OpenAiChatProvider::from_config(&config, &AgentxConfig::new()).unwrap();
    let messages = vec![
        Message::user("where?"),
        Message::tool_call_request(vec![ToolCall::function("call_1", "geocode", "{}")]),
        Message::tool_response("call_1", "geocode", "{\"lat\":1}"),
    ];

    let response = provider.generate(&request(config, messages)).await.unwrap();
    assert_eq!(response.candidates[0].text(), Some("at lat 1"));
}

#[tokio::test]
async fn azure_uses_deployment_url_and_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-35/chat/completions"))
        .and(query_param("api-version", "2024-02-01"))
        .and(header("api-key", "azure-key"))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": "from azure" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let shared = AgentxConfig::new();
    shared.set_api_key(ApiType::Azure, "azure-key".into());
    shared.set_base_url(ApiType::Azure, server.uri());
    let config = GenerationConfig::builder()
        .api_type(ApiType::Azure)
        .azure_deployment("gpt-35".to_string())
        .api_version("2024-02-01".to_string())
        .build();
    let provider = OpenAiChatProvider::from_config(&config, &shared).unwrap();

    let response = provider
        .generate(&request(config, vec![Message::user("hi")]))
        .await
        .unwrap();
    assert_eq!(response.candidates[0].text(), Some("from azure"));
    assert_eq!(provider.provider_name(), "azure");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": "recovered" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let provider = OpenAiChatProvider::from_config(&config, &AgentxConfig::new())
        .unwrap()
        .with_retry_policy(test_retry_policy(2));

    let response = provider
        .generate(&request(config, vec![Message::user("hi")]))
        .await
        .unwrap();
    assert_eq!(response.candidates[0].text(), Some("recovered"));
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let provider = OpenAiChatProvider::from_config(&config, &AgentxConfig::new())
        .unwrap()
        .with_retry_policy(test_retry_policy(3));

    let err = provider
        .generate(&request(config, vec![Message::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentxError::Authentication(_)));
}

#[test]
fn missing_credentials_fail_at_construction() {
    let config = GenerationConfig::builder()
        .api_type(ApiType::OpenAi)
        .model("gpt-4o".to_string())
        .build();
    let err = OpenAiChatProvider::from_config(&config, &AgentxConfig::new()).unwrap_err();
    assert!(matches!(err, AgentxError::Authentication(_)));

    let fastchat = GenerationConfig::builder()
        .api_type(ApiType::FastChat)
        .model("vicuna".to_string())
        .build();
    let err = OpenAiChatProvider::from_config(&fastchat, &AgentxConfig::new()).unwrap_err();
    assert!(matches!(err, AgentxError::Configuration(_)));
}

#[tokio::test]
async fn agent_built_from_registry_talks_to_fastchat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "vicuna-7b",
            "messages": [
                { "role": "system", "content": "Be terse.", "name": "local_agent" },
                { "role": "user", "content": "hi" }
            ]
        })))
        .respond_with(completion(json!([
            { "index": 0, "message": { "role": "assistant", "content": "hello" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let generation = GenerationConfig::builder()
        .api_type(ApiType::FastChat)
        .model("vicuna-7b".to_string())
        .base_url(format!("{}/v1", server.uri()))
        .build();
    let agent = Agent::from_config(
        "local_agent",
        generation,
        &ProviderRegistry::with_builtin(),
        &AgentxConfig::new(),
    )
    .unwrap()
    .with_system_prompt("Be terse.");

    let fragment = agent
        .generate(&[Message::user("hi")], None)
        .await
        .unwrap()
        .into_fragment()
        .unwrap();
    assert_eq!(fragment, vec![Message::assistant("hello").with_name("local_agent")]);
}

#[test]
fn unregistered_api_types_are_reported() {
    let generation = GenerationConfig::new(ApiType::VertexAi);
    let err = Agent::from_config(
        "gemini",
        generation,
        &ProviderRegistry::with_builtin(),
        &AgentxConfig::new(),
    )
    .unwrap_err();
    assert!(matches!(err, AgentxError::ProviderNotRegistered(ApiType::VertexAi)));
}
