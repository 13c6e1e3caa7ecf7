//! OpenAI-compatible Chat Completions client, shared by OpenAI, Azure
//! OpenAI and FastChat deployments.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::http::{azure_headers, bearer_headers, build_client, status_to_error};
use super::{ProviderClient, ProviderFactory, ProviderRequest, ProviderResponse};
use crate::config::AgentxConfig;
use crate::error::AgentxError;
use crate::types::{ApiType, Content, GenerationConfig, Message, Role, ToolCall, Usage};
use crate::util::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AZURE_API_VERSION: &str = "2023-12-01-preview";

/// Factory registered for [`ApiType::OpenAi`], [`ApiType::Azure`] and
/// [`ApiType::FastChat`].
pub struct OpenAiChatFactory;

impl ProviderFactory for OpenAiChatFactory {
    fn api_types(&self) -> &[ApiType] {
        &[ApiType::OpenAi, ApiType::Azure, ApiType::FastChat]
    }

    fn create(
        &self,
        generation: &GenerationConfig,
        config: &AgentxConfig,
    ) -> Result<Arc<dyn ProviderClient>, AgentxError> {
        Ok(Arc::new(OpenAiChatProvider::from_config(generation, config)?))
    }
}

pub struct OpenAiChatProvider {
    api_type: ApiType,
    url: String,
    headers: HeaderMap,
    model: Option<String>,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAiChatProvider {
    pub fn from_config(
        generation: &GenerationConfig,
        config: &AgentxConfig,
    ) -> Result<Self, AgentxError> {
        let api_type = generation.api_type;
        let api_key = generation
            .api_key
            .clone()
            .or_else(|| config.get_api_key(api_type));
        let base_url = generation
            .base_url
            .clone()
            .or_else(|| config.get_base_url(api_type));

        let (url, mut headers, model) = match api_type {
            ApiType::OpenAi => {
                let key = api_key
                    .ok_or_else(|| AgentxError::Authentication("Missing OPENAI_API_KEY".into()))?;
                let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
                (
                    format!("{}/chat/completions", base.trim_end_matches('/')),
                    bearer_headers(Some(&key)),
                    Some(require_model(generation)?),
                )
            }
            ApiType::FastChat => {
                let base = base_url.ok_or_else(|| {
                    AgentxError::Configuration("FastChat agents need a base_url".into())
                })?;
                (
                    format!("{}/chat/completions", base.trim_end_matches('/')),
                    bearer_headers(api_key.as_deref()),
                    Some(require_model(generation)?),
                )
            }
            ApiType::Azure => {
                let key = api_key
                    .ok_or_else(|| AgentxError::Authentication("Missing AZURE_OPENAI_KEY".into()))?;
                let endpoint = base_url.ok_or_else(|| {
                    AgentxError::Configuration("Missing AZURE_OPENAI_ENDPOINT".into())
                })?;
                let deployment = generation.azure_deployment.as_deref().ok_or_else(|| {
                    AgentxError::Configuration("Azure agents need an azure_deployment".into())
                })?;
                let version = generation
                    .api_version
                    .as_deref()
                    .unwrap_or(DEFAULT_AZURE_API_VERSION);
                (
                    format!(
                        "{}/openai/deployments/{deployment}/chat/completions?api-version={version}",
                        endpoint.trim_end_matches('/')
                    ),
                    azure_headers(&key),
                    None,
                )
            }
            other => {
                return Err(AgentxError::Configuration(format!(
                    "chat completions client does not serve api type '{other}'"
                )))
            }
        };

        if let Some(org) = &generation.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("OpenAI-Organization", val);
            }
        }

        Ok(Self {
            api_type,
            url,
            headers,
            model,
            client: build_client(Duration::from_secs(generation.timeout_secs))?,
            retry: RetryPolicy::with_max_attempts(generation.max_retries),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Result<Value, AgentxError> {
        let mut messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Result<Vec<_>, _>>()?;

        let mut body = serde_json::Map::new();
        if let Some(model) = &self.model {
            body.insert("model".into(), model.clone().into());
        }

        let config = &request.config;
        if config.n_candidates > 1 {
            body.insert("n".into(), config.n_candidates.into());
        }
        if let Some(max) = config.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = config.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = config.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = config.stop_sequences {
            body.insert("stop".into(), json!(stops));
        }
        if let Some(pp) = config.presence_penalty {
            body.insert("presence_penalty".into(), pp.into());
        }
        if let Some(fp) = config.frequency_penalty {
            body.insert("frequency_penalty".into(), fp.into());
        }
        if let Some(seed) = config.seed {
            body.insert("seed".into(), seed.into());
        }
        if let Some(ref bias) = config.logit_bias {
            body.insert("logit_bias".into(), json!(bias));
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body.insert("tools".into(), tools.into());
            if let Some(ref choice) = config.tool_choice {
                body.insert("tool_choice".into(), choice.clone());
            }
        }

        if let Some(ref schema) = request.output_schema {
            messages.push(json!({
                "role": "user",
                "content": format!(
                    "You must return a JSON object according to this json schema. {}",
                    schema.schema
                ),
            }));
            body.insert("response_format".into(), json!({ "type": "json_object" }));
        }

        body.insert("messages".into(), messages.into());
        Ok(Value::Object(body))
    }

    async fn send(&self, body: &Value) -> Result<ChatResponse, AgentxError> {
        let resp = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ProviderClient for OpenAiChatProvider {
    fn provider_name(&self) -> &str {
        match self.api_type {
            ApiType::Azure => "azure",
            ApiType::FastChat => "fastchat",
            _ => "openai",
        }
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentxError> {
        let body = self.build_request_body(request)?;

        debug!(
            provider = self.provider_name(),
            messages = request.messages.len(),
            n = request.config.n_candidates,
            "chat completions request"
        );

        let data = self.retry.execute(|| self.send(&body)).await?;

        let offered: HashSet<String> = request
            .tools
            .iter()
            .map(|t| t.name.to_lowercase())
            .collect();
        let candidates = data
            .choices
            .into_iter()
            .filter_map(|choice| choice_to_message(choice.message, &offered))
            .collect();

        Ok(ProviderResponse {
            candidates,
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for OpenAiChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatProvider")
            .field("api_type", &self.api_type)
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

fn require_model(generation: &GenerationConfig) -> Result<String, AgentxError> {
    generation.model.clone().ok_or_else(|| {
        AgentxError::Configuration(format!("{} agents need a model", generation.api_type))
    })
}

/// Tool calls naming functions the request did not offer are dropped; a
/// choice with nothing usable left is discarded.
fn choice_to_message(message: ChatMessage, offered: &HashSet<String>) -> Option<Message> {
    match message.tool_calls {
        Some(calls) if !calls.is_empty() => {
            let calls: Vec<ToolCall> = calls
                .into_iter()
                .map(|c| {
                    // some OpenAI-compatible servers omit call ids
                    let id = c.id.unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
                    (id, c.function.name.to_lowercase(), c.function.arguments)
                })
                .filter(|(_, name, _)| offered.contains(name))
                .map(|(id, name, arguments)| ToolCall::function(id, name, arguments))
                .collect();
            (!calls.is_empty()).then(|| Message::tool_call_request(calls))
        }
        _ => Some(Message {
            role: Role::Assistant,
            content: Content {
                text: message.content,
                ..Default::default()
            },
            name: None,
        }),
    }
}

fn message_to_openai(message: &Message) -> Result<Value, AgentxError> {
    let mut value = match message.role {
        Role::System => json!({ "role": "system", "content": message.text().unwrap_or_default() }),
        Role::User => json!({ "role": "user", "content": user_content(&message.content) }),
        Role::Assistant if message.has_tool_calls() => {
            let calls: Vec<Value> = message
                .tool_calls()
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.function_call.name,
                            "arguments": tc.function_call.arguments,
                        }
                    })
                })
                .collect();
            json!({ "role": "assistant", "content": "", "tool_calls": calls })
        }
        Role::Assistant => {
            json!({ "role": "assistant", "content": message.text().unwrap_or_default() })
        }
        Role::Tool => {
            let response = message.content.tool_response.as_ref().ok_or_else(|| {
                AgentxError::InvalidArgument("tool message without a tool_response".into())
            })?;
            return Ok(json!({
                "role": "tool",
                "content": response.content,
                "tool_call_id": response.id,
            }));
        }
    };

    if let Some(name) = &message.name {
        value["name"] = Value::String(wire_name(name));
    }
    Ok(value)
}

/// Plain string for text-only prompts, a parts list once media is attached.
fn user_content(content: &Content) -> Value {
    let files = content.files.as_deref().unwrap_or_default();
    let urls = content.urls.as_deref().unwrap_or_default();
    if files.is_empty() && urls.is_empty() {
        return Value::String(content.text.clone().unwrap_or_default());
    }

    let mut parts = Vec::new();
    if let Some(text) = &content.text {
        parts.push(json!({ "type": "text", "text": text }));
    }
    for file in files {
        parts.push(json!({ "type": "image_url", "image_url": { "url": file.data_url() } }));
    }
    for url in urls {
        parts.push(json!({ "type": "image_url", "image_url": { "url": url } }));
    }
    Value::Array(parts)
}

/// Participant names may only contain `[a-zA-Z0-9_-]`.
fn wire_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ChatFunction,
}

#[derive(Deserialize)]
struct ChatFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
