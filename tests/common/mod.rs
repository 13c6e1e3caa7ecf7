//! Shared test helpers: scripted, echoing and failing providers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use agentx::agent::Agent;
use agentx::error::AgentxError;
use agentx::provider::{ProviderClient, ProviderRequest, ProviderResponse};
use agentx::tools::{AgentTool, Tool, ToolParameters};
use agentx::types::*;

/// Replays queued responses in order and records every request.
/// An exhausted queue yields an empty response.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a single text reply.
    pub fn queue_text(&self, text: &str) {
        self.queue(ProviderResponse::single(Message::assistant(text)));
    }

    /// Queue a reply requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.queue(ProviderResponse::single(Message::tool_call_request(vec![
            ToolCall::function(id, name, args.to_string()),
        ])));
    }

    /// Queue several candidates in one response.
    pub fn queue_candidates(&self, texts: &[&str]) {
        self.queue(ProviderResponse {
            candidates: texts.iter().map(|t| Message::assistant(*t)).collect(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
        });
    }

    pub fn queue(&self, response: ProviderResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentxError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

/// Replies with the last text in the transcript plus `" echo"`.
#[derive(Default)]
pub struct EchoProvider {
    calls: AtomicUsize,
}

impl EchoProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for EchoProvider {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = request
            .messages
            .iter()
            .rev()
            .find_map(|m| m.text())
            .unwrap_or_default();
        Ok(ProviderResponse::single(Message::assistant(format!(
            "{last} echo"
        ))))
    }
}

/// Fails every call with the error built by `make`.
pub struct FailingProvider {
    calls: AtomicUsize,
    make: fn() -> AgentxError,
}

impl FailingProvider {
    pub fn new(make: fn() -> AgentxError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            make,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for FailingProvider {
    fn provider_name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &ProviderRequest) -> Result<ProviderResponse, AgentxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make)())
    }
}

/// Sleeps before replying `"late"`.
pub struct SlowProvider {
    delay: Duration,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

#[async_trait]
impl ProviderClient for SlowProvider {
    fn provider_name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _request: &ProviderRequest) -> Result<ProviderResponse, AgentxError> {
        tokio::time::sleep(self.delay).await;
        Ok(ProviderResponse::single(Message::assistant("late")))
    }
}

pub fn echo_agent(name: &str) -> (Agent, Arc<EchoProvider>) {
    let provider = EchoProvider::new();
    (Agent::new(name, provider.clone()), provider)
}

/// A tool that ignores its arguments and returns `output`.
pub fn fixed_tool(name: &str, output: &'static str) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "returns a fixed JSON payload",
        ToolParameters::empty(),
        move |_args| async move { Ok::<_, AgentxError>(output.to_string()) },
    ))
}

pub fn api_error() -> AgentxError {
    AgentxError::api(500, "upstream exploded")
}

pub fn texts(messages: &[Message]) -> Vec<&str> {
    messages.iter().filter_map(|m| m.text()).collect()
}

/// A tool returning `output` that counts how often it ran.
pub fn counting_tool(name: &str, output: &'static str) -> (Arc<dyn Tool>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let tool: Arc<dyn Tool> = Arc::new(AgentTool::new(
        name,
        "returns a fixed JSON payload and counts calls",
        ToolParameters::empty(),
        move |_args| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AgentxError>(output.to_string())
            }
        },
    ));
    (tool, runs)
}
