//! Provider boundary: the capability an [`Agent`](crate::agent::Agent)
//! uses to turn a transcript into candidate replies.

pub mod http;
pub mod registry;

#[cfg(feature = "openai")]
pub mod openai;

pub use registry::{ProviderFactory, ProviderRegistry};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentxError;
use crate::types::{GenerationConfig, Message, OutputSchema, ToolDefinition, Usage};

/// A request sent to a provider client.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub config: GenerationConfig,
    pub tools: Vec<ToolDefinition>,
    pub output_schema: Option<OutputSchema>,
}

/// Candidate replies from a provider. No candidates means the provider
/// produced nothing usable (filtered, rate limited upstream, ...).
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub candidates: Vec<Message>,
    pub usage: Usage,
}

impl ProviderResponse {
    pub fn single(message: Message) -> Self {
        Self {
            candidates: vec![message],
            usage: Usage::default(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Core trait implemented by provider clients.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider name (e.g. "openai", "azure").
    fn provider_name(&self) -> &str;

    /// Generate zero or more candidate assistant messages.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentxError>;
}

/// Collapses several candidate completions into one.
pub type ReduceFn = Arc<dyn Fn(Vec<Message>) -> Option<Message> + Send + Sync>;

/// Default reduction: keep the last candidate.
pub fn reduce_last() -> ReduceFn {
    Arc::new(|candidates: Vec<Message>| candidates.into_iter().last())
}
