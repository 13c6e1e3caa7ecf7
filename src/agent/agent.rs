//! Core Agent struct and its bounded tool loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::AgentxConfig;
use crate::error::AgentxError;
use crate::provider::{reduce_last, ProviderClient, ProviderRegistry, ProviderRequest, ReduceFn};
use crate::tools::tool::Tool;
use crate::types::{ApiType, Fragment, GenerationConfig, Message, OutputSchema, Usage};

use super::reply::AgentReply;
use super::termination::{self, TerminationPolicy};
use super::tooling;

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 10;

/// A named conversation participant backed by one provider client.
///
/// Agents hold no conversation state: every call to [`generate`](Self::generate)
/// receives the full transcript, so one agent can extend many branches.
#[derive(Clone)]
pub struct Agent {
    name: String,
    provider: Arc<dyn ProviderClient>,
    system_prompt: Option<String>,
    generation: GenerationConfig,
    tools: Vec<Arc<dyn Tool>>,
    termination: Arc<dyn TerminationPolicy>,
    reduce: ReduceFn,
    max_tool_rounds: usize,
}

impl Agent {
    /// Create a new agent.
    pub fn new(name: impl Into<String>, provider: Arc<dyn ProviderClient>) -> Self {
        Self {
            name: name.into(),
            provider,
            system_prompt: None,
            generation: GenerationConfig::new(ApiType::OpenAi),
            tools: Vec::new(),
            termination: termination::never(),
            reduce: reduce_last(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Create an agent whose provider is built from `generation.api_type`.
    pub fn from_config(
        name: impl Into<String>,
        generation: GenerationConfig,
        registry: &ProviderRegistry,
        config: &AgentxConfig,
    ) -> Result<Self, AgentxError> {
        let provider = registry.create_provider(&generation, config)?;
        Ok(Self::new(name, provider).with_generation_config(generation))
    }

    /// Set system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Add a tool.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_termination(mut self, policy: Arc<dyn TerminationPolicy>) -> Self {
        self.termination = policy;
        self
    }

    /// Replace the candidate reduction (default: keep the last candidate).
    pub fn with_reduce(mut self, reduce: ReduceFn) -> Self {
        self.reduce = reduce;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    /// Names of the registered tools, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Whether every call requested by `message` names a registered tool.
    pub fn can_satisfy(&self, message: &Message) -> bool {
        message
            .tool_calls()
            .iter()
            .all(|call| tooling::find_tool(&self.tools, call.name()).is_some())
    }

    /// Produce the next fragment for `transcript`.
    ///
    /// The transcript is never mutated. The returned fragment holds the
    /// assistant reply plus any tool responses and multimodal follow-ups the
    /// tool loop produced, in order. When the transcript already ends with
    /// tool calls, the fragment is just their responses.
    pub async fn generate(
        &self,
        transcript: &[Message],
        output_schema: Option<&OutputSchema>,
    ) -> Result<AgentReply, AgentxError> {
        if self.termination.should_terminate(transcript) {
            debug!(agent = %self.name, "termination policy vetoed generation");
            return Ok(AgentReply::Terminated);
        }

        // Calls left pending by another agent are answered without a model turn.
        if let Some(last) = transcript.last().filter(|m| m.has_tool_calls()) {
            debug!(agent = %self.name, calls = last.tool_calls().len(), "running pending tool calls");
            let responses =
                tooling::execute_tool_calls(&self.name, &self.tools, last.tool_calls()).await?;
            if responses.is_empty() {
                return Ok(AgentReply::NoReply);
            }
            return Ok(AgentReply::Completed(responses));
        }

        let mut prompt = Vec::with_capacity(transcript.len() + 1);
        if let Some(ref sys) = self.system_prompt {
            prompt.push(Message::system(sys.clone()).with_name(self.name.clone()));
        }
        prompt.extend_from_slice(transcript);

        let mut usage = Usage::default();
        let Some(mut reply) = self
            .request_reply(&prompt, &[], output_schema, &mut usage)
            .await?
        else {
            return Ok(AgentReply::NoReply);
        };

        let mut generated: Fragment = Vec::new();
        let mut rounds = 0;
        while reply.has_tool_calls() {
            if rounds >= self.max_tool_rounds {
                warn!(
                    agent = %self.name,
                    rounds,
                    "tool loop exhausted with calls still pending"
                );
                generated.push(reply);
                return Ok(AgentReply::ToolLoopExhausted(generated));
            }
            rounds += 1;

            let responses =
                tooling::execute_tool_calls(&self.name, &self.tools, reply.tool_calls()).await?;
            generated.push(reply);
            generated.extend(responses);

            match self
                .request_reply(&prompt, &generated, output_schema, &mut usage)
                .await?
            {
                Some(next) => reply = next,
                None => {
                    debug!(agent = %self.name, rounds, "no reply after tool results");
                    return Ok(AgentReply::Completed(generated));
                }
            }
        }

        generated.push(reply);
        debug!(
            agent = %self.name,
            rounds,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "reply complete"
        );
        Ok(AgentReply::Completed(generated))
    }

    /// Blocking variant of [`generate`](Self::generate) for synchronous
    /// callers. Fails with `InvalidState` when called from inside a Tokio
    /// runtime.
    pub fn generate_blocking(
        &self,
        transcript: &[Message],
        output_schema: Option<&OutputSchema>,
    ) -> Result<AgentReply, AgentxError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(AgentxError::InvalidState(
                "generate_blocking called inside an async runtime; await generate instead".into(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.generate(transcript, output_schema))
    }

    async fn request_reply(
        &self,
        prompt: &[Message],
        generated: &[Message],
        output_schema: Option<&OutputSchema>,
        usage: &mut Usage,
    ) -> Result<Option<Message>, AgentxError> {
        let mut messages = Vec::with_capacity(prompt.len() + generated.len());
        messages.extend_from_slice(prompt);
        messages.extend_from_slice(generated);

        let request = ProviderRequest {
            messages,
            config: self.generation.clone(),
            tools: self.tools.iter().map(|t| t.definition()).collect(),
            output_schema: output_schema.cloned(),
        };

        debug!(
            agent = %self.name,
            provider = self.provider.provider_name(),
            messages = request.messages.len(),
            "requesting reply"
        );
        let response = self.provider.generate(&request).await?;
        usage.merge(&response.usage);

        let candidates: Vec<Message> = response
            .candidates
            .into_iter()
            .filter(|candidate| self.matches_schema(candidate, output_schema))
            .collect();

        Ok((self.reduce)(candidates).map(|reply| reply.with_name(self.name.clone())))
    }

    /// Tool-call requests are exempt; text must validate against the schema.
    fn matches_schema(&self, candidate: &Message, output_schema: Option<&OutputSchema>) -> bool {
        let Some(schema) = output_schema else {
            return true;
        };
        if candidate.has_tool_calls() {
            return true;
        }
        match schema.validate(candidate.text().unwrap_or_default()) {
            Ok(()) => true,
            Err(reason) => {
                warn!(agent = %self.name, schema = %schema.name, %reason, "candidate dropped");
                false
            }
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tool_names())
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}
