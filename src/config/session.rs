//! TOML session files describing agents and driver settings.
//!
//! ```toml
//! [search]
//! threshold = 1.0
//! max_iteration = 10
//!
//! [[agents]]
//! name = "geocoding_agent"
//! system_prompt = "Use the functions you have been provided to solve the problem."
//!
//! [agents.generation]
//! api_type = "azure"
//! azure_deployment = "gpt-35"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AgentxConfig;
use crate::agent::{Agent, DEFAULT_MAX_TOOL_ROUNDS};
use crate::chat::{GroupChatConfig, SearchConfig};
use crate::error::AgentxError;
use crate::provider::ProviderRegistry;
use crate::types::GenerationConfig;

const fn default_max_tool_rounds() -> usize {
    DEFAULT_MAX_TOOL_ROUNDS
}

/// One `[[agents]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionFile {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub group_chat: GroupChatConfig,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
}

impl SessionFile {
    /// Read and parse a session file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentxError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let session: Self = text.parse()?;
        debug!(path = %path.display(), agents = session.agents.len(), "loaded session file");
        Ok(session)
    }

    /// Build every declared agent through `registry`. Tools and termination
    /// policies are code, so callers attach them afterwards.
    pub fn build_agents(
        &self,
        registry: &ProviderRegistry,
        config: &AgentxConfig,
    ) -> Result<Vec<Agent>, AgentxError> {
        self.agents
            .iter()
            .map(|spec| {
                let mut agent =
                    Agent::from_config(spec.name.clone(), spec.generation.clone(), registry, config)?
                        .with_max_tool_rounds(spec.max_tool_rounds);
                if let Some(ref prompt) = spec.system_prompt {
                    agent = agent.with_system_prompt(prompt.clone());
                }
                Ok(agent)
            })
            .collect()
    }

    fn validate(&self) -> Result<(), AgentxError> {
        let mut seen = HashSet::new();
        for spec in &self.agents {
            if spec.name.trim().is_empty() {
                return Err(AgentxError::Configuration("agent name must not be empty".into()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(AgentxError::Configuration(format!(
                    "duplicate agent name '{}'",
                    spec.name
                )));
            }
        }
        if self.search.n_replies == 0 {
            return Err(AgentxError::Configuration(
                "search.n_replies must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl FromStr for SessionFile {
    type Err = AgentxError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let session: Self = toml::from_str(text)?;
        session.validate()?;
        Ok(session)
    }
}
