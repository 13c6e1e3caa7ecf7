//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentReply, ContainsText, TerminationPolicy};
pub use crate::chat::{
    astar_chat, group_chat, llm_call_cost, AgentHeuristic, CostFunction, GroupChatConfig,
    Heuristic, SearchConfig, SearchOutcome, StateKey,
};
pub use crate::config::{AgentxConfig, SessionFile};
pub use crate::error::{AgentxError, Result};
pub use crate::provider::{ProviderClient, ProviderRegistry};
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolParameters};
pub use crate::types::{
    flatten, ApiType, Content, Fragment, GenerationConfig, Message, OutputSchema, Role, ToolCall,
};
