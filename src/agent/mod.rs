//! Agents: a provider, a system prompt, tools and the policies that turn
//! raw completions into conversation fragments.

pub mod agent;
pub mod reply;
pub mod termination;
mod tooling;

pub use agent::{Agent, DEFAULT_MAX_TOOL_ROUNDS};
pub use reply::AgentReply;
pub use termination::{
    ContainsText, MaxMessages, Never, PredicateTermination, RegexTermination, TerminationPolicy,
};
