//! Multi-agent conversation drivers: best-first search and round-robin chat.

mod frontier;
pub mod group;
pub mod scoring;
pub mod search;
pub mod state;

pub use group::{group_chat, GroupChatConfig, GroupChatOutcome, GroupChatTermination};
pub use scoring::{llm_call_cost, no_signal, AgentHeuristic, CostFunction, Heuristic};
pub use search::{astar_chat, reconstruct_path, SearchConfig, SearchOutcome, SearchTermination};
pub use state::{FragmentIndex, StateKey};
