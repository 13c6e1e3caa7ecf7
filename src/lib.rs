//! agentx: multi-provider LLM agents with bounded tool loops, a round-robin
//! group chat and a best-first search over conversation continuations.
//!
//! # Quick Start
//!
//! ```no_run
//! use agentx::prelude::*;
//!
//! # async fn example() -> agentx::error::Result<()> {
//! let config = AgentxConfig::from_env();
//! let registry = ProviderRegistry::with_builtin();
//! let generation = GenerationConfig::builder()
//!     .api_type(ApiType::OpenAi)
//!     .model("gpt-4o-mini".to_string())
//!     .build();
//! let writer = Agent::from_config("writer", generation, &registry, &config)?
//!     .with_system_prompt("Improve the draft. Reply TERMINATE when done.");
//!
//! let outcome = astar_chat(
//!     &[writer],
//!     vec![Message::user("Draft a haiku about rust.")],
//!     &llm_call_cost,
//!     &|transcript: &[Message]| Some(10.0 - transcript.len() as f64),
//!     &SearchConfig::default(),
//! )
//! .await?;
//! println!("{:?}", outcome.transcript());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;
