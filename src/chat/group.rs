//! Round-robin group chat over one linear transcript.

use std::collections::HashMap;

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::scoring::Heuristic;
use super::state::StateKey;
use crate::agent::Agent;
use crate::error::AgentxError;
use crate::types::Message;

const fn default_threshold() -> f64 {
    10.0
}

const fn default_max_iteration() -> usize {
    10
}

#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct GroupChatConfig {
    #[builder(default = default_threshold())]
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[builder(default = default_max_iteration())]
    #[serde(default = "default_max_iteration")]
    pub max_iteration: usize,
}

impl Default for GroupChatConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChatTermination {
    Threshold,
    IterationCap,
}

#[derive(Debug, Clone)]
pub struct GroupChatOutcome {
    pub transcript: Vec<Message>,
    /// Score recorded for each appended fragment, keyed by its state key.
    /// A fragment repeated verbatim by the same agent shares its key with the
    /// earlier turn, so only the latest score for it is kept.
    pub heuristic_map: HashMap<StateKey, f64>,
    pub iterations: usize,
    pub termination: GroupChatTermination,
}

/// Let `agents` take turns extending `messages`.
///
/// Turn `i` goes to `agents[i % agents.len()]`. After each appended
/// fragment the whole transcript is scored; a missing score reuses the
/// last known one, and the chat ends once a score drops below the
/// threshold. Errors from agents or the heuristic end the chat.
pub async fn group_chat<H>(
    agents: &[Agent],
    messages: Vec<Message>,
    heuristic: &H,
    config: &GroupChatConfig,
) -> Result<GroupChatOutcome, AgentxError>
where
    H: Heuristic + ?Sized,
{
    if agents.is_empty() {
        return Err(AgentxError::InvalidArgument(
            "group chat needs at least one agent".into(),
        ));
    }

    let mut transcript = messages;
    let mut heuristic_map = HashMap::new();
    let mut last_score: Option<f64> = None;

    for iteration in 0..config.max_iteration {
        let agent = &agents[iteration % agents.len()];
        let Some(fragment) = agent.generate(&transcript, None).await?.into_fragment() else {
            debug!(agent = agent.name(), iteration, "no fragment this turn");
            continue;
        };

        let key = StateKey::of(&fragment)?;
        transcript.extend(fragment);

        let Some(score) = heuristic.score(&transcript).await?.or(last_score) else {
            continue;
        };
        last_score = Some(score);
        heuristic_map.insert(key, score);
        debug!(agent = agent.name(), iteration, heuristic = score, "turn scored");

        if score < config.threshold {
            info!(iterations = iteration + 1, heuristic = score, "group chat reached threshold");
            return Ok(GroupChatOutcome {
                transcript,
                heuristic_map,
                iterations: iteration + 1,
                termination: GroupChatTermination::Threshold,
            });
        }
    }

    Ok(GroupChatOutcome {
        transcript,
        heuristic_map,
        iterations: config.max_iteration,
        termination: GroupChatTermination::IterationCap,
    })
}
