//! Best-first search over multi-agent conversation continuations.
//!
//! Nodes are paths of fragments starting at the caller's messages. Each
//! iteration pops the cheapest path, asks every eligible agent for
//! `n_replies` continuations concurrently, relaxes the bookkeeping for
//! each new fragment and stops as soon as a fragment scores below the
//! threshold. Heuristics are not assumed admissible, so the result is the
//! first goal found (or the best-scored state seen), not a shortest path.

use std::collections::HashMap;
use std::time::Duration;

use bon::Builder;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::frontier::Frontier;
use super::scoring::{CostFunction, Heuristic};
use super::state::{FragmentIndex, StateKey};
use crate::agent::Agent;
use crate::error::AgentxError;
use crate::types::{flatten, Fragment, Message};
use crate::util::timeout::with_timeout;

const fn default_threshold() -> f64 {
    10.0
}

const fn default_n_replies() -> usize {
    1
}

const fn default_max_iteration() -> usize {
    10
}

/// Search parameters.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// A fragment scoring strictly below this ends the search.
    #[builder(default = default_threshold())]
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Replies requested from each eligible agent per expansion.
    #[builder(default = default_n_replies())]
    #[serde(default = "default_n_replies")]
    pub n_replies: usize,
    #[builder(default = default_max_iteration())]
    #[serde(default = "default_max_iteration")]
    pub max_iteration: usize,
    /// Drop a branch that takes longer than this to generate.
    #[serde(default)]
    pub branch_timeout_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTermination {
    /// A fragment scored below the threshold.
    GoalReached,
    /// Nothing was left to expand.
    FrontierExhausted,
    /// `max_iteration` expansions ran without reaching the goal.
    IterationCap,
}

/// The chosen path plus the full search trace.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Fragments from the root to the chosen state, root first.
    pub path: Vec<Fragment>,
    /// Key of the chosen state.
    pub goal: StateKey,
    /// Predecessor of every discovered state; `None` for the root.
    pub came_from: HashMap<StateKey, Option<StateKey>>,
    pub cost_so_far: HashMap<StateKey, f64>,
    pub heuristic_map: HashMap<StateKey, f64>,
    pub fragments: FragmentIndex,
    pub iterations: usize,
    pub termination: SearchTermination,
}

impl SearchOutcome {
    /// The chosen path as one linear transcript.
    pub fn transcript(&self) -> Vec<Message> {
        flatten(&self.path)
    }
}

/// Run the search from `messages`.
///
/// Per-branch failures (provider errors, tool errors, timeouts) are logged
/// and dropped. Fatal errors (see [`AgentxError::is_fatal`]) and heuristic
/// errors abort the search.
pub async fn astar_chat<C, H>(
    agents: &[Agent],
    messages: Vec<Message>,
    cost: &C,
    heuristic: &H,
    config: &SearchConfig,
) -> Result<SearchOutcome, AgentxError>
where
    C: CostFunction + ?Sized,
    H: Heuristic + ?Sized,
{
    if messages.is_empty() {
        return Err(AgentxError::InvalidArgument(
            "search needs at least one initial message".into(),
        ));
    }

    let root_score = heuristic.score(&messages).await?.unwrap_or(f64::INFINITY);
    let mut state = SearchState::new(messages, root_score)?;
    let mut frontier = Frontier::new();
    frontier.push(0.0, vec![state.root]);

    let branch_timeout = config.branch_timeout_ms.map(Duration::from_millis);
    let mut iterations = 0;
    let mut termination = SearchTermination::IterationCap;

    while iterations < config.max_iteration {
        let Some((priority, path)) = frontier.pop() else {
            termination = SearchTermination::FrontierExhausted;
            break;
        };
        iterations += 1;

        let parent = *path.last().ok_or_else(|| {
            AgentxError::InvalidState("frontier held an empty path".into())
        })?;
        let transcript = state.flatten_path(&path)?;
        let eligible = eligible_agents(agents, &transcript);

        debug!(
            iteration = iterations,
            priority,
            frontier = frontier.len(),
            eligible = eligible.len(),
            depth = path.len(),
            "expanding"
        );

        let prefix = transcript.as_slice();
        let branches = eligible.iter().flat_map(|&agent| {
            (0..config.n_replies).map(move |_| expand(agent, prefix, branch_timeout))
        });
        let results = join_all(branches).await;

        let labels = eligible
            .iter()
            .flat_map(|&agent| std::iter::repeat(agent.name()).take(config.n_replies));
        let mut generated = Vec::with_capacity(results.len());
        for (agent, result) in labels.zip(results) {
            match result {
                Ok(Some(fragment)) => generated.push(fragment),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(agent, error = %e, "branch failed; dropping it"),
            }
        }

        for next in generated {
            let new_cost = state.cost_of(&parent)? + cost.cost(&transcript, &next);
            let key = StateKey::of(&next)?;
            if !state.improves(&key, new_cost) {
                continue;
            }

            let mut candidate = Vec::with_capacity(transcript.len() + next.len());
            candidate.extend_from_slice(&transcript);
            candidate.extend_from_slice(&next);
            let score = match heuristic.score(&candidate).await? {
                Some(score) => score,
                None => state.heuristic_of(&parent)?,
            };

            state.relax(key, parent, next, new_cost, score);
            debug!(state = %key, cost = new_cost, heuristic = score, "relaxed");

            let mut next_path = path.clone();
            next_path.push(key);
            frontier.push(new_cost + score, next_path);

            if score < config.threshold {
                info!(iterations, state = %key, heuristic = score, "goal reached");
                return state.finish(key, iterations, SearchTermination::GoalReached);
            }
        }
    }

    let goal = state.best_scored();
    info!(
        iterations,
        ?termination,
        state = %goal,
        heuristic = state.heuristic_map.get(&goal).copied().unwrap_or(f64::INFINITY),
        "no goal reached; returning best-scored state"
    );
    state.finish(goal, iterations, termination)
}

/// Walk `came_from` back from `goal` and return the fragments root first.
pub fn reconstruct_path(
    came_from: &HashMap<StateKey, Option<StateKey>>,
    fragments: &FragmentIndex,
    goal: StateKey,
) -> Result<Vec<Fragment>, AgentxError> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(key) = current {
        if path.len() == came_from.len() {
            return Err(AgentxError::InvalidState(format!(
                "predecessor cycle while reconstructing {goal}"
            )));
        }
        let fragment = fragments.fragment(&key).ok_or_else(|| {
            AgentxError::InvalidState(format!("no fragment recorded for state {key}"))
        })?;
        path.push(fragment.clone());
        current = *came_from.get(&key).ok_or_else(|| {
            AgentxError::InvalidState(format!("no predecessor recorded for state {key}"))
        })?;
    }
    path.reverse();
    Ok(path)
}

/// Agents allowed to extend `transcript`: when its last message requests
/// tool calls, only agents that register every requested tool.
fn eligible_agents<'a>(agents: &'a [Agent], transcript: &[Message]) -> Vec<&'a Agent> {
    match transcript.last() {
        Some(last) if last.has_tool_calls() => {
            agents.iter().filter(|agent| agent.can_satisfy(last)).collect()
        }
        _ => agents.iter().collect(),
    }
}

async fn expand(
    agent: &Agent,
    transcript: &[Message],
    timeout: Option<Duration>,
) -> Result<Option<Fragment>, AgentxError> {
    let reply = match timeout {
        Some(limit) => with_timeout(limit, agent.generate(transcript, None)).await?,
        None => agent.generate(transcript, None).await?,
    };
    Ok(reply.into_fragment())
}

/// Bookkeeping owned by one search call.
struct SearchState {
    root: StateKey,
    came_from: HashMap<StateKey, Option<StateKey>>,
    cost_so_far: HashMap<StateKey, f64>,
    heuristic_map: HashMap<StateKey, f64>,
    fragments: FragmentIndex,
    // first-discovery order, for deterministic fallback ties
    discovered: Vec<StateKey>,
}

impl SearchState {
    fn new(messages: Fragment, root_score: f64) -> Result<Self, AgentxError> {
        let root = StateKey::of(&messages)?;
        let mut fragments = FragmentIndex::new();
        fragments.insert(root, messages);
        Ok(Self {
            root,
            came_from: HashMap::from([(root, None)]),
            cost_so_far: HashMap::from([(root, 0.0)]),
            heuristic_map: HashMap::from([(root, root_score)]),
            fragments,
            discovered: vec![root],
        })
    }

    fn flatten_path(&self, path: &[StateKey]) -> Result<Vec<Message>, AgentxError> {
        let mut transcript = Vec::new();
        for key in path {
            let fragment = self.fragments.fragment(key).ok_or_else(|| {
                AgentxError::InvalidState(format!("no fragment recorded for state {key}"))
            })?;
            transcript.extend_from_slice(fragment);
        }
        Ok(transcript)
    }

    fn cost_of(&self, key: &StateKey) -> Result<f64, AgentxError> {
        self.cost_so_far
            .get(key)
            .copied()
            .ok_or_else(|| AgentxError::InvalidState(format!("no cost recorded for state {key}")))
    }

    fn heuristic_of(&self, key: &StateKey) -> Result<f64, AgentxError> {
        self.heuristic_map.get(key).copied().ok_or_else(|| {
            AgentxError::InvalidState(format!("no heuristic recorded for state {key}"))
        })
    }

    /// Unseen states always improve; seen ones only on a strictly lower cost.
    fn improves(&self, key: &StateKey, new_cost: f64) -> bool {
        self.cost_so_far
            .get(key)
            .map_or(true, |&previous| new_cost < previous)
    }

    fn relax(
        &mut self,
        key: StateKey,
        parent: StateKey,
        fragment: Fragment,
        cost: f64,
        score: f64,
    ) {
        if !self.heuristic_map.contains_key(&key) {
            self.discovered.push(key);
        }
        self.cost_so_far.insert(key, cost);
        self.came_from.insert(key, Some(parent));
        self.fragments.insert(key, fragment);
        self.heuristic_map.insert(key, score);
    }

    /// Key with the lowest recorded heuristic; ties go to the earliest
    /// discovered.
    fn best_scored(&self) -> StateKey {
        self.discovered
            .iter()
            .copied()
            .filter_map(|key| self.heuristic_map.get(&key).map(|&h| (key, h)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(self.root, |(key, _)| key)
    }

    fn finish(
        self,
        goal: StateKey,
        iterations: usize,
        termination: SearchTermination,
    ) -> Result<SearchOutcome, AgentxError> {
        let path = reconstruct_path(&self.came_from, &self.fragments, goal)?;
        Ok(SearchOutcome {
            path,
            goal,
            came_from: self.came_from,
            cost_so_far: self.cost_so_far,
            heuristic_map: self.heuristic_map,
            fragments: self.fragments,
            iterations,
            termination,
        })
    }
}
