//! Path cost and heuristic functions that steer the search.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::agent::Agent;
use crate::error::AgentxError;
use crate::types::{Message, OutputSchema, Role};

/// Cost of extending `prior` (flattened) with `next`. Should be pure so
/// search traces are reproducible.
pub trait CostFunction: Send + Sync {
    fn cost(&self, prior: &[Message], next: &[Message]) -> f64;
}

impl<F> CostFunction for F
where
    F: Fn(&[Message], &[Message]) -> f64 + Send + Sync,
{
    fn cost(&self, prior: &[Message], next: &[Message]) -> f64 {
        self(prior, next)
    }
}

/// Estimated distance from a flattened transcript to the goal.
///
/// `Ok(None)` means "no signal": callers carry the parent's score forward.
/// Errors propagate to the caller of the search.
#[async_trait]
pub trait Heuristic: Send + Sync {
    async fn score(&self, transcript: &[Message]) -> Result<Option<f64>, AgentxError>;
}

#[async_trait]
impl<F> Heuristic for F
where
    F: Fn(&[Message]) -> Option<f64> + Send + Sync,
{
    async fn score(&self, transcript: &[Message]) -> Result<Option<f64>, AgentxError> {
        Ok(self(transcript))
    }
}

/// Heuristic that never gives a signal.
pub fn no_signal(_transcript: &[Message]) -> Option<f64> {
    None
}

/// Counts the model turns in `next`; tool responses are free.
pub fn llm_call_cost(_prior: &[Message], next: &[Message]) -> f64 {
    next.iter().filter(|m| m.role != Role::Tool).count() as f64
}

const DEFAULT_INSTRUCTION: &str = "Estimate the progress of solving the problem.";

#[derive(Deserialize)]
struct ScoreReply {
    score: f64,
}

/// Heuristic that asks a scoring agent to rate progress from 0 to
/// `max_score` and returns `max_score - score`.
#[derive(Debug, Clone)]
pub struct AgentHeuristic {
    scorer: Agent,
    max_score: f64,
    instruction: String,
}

impl AgentHeuristic {
    pub fn new(scorer: Agent) -> Self {
        Self {
            scorer,
            max_score: 10.0,
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }

    pub fn with_max_score(mut self, max_score: f64) -> Self {
        self.max_score = max_score;
        self
    }

    /// What the scorer should judge, e.g. "Give 10 once the distance is computed."
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(
            "HeuristicScore",
            json!({
                "type": "object",
                "properties": { "score": { "type": "number" } },
                "required": ["score"],
            }),
        )
    }

    fn prompt(&self, transcript: &[Message]) -> Result<Vec<Message>, AgentxError> {
        let history = transcript
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vec![
            Message::user(format!("Base on this chat history: [{}]", history.join(", "))),
            Message::user(format!(
                "{} Give a score between 0 and {} where {} means the problem is solved. \
                 You must reply a JSON object.",
                self.instruction, self.max_score, self.max_score
            )),
        ])
    }
}

#[async_trait]
impl Heuristic for AgentHeuristic {
    async fn score(&self, transcript: &[Message]) -> Result<Option<f64>, AgentxError> {
        let prompt = self.prompt(transcript)?;
        let schema = self.output_schema();
        let Some(fragment) = self.scorer.generate(&prompt, Some(&schema)).await?.into_fragment()
        else {
            return Ok(None);
        };
        let Some(text) = fragment.last().and_then(Message::text) else {
            return Ok(None);
        };
        let reply: ScoreReply = serde_json::from_str(text)?;
        Ok(Some(self.max_score - reply.score.clamp(0.0, self.max_score)))
    }
}
