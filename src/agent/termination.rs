//! Termination policies: a veto checked before an agent generates.

use std::sync::Arc;

use crate::types::Message;

/// Decides, from the transcript alone, whether an agent should stay silent.
pub trait TerminationPolicy: Send + Sync {
    fn should_terminate(&self, transcript: &[Message]) -> bool;
}

/// Never terminate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl TerminationPolicy for Never {
    fn should_terminate(&self, _transcript: &[Message]) -> bool {
        false
    }
}

/// Terminate once the last message's text contains a marker such as `TERMINATE`.
#[derive(Debug, Clone)]
pub struct ContainsText {
    marker: String,
}

impl ContainsText {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl TerminationPolicy for ContainsText {
    fn should_terminate(&self, transcript: &[Message]) -> bool {
        last_text(transcript).is_some_and(|text| text.contains(&self.marker))
    }
}

/// Terminate when a regex matches the last message's text.
#[derive(Debug, Clone)]
pub struct RegexTermination {
    regex: regex::Regex,
}

impl RegexTermination {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: regex::Regex::new(pattern)?,
        })
    }
}

impl TerminationPolicy for RegexTermination {
    fn should_terminate(&self, transcript: &[Message]) -> bool {
        last_text(transcript).is_some_and(|text| self.regex.is_match(text))
    }
}

/// Terminate once the transcript holds at least `max_messages` messages.
#[derive(Debug, Clone, Copy)]
pub struct MaxMessages {
    max_messages: usize,
}

impl MaxMessages {
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }
}

impl TerminationPolicy for MaxMessages {
    fn should_terminate(&self, transcript: &[Message]) -> bool {
        transcript.len() >= self.max_messages
    }
}

/// Terminate when a custom predicate over the transcript returns true.
pub struct PredicateTermination<F: Fn(&[Message]) -> bool + Send + Sync> {
    predicate: F,
}

impl<F: Fn(&[Message]) -> bool + Send + Sync> PredicateTermination<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F: Fn(&[Message]) -> bool + Send + Sync> TerminationPolicy for PredicateTermination<F> {
    fn should_terminate(&self, transcript: &[Message]) -> bool {
        (self.predicate)(transcript)
    }
}

pub(crate) fn never() -> Arc<dyn TerminationPolicy> {
    Arc::new(Never)
}

fn last_text(transcript: &[Message]) -> Option<&str> {
    transcript.last().and_then(Message::text)
}
