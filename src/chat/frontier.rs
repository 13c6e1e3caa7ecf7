//! Min-priority frontier with insertion-order tie breaking.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::state::StateKey;

#[derive(Debug)]
struct FrontierEntry {
    priority: f64,
    seq: u64,
    path: Vec<StateKey>,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    // Reversed: BinaryHeap is a max-heap and we pop the lowest priority,
    // earliest pushed first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Paths waiting to be expanded. Stale entries for relaxed states are
/// left in place and popped normally.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, priority: f64, path: Vec<StateKey>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FrontierEntry {
            priority,
            seq,
            path,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<(f64, Vec<StateKey>)> {
        self.heap.pop().map(|entry| (entry.priority, entry.path))
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
