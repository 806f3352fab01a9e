use std::collections::{HashMap, VecDeque};

use super::state::{CognitiveState, TransitionRecord};

const MAX_RECORDS: usize = 1_000;

/// Append-only transition history, bounded to the most recent records.
#[derive(Debug, Default)]
pub struct TransitionLog {
    buffer: VecDeque<TransitionRecord>,
    total: u64,
}

/// Aggregate view over the retained records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionSummary {
    pub total_transitions: u64,
    pub entered: HashMap<CognitiveState, u64>,
    /// Time spent in a state before leaving it, summed over retained records.
    pub time_in_ms: HashMap<CognitiveState, u64>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(64),
            total: 0,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.buffer.len() >= MAX_RECORDS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(record);
        self.total += 1;
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.buffer.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.buffer.back()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn summary(&self) -> TransitionSummary {
        let mut summary = TransitionSummary {
            total_transitions: self.total,
            ..TransitionSummary::default()
        };
        for record in &self.buffer {
            *summary.entered.entry(record.to).or_insert(0) += 1;
            *summary.time_in_ms.entry(record.from).or_insert(0) += record.previous_duration_ms;
        }
        summary
    }
}
