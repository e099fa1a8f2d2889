use std::sync::Arc;
use std::time::Duration;

use super::aggregate::PhaseOutcome;

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub scenario: String,
    /// Zero-based.
    pub phase_index: usize,
    pub phase_count: usize,
    pub event: PhaseEvent,
}

#[derive(Debug, Clone)]
pub enum PhaseEvent {
    PhaseStarted {
        planned: u64,
        target_rate: f64,
        duration: Duration,
        url: String,
    },
    PhaseFinished {
        planned: u64,
        attempted: u64,
        succeeded: u64,
        outcome: PhaseOutcome,
        elapsed: Duration,
    },
}
