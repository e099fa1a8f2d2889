use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::outcome::{ErrorKind, RequestOutcome};

/// How a phase's completion gate resolved. There is no failed state: failures are counted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseOutcome {
    Completed,
    CompletedWithTimeouts,
}

/// Everything observed during one phase.
///
/// Every attempted request lands in exactly one of `status_counts` or `error_counts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub latencies: Vec<f64>,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
    pub success_count: u64,
    pub attempted_count: u64,
    pub planned_count: u64,
    pub bytes_received: u64,
    pub outcome: PhaseOutcome,
}

impl PhaseResult {
    /// Result for a phase that planned nothing.
    pub fn empty() -> Self {
        PhaseAggregator::new(0).finish(PhaseOutcome::Completed)
    }

    pub fn accounted_count(&self) -> u64 {
        self.status_counts.values().sum::<u64>() + self.error_counts.values().sum::<u64>()
    }

    pub fn error_count(&self, kind: ErrorKind) -> u64 {
        self.error_counts.get(&kind).copied().unwrap_or(0)
    }
}

/// Single-writer accumulator for one phase.
///
/// Only the coordinating flow that joins request tasks writes to it, so outcomes delivered
/// by concurrent requests are serialized through that one point.
#[derive(Debug)]
pub struct PhaseAggregator {
    latencies: Vec<f64>,
    status_counts: BTreeMap<u16, u64>,
    error_counts: BTreeMap<ErrorKind, u64>,
    success_count: u64,
    attempted_count: u64,
    planned_count: u64,
    bytes_received: u64,
}

impl PhaseAggregator {
    pub fn new(planned_count: u64) -> Self {
        Self {
            latencies: Vec::with_capacity(planned_count.min(1 << 20) as usize),
            status_counts: BTreeMap::new(),
            error_counts: BTreeMap::new(),
            success_count: 0,
            attempted_count: 0,
            planned_count,
            bytes_received: 0,
        }
    }

    pub fn record(&mut self, outcome: RequestOutcome) {
        self.attempted_count += 1;
        self.bytes_received = self.bytes_received.saturating_add(outcome.bytes_received);

        match (outcome.status, outcome.error) {
            (Some(status), _) => {
                *self.status_counts.entry(status).or_insert(0) += 1;
                if outcome.is_success() {
                    self.success_count += 1;
                }
                if outcome.latency_ms.is_finite() {
                    self.latencies.push(outcome.latency_ms);
                }
            }
            (None, Some(kind)) => self.record_error(kind, 1),
            // An outcome with neither is a bug in the producer; keep the partition intact.
            (None, None) => self.record_error(ErrorKind::ExecutionError, 1),
        }
    }

    /// Account for `count` requests that never resolved, without a latency sample.
    pub fn record_unresolved(&mut self, kind: ErrorKind, count: u64) {
        if count == 0 {
            return;
        }
        self.attempted_count += count;
        self.record_error(kind, count);
    }

    /// Move `count` already-recorded entries from one error kind to another.
    pub fn reclassify(&mut self, from: ErrorKind, to: ErrorKind, count: u64) {
        let available = self.error_counts.get(&from).copied().unwrap_or(0);
        let moved = count.min(available);
        if moved == 0 {
            return;
        }
        if moved == available {
            self.error_counts.remove(&from);
        } else {
            self.error_counts.insert(from, available - moved);
        }
        self.record_error(to, moved);
    }

    fn record_error(&mut self, kind: ErrorKind, count: u64) {
        *self.error_counts.entry(kind).or_insert(0) += count;
    }

    pub fn attempted_count(&self) -> u64 {
        self.attempted_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn finish(self, outcome: PhaseOutcome) -> PhaseResult {
        PhaseResult {
            latencies: self.latencies,
            status_counts: self.status_counts,
            error_counts: self.error_counts,
            success_count: self.success_count,
            attempted_count: self.attempted_count,
            planned_count: self.planned_count,
            bytes_received: self.bytes_received,
            outcome,
        }
    }
}

/// Scenario-wide view accumulated from finished phases.
#[derive(Debug, Default, Clone)]
pub struct ScenarioAggregator {
    pub latencies: Vec<f64>,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
    pub success_count: u64,
    pub attempted_count: u64,
    pub planned_count: u64,
    pub bytes_received: u64,
}

impl ScenarioAggregator {
    pub fn absorb(&mut self, phase: &PhaseResult) {
        self.latencies.extend_from_slice(&phase.latencies);
        for (status, count) in &phase.status_counts {
            *self.status_counts.entry(*status).or_insert(0) += count;
        }
        for (kind, count) in &phase.error_counts {
            *self.error_counts.entry(*kind).or_insert(0) += count;
        }
        self.success_count += phase.success_count;
        self.attempted_count += phase.attempted_count;
        self.planned_count += phase.planned_count;
        self.bytes_received = self.bytes_received.saturating_add(phase.bytes_received);
    }
}
