use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::{PhaseOutcome, PhaseResult, ScenarioAggregator};
use super::error::ThresholdViolation;
use super::outcome::ErrorKind;
use super::stats::{LatencyStats, success_rate};

/// Per-phase slice of a scenario summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub index: usize,
    pub url: String,
    pub planned_requests: u64,
    pub attempted_requests: u64,
    pub successful_requests: u64,
    pub success_rate: f64,
    pub outcome: PhaseOutcome,
    pub latency: LatencyStats,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
}

impl PhaseReport {
    pub fn from_result(index: usize, url: String, res: &PhaseResult) -> Self {
        Self {
            index,
            url,
            planned_requests: res.planned_count,
            attempted_requests: res.attempted_count,
            successful_requests: res.success_count,
            success_rate: success_rate(res.success_count, res.planned_count),
            outcome: res.outcome,
            latency: LatencyStats::from_samples(&res.latencies),
            status_counts: res.status_counts.clone(),
            error_counts: res.error_counts.clone(),
        }
    }
}

/// Final statistics of one scenario, computed once after its last phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub pattern: String,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub std_dev: f64,
    /// Percent of planned requests that returned 200.
    pub success_rate: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub successful_requests: u64,
    /// Planned requests summed over phases.
    pub total_requests: u64,
    pub attempted_requests: u64,
    pub bytes_received: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_counts: BTreeMap<ErrorKind, u64>,
    pub phases: Vec<PhaseReport>,
}

impl ScenarioSummary {
    pub fn new(
        pattern: String,
        agg: ScenarioAggregator,
        phases: Vec<PhaseReport>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let latency = LatencyStats::from_samples(&agg.latencies);

        Self {
            pattern,
            p50: latency.p50,
            p95: latency.p95,
            p99: latency.p99,
            p999: latency.p999,
            std_dev: latency.std_dev,
            success_rate: success_rate(agg.success_count, agg.planned_count),
            start_time,
            end_time,
            successful_requests: agg.success_count,
            total_requests: agg.planned_count,
            attempted_requests: agg.attempted_count,
            bytes_received: agg.bytes_received,
            status_counts: agg.status_counts,
            error_counts: agg.error_counts,
            phases,
        }
    }

    pub fn latency(&self) -> LatencyStats {
        LatencyStats {
            p50: self.p50,
            p95: self.p95,
            p99: self.p99,
            p999: self.p999,
            std_dev: self.std_dev,
        }
    }

    /// A scenario that planned nothing has nothing to fail and always passes.
    pub fn check_success_threshold(&self, min_success_rate: f64) -> Result<(), ThresholdViolation> {
        if self.total_requests == 0 || self.success_rate >= min_success_rate {
            return Ok(());
        }

        Err(ThresholdViolation {
            scenario: self.pattern.clone(),
            success_rate: self.success_rate,
            min_success_rate,
            successful_requests: self.successful_requests,
            total_requests: self.total_requests,
            status_counts: self.status_counts.clone(),
            error_counts: self.error_counts.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub scenarios: Vec<ScenarioSummary>,
    pub violations: Vec<ThresholdViolation>,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}
