use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use cdnbench_core::TrafficScenario;
use cdnbench_core::runner::{
    ErrorKind, PhaseEvent, PhaseOutcome, ProgressFn, ProgressUpdate, RunConfig, RunSummary,
    ScenarioSummary, ThresholdViolation,
};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _base_url: &str, _scenarios: &[TrafficScenario], _cfg: &RunConfig) {}

    fn progress(&self) -> Option<ProgressFn> {
        Some(Arc::new(move |u| {
            emit_json_line(&build_progress_line(&u));
        }))
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        emit_json_line(&build_summary_line(summary));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum JsonProgressLine<'a> {
    PhaseStarted {
        scenario: &'a str,
        phase: usize,
        phases: usize,
        planned: u64,
        requests_per_second: f64,
        duration_secs: f64,
        url: &'a str,
    },
    PhaseFinished {
        scenario: &'a str,
        phase: usize,
        phases: usize,
        planned: u64,
        attempted: u64,
        succeeded: u64,
        outcome: PhaseOutcome,
        elapsed_secs: f64,
    },
}

fn build_progress_line(u: &ProgressUpdate) -> JsonProgressLine<'_> {
    match &u.event {
        PhaseEvent::PhaseStarted {
            planned,
            target_rate,
            duration,
            url,
        } => JsonProgressLine::PhaseStarted {
            scenario: &u.scenario,
            phase: u.phase_index,
            phases: u.phase_count,
            planned: *planned,
            requests_per_second: *target_rate,
            duration_secs: duration.as_secs_f64(),
            url,
        },
        PhaseEvent::PhaseFinished {
            planned,
            attempted,
            succeeded,
            outcome,
            elapsed,
        } => JsonProgressLine::PhaseFinished {
            scenario: &u.scenario,
            phase: u.phase_index,
            phases: u.phase_count,
            planned: *planned,
            attempted: *attempted,
            succeeded: *succeeded,
            outcome: *outcome,
            elapsed_secs: elapsed.as_secs_f64(),
        },
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine<'a> {
    pub kind: &'static str,
    pub passed: bool,
    pub scenarios: &'a [ScenarioSummary],
    pub violations: Vec<JsonViolation<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonViolation<'a> {
    pub scenario: &'a str,
    pub success_rate: f64,
    pub min_success_rate: f64,
    pub successful_requests: u64,
    pub total_requests: u64,
    pub status_counts: &'a BTreeMap<u16, u64>,
    pub error_counts: &'a BTreeMap<ErrorKind, u64>,
}

impl<'a> From<&'a ThresholdViolation> for JsonViolation<'a> {
    fn from(v: &'a ThresholdViolation) -> Self {
        Self {
            scenario: &v.scenario,
            success_rate: v.success_rate,
            min_success_rate: v.min_success_rate,
            successful_requests: v.successful_requests,
            total_requests: v.total_requests,
            status_counts: &v.status_counts,
            error_counts: &v.error_counts,
        }
    }
}

fn build_summary_line(summary: &RunSummary) -> JsonSummaryLine<'_> {
    JsonSummaryLine {
        kind: "summary",
        passed: summary.passed(),
        scenarios: &summary.scenarios,
        violations: summary.violations.iter().map(JsonViolation::from).collect(),
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = out.write_all(b"\n");
        let _ = out.flush();
    }
}
