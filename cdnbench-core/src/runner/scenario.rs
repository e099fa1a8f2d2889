use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

use super::aggregate::{PhaseResult, ScenarioAggregator};
use super::config::RunConfig;
use super::dispatch::run_phase;
use super::error::ThresholdViolation;
use super::executor::RequestExecutor;
use super::plan::PhasePlan;
use super::progress::{PhaseEvent, ProgressFn, ProgressUpdate};
use super::sink::ResultSink;
use super::summary::{PhaseReport, RunSummary, ScenarioSummary};
use crate::catalog::{TrafficScenario, target_url};

/// A finished scenario: its summary plus the raw per-phase results.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub summary: ScenarioSummary,
    pub phases: Vec<PhaseResult>,
}

impl ScenarioRun {
    pub fn verify(&self, min_success_rate: f64) -> Result<(), ThresholdViolation> {
        self.summary.check_success_threshold(min_success_rate)
    }
}

pub struct ScenarioRunner<E> {
    executor: Arc<E>,
    cfg: RunConfig,
    base_url: String,
    sink: Option<Arc<dyn ResultSink>>,
    progress: Option<ProgressFn>,
}

impl<E> ScenarioRunner<E>
where
    E: RequestExecutor,
{
    pub fn new(executor: Arc<E>, cfg: RunConfig, base_url: impl Into<String>) -> Self {
        Self {
            executor,
            cfg,
            base_url: base_url.into(),
            sink: None,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.cfg
    }

    /// Run every phase in schedule order, summarize, and hand the summary to the sink.
    pub async fn run_scenario(&self, scenario: &TrafficScenario) -> ScenarioRun {
        let start_time = Utc::now();
        let phase_count = scenario.schedule.len();
        tracing::info!(
            scenario = %scenario.name,
            phases = phase_count,
            executor = self.executor.name(),
            "scenario started"
        );

        let mut agg = ScenarioAggregator::default();
        let mut reports = Vec::with_capacity(phase_count);
        let mut phases = Vec::with_capacity(phase_count);

        for (idx, phase) in scenario.schedule.iter().enumerate() {
            if idx > 0 && !self.cfg.phase_pause.is_zero() {
                tokio::time::sleep(self.cfg.phase_pause).await;
            }

            let url = target_url(&self.base_url, scenario, phase);
            let planned = PhasePlan::new(phase.duration, phase.target_rate).planned_count();

            tracing::info!(
                scenario = %scenario.name,
                phase = idx,
                planned,
                rate = phase.target_rate,
                duration_ms = phase.duration.as_millis() as u64,
                url = %url,
                "phase started"
            );
            self.emit(
                scenario,
                idx,
                PhaseEvent::PhaseStarted {
                    planned,
                    target_rate: phase.target_rate,
                    duration: phase.duration,
                    url: url.clone(),
                },
            );

            let phase_started = Instant::now();
            let res = run_phase(&self.executor, &url, phase, &self.cfg).await;
            let elapsed = phase_started.elapsed();

            tracing::info!(
                scenario = %scenario.name,
                phase = idx,
                planned = res.planned_count,
                attempted = res.attempted_count,
                succeeded = res.success_count,
                outcome = %res.outcome,
                elapsed_ms = elapsed.as_millis() as u64,
                "phase finished"
            );
            self.emit(
                scenario,
                idx,
                PhaseEvent::PhaseFinished {
                    planned: res.planned_count,
                    attempted: res.attempted_count,
                    succeeded: res.success_count,
                    outcome: res.outcome,
                    elapsed,
                },
            );

            agg.absorb(&res);
            reports.push(PhaseReport::from_result(idx, url, &res));
            phases.push(res);
        }

        let summary =
            ScenarioSummary::new(scenario.name.clone(), agg, reports, start_time, Utc::now());
        tracing::info!(
            scenario = %summary.pattern,
            total = summary.total_requests,
            succeeded = summary.successful_requests,
            success_rate = summary.success_rate,
            p50 = summary.p50,
            p95 = summary.p95,
            p99 = summary.p99,
            p999 = summary.p999,
            std_dev = summary.std_dev,
            "scenario finished"
        );

        self.persist(&summary).await;

        ScenarioRun { summary, phases }
    }

    /// Run scenarios one after another and check each against the success threshold.
    pub async fn run_scenarios(&self, scenarios: &[TrafficScenario]) -> RunSummary {
        let mut out = RunSummary::default();

        for scenario in scenarios {
            let run = self.run_scenario(scenario).await;
            if let Err(violation) = run.verify(self.cfg.min_success_rate) {
                tracing::warn!(scenario = %scenario.name, "{violation}");
                out.violations.push(violation);
            }
            out.scenarios.push(run.summary);
        }

        out
    }

    async fn persist(&self, summary: &ScenarioSummary) {
        let Some(sink) = &self.sink else {
            return;
        };

        match sink.store(summary).await {
            Ok(()) => tracing::debug!(sink = sink.name(), scenario = %summary.pattern, "summary stored"),
            Err(err) => tracing::warn!(
                sink = sink.name(),
                scenario = %summary.pattern,
                error = %err,
                "failed to store scenario summary"
            ),
        }
    }

    fn emit(&self, scenario: &TrafficScenario, phase_index: usize, event: PhaseEvent) {
        if let Some(progress) = &self.progress {
            progress(ProgressUpdate {
                scenario: scenario.name.clone(),
                phase_index,
                phase_count: scenario.schedule.len(),
                event,
            });
        }
    }
}
