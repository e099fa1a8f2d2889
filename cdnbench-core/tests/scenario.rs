use std::sync::{Arc, Mutex};
use std::time::Duration;

use cdnbench_core::runner::{
    Error, ErrorKind, PhaseEvent, ProgressFn, ProgressUpdate, RequestExecutor, RequestFuture,
    RequestOutcome, ResultSink, RunConfig, ScenarioRunner, ScenarioSummary, SinkFuture,
};
use cdnbench_core::{TrafficPhase, TrafficScenario};
use tokio::time::sleep;

/// Succeeds for `/cache/1/...` and times out for everything else.
struct SizeAwareExecutor;

impl RequestExecutor for SizeAwareExecutor {
    fn name(&self) -> &'static str {
        "size-aware"
    }

    fn execute<'a>(&'a self, url: &'a str) -> RequestFuture<'a> {
        Box::pin(async move {
            sleep(Duration::from_millis(20)).await;
            if url.contains("/cache/1/") {
                RequestOutcome::response(20.0, 200).with_bytes_received(1)
            } else {
                RequestOutcome::failed(20.0, ErrorKind::Timeout)
            }
        })
    }
}

#[derive(Default)]
struct MemorySink {
    stored: Mutex<Vec<ScenarioSummary>>,
}

impl MemorySink {
    fn stored(&self) -> Vec<ScenarioSummary> {
        self.stored
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ResultSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn store<'a>(&'a self, summary: &'a ScenarioSummary) -> SinkFuture<'a> {
        Box::pin(async move {
            self.stored
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(summary.clone());
            Ok(())
        })
    }
}

struct FailingSink;

impl ResultSink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn store<'a>(&'a self, _summary: &'a ScenarioSummary) -> SinkFuture<'a> {
        Box::pin(async { Err(Error::Io(std::io::Error::other("database unavailable"))) })
    }
}

fn config() -> RunConfig {
    RunConfig {
        grace_window: Duration::from_secs(5),
        phase_pause: Duration::from_millis(100),
        min_success_rate: 100.0,
        ..RunConfig::default()
    }
}

fn two_phase_scenario() -> TrafficScenario {
    TrafficScenario::new(
        "Mixed Sizes",
        vec![
            TrafficPhase::new(Duration::from_secs(2), 5.0, 1),
            TrafficPhase::new(Duration::from_secs(1), 4.0, 2),
        ],
    )
}

#[tokio::test(start_paused = true)]
async fn scenario_aggregates_across_phases() {
    let runner = ScenarioRunner::new(Arc::new(SizeAwareExecutor), config(), "http://cdn.test/");

    let run = runner.run_scenario(&two_phase_scenario()).await;
    let summary = &run.summary;

    assert_eq!(run.phases.len(), 2);
    assert_eq!(summary.pattern, "Mixed Sizes");
    assert_eq!(summary.total_requests, 14);
    assert_eq!(summary.attempted_requests, 14);
    assert_eq!(summary.successful_requests, 10);
    assert_eq!(summary.bytes_received, 10);
    assert_eq!(summary.status_counts.get(&200), Some(&10));
    assert_eq!(summary.error_counts.get(&ErrorKind::Timeout), Some(&4));
    assert!((summary.success_rate - 1000.0 / 14.0).abs() < 1e-9);
    assert!((summary.p50 - 20.0).abs() < 1e-9);
    assert!(summary.start_time <= summary.end_time);

    assert_eq!(summary.phases.len(), 2);
    assert_eq!(
        summary.phases[0].url,
        "http://cdn.test/cache/1/mixed_sizes_phase"
    );
    assert_eq!(
        summary.phases[1].url,
        "http://cdn.test/cache/2/mixed_sizes_phase"
    );
    assert_eq!(summary.phases[1].success_rate, 0.0);

    let violation = match run.verify(100.0) {
        Err(v) => v,
        Ok(()) => panic!("a partially failing scenario must not pass a 100% threshold"),
    };
    assert_eq!(violation.scenario, "Mixed Sizes");
    assert_eq!(violation.successful_requests, 10);
    assert_eq!(violation.total_requests, 14);
    assert!(violation.to_string().contains("below the minimum"));
    assert!(run.verify(50.0).is_ok());
}

#[tokio::test(start_paused = true)]
async fn sink_receives_exactly_one_summary_per_scenario() {
    let sink = Arc::new(MemorySink::default());
    let runner = ScenarioRunner::new(Arc::new(SizeAwareExecutor), config(), "http://cdn.test")
        .with_sink(sink.clone());

    let scenario = TrafficScenario::new(
        "steady",
        vec![TrafficPhase::new(Duration::from_secs(1), 3.0, 1)],
    );
    let run = runner.run_scenario(&scenario).await;

    let stored = sink.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], run.summary);
}

#[tokio::test(start_paused = true)]
async fn sink_failure_does_not_lose_the_summary() {
    let runner = ScenarioRunner::new(Arc::new(SizeAwareExecutor), config(), "http://cdn.test")
        .with_sink(Arc::new(FailingSink));

    let scenario = TrafficScenario::new(
        "steady",
        vec![TrafficPhase::new(Duration::from_secs(1), 3.0, 1)],
    );
    let run = runner.run_scenario(&scenario).await;

    assert_eq!(run.summary.successful_requests, 3);
    assert_eq!(run.summary.success_rate, 100.0);
}

#[tokio::test(start_paused = true)]
async fn progress_reports_each_phase_in_order() {
    let events: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::default();
    let progress: ProgressFn = {
        let events = events.clone();
        Arc::new(move |update| {
            events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(update);
        })
    };

    let runner = ScenarioRunner::new(Arc::new(SizeAwareExecutor), config(), "http://cdn.test")
        .with_progress(progress);
    runner.run_scenario(&two_phase_scenario()).await;

    let events = events.lock().unwrap_or_else(|e| e.into_inner()).clone();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.phase_count == 2));

    match &events[0].event {
        PhaseEvent::PhaseStarted { planned, url, .. } => {
            assert_eq!(*planned, 10);
            assert!(url.ends_with("/cache/1/mixed_sizes_phase"));
        }
        other => panic!("expected PhaseStarted, got {other:?}"),
    }
    match &events[1].event {
        PhaseEvent::PhaseFinished {
            attempted,
            succeeded,
            ..
        } => {
            assert_eq!(*attempted, 10);
            assert_eq!(*succeeded, 10);
        }
        other => panic!("expected PhaseFinished, got {other:?}"),
    }
    assert_eq!(events[2].phase_index, 1);
    assert!(matches!(
        events[3].event,
        PhaseEvent::PhaseFinished { succeeded: 0, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn run_scenarios_collects_threshold_violations() {
    let runner = ScenarioRunner::new(Arc::new(SizeAwareExecutor), config(), "http://cdn.test");
    let passing = TrafficScenario::new(
        "small",
        vec![TrafficPhase::new(Duration::from_secs(1), 2.0, 1)],
    );
    let failing = TrafficScenario::new(
        "large",
        vec![TrafficPhase::new(Duration::from_secs(1), 2.0, 8)],
    );

    let summary = runner.run_scenarios(&[passing, failing]).await;

    assert_eq!(summary.scenarios.len(), 2);
    assert_eq!(summary.violations.len(), 1);
    assert_eq!(summary.violations[0].scenario, "large");
    assert!(!summary.passed());
}

#[tokio::test(start_paused = true)]
async fn scenario_that_plans_nothing_passes_the_default_threshold() {
    let runner = ScenarioRunner::new(
        Arc::new(SizeAwareExecutor),
        RunConfig::default(),
        "http://cdn.test",
    );
    let idle = TrafficScenario::new(
        "idle",
        vec![
            TrafficPhase::new(Duration::from_secs(5), 0.0, 1),
            TrafficPhase::new(Duration::ZERO, 10.0, 1),
        ],
    );
    let empty = TrafficScenario::new("empty", Vec::new());

    let summary = runner.run_scenarios(&[idle, empty]).await;

    assert_eq!(summary.scenarios.len(), 2);
    for s in &summary.scenarios {
        assert_eq!(s.total_requests, 0);
        assert_eq!(s.attempted_requests, 0);
        assert_eq!(s.success_rate, 0.0);
    }
    assert!(summary.violations.is_empty());
    assert!(summary.passed());
}
