use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::{Instant, sleep_until};

use super::aggregate::PhaseResult;
use super::config::RunConfig;
use super::executor::RequestExecutor;
use super::gate::CompletionGate;
use super::outcome::{ErrorKind, RequestOutcome};
use super::plan::PhasePlan;
use crate::catalog::TrafficPhase;

/// Run one phase: pace submissions against the plan, bound concurrency, then close the gate.
///
/// Each planned request waits for its fire time (late ones go out immediately, with no
/// skipping) and then for a concurrency permit. A saturated pool therefore throttles
/// submission below the nominal rate instead of failing.
pub async fn run_phase<E>(
    executor: &Arc<E>,
    url: &str,
    phase: &TrafficPhase,
    cfg: &RunConfig,
) -> PhaseResult
where
    E: RequestExecutor,
{
    let plan = PhasePlan::new(phase.duration, phase.target_rate);
    if plan.is_empty() {
        return PhaseResult::empty();
    }

    let url: Arc<str> = Arc::from(url);
    let permits = Arc::new(Semaphore::new(
        cfg.concurrency.get().min(Semaphore::MAX_PERMITS),
    ));
    let mut gate = CompletionGate::new(plan.planned_count(), cfg.cancel_drain);

    let started = Instant::now();
    let mut behind_max = std::time::Duration::ZERO;

    for fire_at in plan.iter_fire_times(started) {
        sleep_until(fire_at).await;

        let permit = match permits.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                // The semaphore is never closed; account for the slot anyway.
                gate.submit(async { RequestOutcome::failed(0.0, ErrorKind::ExecutionError) });
                continue;
            }
        };
        behind_max = behind_max.max(Instant::now().saturating_duration_since(fire_at));

        let executor = executor.clone();
        let url = url.clone();
        gate.submit(async move {
            let outcome = executor.execute(&url).await;
            drop(permit);
            outcome
        });

        gate.collect_ready();
    }

    tracing::debug!(
        planned = plan.planned_count(),
        submit_elapsed_ms = started.elapsed().as_millis() as u64,
        max_lag_ms = behind_max.as_millis() as u64,
        outstanding = gate.outstanding(),
        "phase submission finished"
    );

    gate.close(phase.duration + cfg.grace_window).await
}
