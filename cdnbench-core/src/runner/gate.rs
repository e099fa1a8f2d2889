use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, timeout_at};

use super::aggregate::{PhaseAggregator, PhaseOutcome, PhaseResult};
use super::outcome::{ErrorKind, RequestOutcome};

/// Owns a phase's in-flight requests and is the single writer of its aggregator.
///
/// Every submitted request is accounted for exactly once: by its own outcome, as
/// `ExecutionError` if its task failed, or as `Incomplete` if the gate closed before it
/// resolved. An `Incomplete` request whose task ignores the abort past `cancel_drain` is
/// moved to `BatchTimeout` rather than counted twice. Results that arrive after the gate
/// closed are discarded.
#[derive(Debug)]
pub struct CompletionGate {
    tasks: JoinSet<RequestOutcome>,
    agg: PhaseAggregator,
    cancel_drain: Duration,
}

impl CompletionGate {
    pub fn new(planned_count: u64, cancel_drain: Duration) -> Self {
        Self {
            tasks: JoinSet::new(),
            agg: PhaseAggregator::new(planned_count),
            cancel_drain,
        }
    }

    pub fn submit<F>(&mut self, request: F)
    where
        F: Future<Output = RequestOutcome> + Send + 'static,
    {
        self.tasks.spawn(request);
    }

    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Fold in whatever has already finished, without waiting.
    pub fn collect_ready(&mut self) {
        while let Some(res) = self.tasks.try_join_next() {
            self.accept(res);
        }
    }

    fn accept(&mut self, res: Result<RequestOutcome, JoinError>) {
        match res {
            Ok(outcome) => self.agg.record(outcome),
            Err(err) => {
                tracing::warn!(error = %err, "request task failed");
                self.agg.record_unresolved(ErrorKind::ExecutionError, 1);
            }
        }
    }

    /// Wait up to `allowance` for all outstanding requests, then cancel the stragglers.
    pub async fn close(mut self, allowance: Duration) -> PhaseResult {
        let deadline = Instant::now() + allowance;

        loop {
            match timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(res)) => self.accept(res),
                Ok(None) => return self.agg.finish(PhaseOutcome::Completed),
                Err(_) => break,
            }
        }

        let outstanding = self.tasks.len() as u64;
        tracing::warn!(
            outstanding,
            allowance_ms = allowance.as_millis() as u64,
            "phase gate timed out, cancelling outstanding requests"
        );
        self.agg.record_unresolved(ErrorKind::Incomplete, outstanding);
        self.tasks.abort_all();

        let drain_deadline = Instant::now() + self.cancel_drain;
        while let Ok(Some(_late)) = timeout_at(drain_deadline, self.tasks.join_next()).await {}

        let stuck = self.tasks.len() as u64;
        if stuck > 0 {
            tracing::warn!(stuck, "requests did not acknowledge cancellation");
            self.agg
                .reclassify(ErrorKind::Incomplete, ErrorKind::BatchTimeout, stuck);
            self.tasks.detach_all();
        }

        self.agg.finish(PhaseOutcome::CompletedWithTimeouts)
    }
}
