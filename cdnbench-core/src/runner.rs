mod aggregate;
mod config;
mod dispatch;
mod error;
mod executor;
mod gate;
mod outcome;
mod plan;
mod progress;
mod scenario;
mod sink;
mod stats;
mod summary;

pub use aggregate::{PhaseAggregator, PhaseOutcome, PhaseResult, ScenarioAggregator};
pub use config::RunConfig;
pub use dispatch::run_phase;
pub use error::{Error, Result, ThresholdViolation};
pub use executor::{HttpExecutor, RequestExecutor, RequestFuture};
pub use gate::CompletionGate;
pub use outcome::{ErrorKind, RequestOutcome, SUCCESS_STATUS};
pub use plan::PhasePlan;
pub use progress::{PhaseEvent, ProgressFn, ProgressUpdate};
pub use scenario::{ScenarioRun, ScenarioRunner};
pub use sink::{JsonLinesSink, ResultSink, SinkFuture, SummaryRecord};
pub use stats::{LatencyStats, percentile, population_std_dev, success_rate};
pub use summary::{PhaseReport, RunSummary, ScenarioSummary};
