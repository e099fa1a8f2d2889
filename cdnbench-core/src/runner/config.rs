use std::num::NonZeroUsize;
use std::time::Duration;

use super::error::{Error, Result};

const DEFAULT_CONCURRENCY: usize = 64;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Upper bound on requests in flight at once. Submission blocks when it is reached.
    pub concurrency: NonZeroUsize,
    pub connect_timeout: Duration,
    /// Deadline for one request, response body included.
    pub request_timeout: Duration,
    /// Added to the phase duration to form the completion gate's allowance.
    pub grace_window: Duration,
    /// How long the gate waits for aborted requests to wind down.
    pub cancel_drain: Duration,
    /// Pause between consecutive phases of a scenario.
    pub phase_pause: Duration,
    /// Minimum success rate, in percent, for a scenario to pass.
    pub min_success_rate: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            grace_window: Duration::from_secs(30),
            cancel_drain: Duration::from_secs(1),
            phase_pause: Duration::from_millis(100),
            min_success_rate: 100.0,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_success_rate.is_finite() || !(0.0..=100.0).contains(&self.min_success_rate)
        {
            return Err(Error::InvalidSuccessThreshold(self.min_success_rate));
        }
        Ok(())
    }
}
