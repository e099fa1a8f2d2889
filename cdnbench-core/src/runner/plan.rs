use std::time::Duration;

use tokio::time::Instant;

/// Guards `ceil` against float noise such as `10.0 * 0.7 == 7.000000000000001`.
const PLAN_EPSILON: f64 = 1e-9;

/// Open-loop fire-time schedule for one phase.
///
/// Request `i` is due at `start + i / rate`. Fire times are never re-derived from observed
/// delivery lag: under sustained overrun submissions fall behind and the drift accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasePlan {
    planned: u64,
    interval: Duration,
    rate: f64,
}

impl PhasePlan {
    pub fn new(duration: Duration, target_rate: f64) -> Self {
        if !target_rate.is_finite() || target_rate <= 0.0 || duration.is_zero() {
            return Self::empty();
        }

        let raw = duration.as_secs_f64() * target_rate;
        let planned = (raw - PLAN_EPSILON).ceil().max(0.0) as u64;
        if planned == 0 {
            return Self::empty();
        }

        Self {
            planned,
            interval: Duration::try_from_secs_f64(1.0 / target_rate).unwrap_or(Duration::MAX),
            rate: target_rate,
        }
    }

    fn empty() -> Self {
        Self {
            planned: 0,
            interval: Duration::ZERO,
            rate: 0.0,
        }
    }

    pub fn planned_count(&self) -> u64 {
        self.planned
    }

    pub fn is_empty(&self) -> bool {
        self.planned == 0
    }

    /// Nominal spacing between consecutive requests.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offset of request `i` from the phase start.
    pub fn offset(&self, i: u64) -> Duration {
        if self.rate <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(i as f64 / self.rate).unwrap_or(Duration::MAX)
    }

    pub fn fire_at(&self, start: Instant, i: u64) -> Instant {
        start + self.offset(i)
    }

    pub fn iter_fire_times(&self, start: Instant) -> impl Iterator<Item = Instant> + '_ {
        (0..self.planned).map(move |i| self.fire_at(start, i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_count_is_ceiling() {
        assert_eq!(PhasePlan::new(Duration::from_secs(10), 5.0).planned_count(), 50);
        assert_eq!(PhasePlan::new(Duration::from_secs(1), 12.5).planned_count(), 13);
        assert_eq!(PhasePlan::new(Duration::from_secs(2), 12.5).planned_count(), 25);
        assert_eq!(PhasePlan::new(Duration::from_secs(10), 0.7).planned_count(), 7);
        assert_eq!(PhasePlan::new(Duration::from_millis(500), 3.0).planned_count(), 2);
    }

    #[test]
    fn zero_rate_or_duration_is_empty() {
        assert!(PhasePlan::new(Duration::from_secs(10), 0.0).is_empty());
        assert!(PhasePlan::new(Duration::ZERO, 10.0).is_empty());
        assert!(PhasePlan::new(Duration::from_secs(1), f64::NAN).is_empty());
        assert!(PhasePlan::new(Duration::from_secs(1), -3.0).is_empty());

        let start = Instant::now();
        assert_eq!(
            PhasePlan::new(Duration::ZERO, 10.0)
                .iter_fire_times(start)
                .count(),
            0
        );
    }

    #[test]
    fn vanishing_rate_plans_nothing() {
        let plan = PhasePlan::new(Duration::from_secs(1), 1e-20);
        assert!(plan.is_empty());
        assert_eq!(plan.interval(), Duration::ZERO);
        assert_eq!(plan.iter_fire_times(Instant::now()).count(), 0);

        let long = PhasePlan::new(Duration::from_secs(3600), f64::MIN_POSITIVE);
        assert!(long.is_empty());
    }

    #[test]
    fn fire_times_are_evenly_spaced_and_monotonic() {
        let plan = PhasePlan::new(Duration::from_secs(1), 4.0);
        let start = Instant::now();
        let times: Vec<Instant> = plan.iter_fire_times(start).collect();

        assert_eq!(times.len(), 4);
        assert_eq!(times[0], start);
        assert_eq!(plan.interval(), Duration::from_millis(250));
        for w in times.windows(2) {
            assert!(w[0] <= w[1]);
            assert_eq!(w[1] - w[0], Duration::from_millis(250));
        }
    }
}
