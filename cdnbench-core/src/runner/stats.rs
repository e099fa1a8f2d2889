use serde::{Deserialize, Serialize};

/// Percentile of an ascending sample using linear interpolation between closest ranks.
///
/// The rank of `p` is `p / 100 * (n - 1)`; this matches numpy's default `linear` method.
/// An empty sample yields `0.0`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * ((n - 1) as f64);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }

    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Population (not sample) standard deviation. Empty input yields `0.0`.
pub fn population_std_dev(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// `successes / planned * 100`, or `0.0` when nothing was planned.
pub fn success_rate(successes: u64, planned: u64) -> f64 {
    if planned == 0 {
        return 0.0;
    }
    (successes as f64 / planned as f64) * 100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub std_dev: f64,
}

impl LatencyStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        Self {
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            p999: percentile(&sorted, 99.9),
            std_dev: population_std_dev(&sorted),
        }
    }
}
