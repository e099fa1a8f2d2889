use std::fmt::Write as _;

use cdnbench_core::runner::{RunSummary, ScenarioSummary, ThresholdViolation};

use super::format::{format_bytes, format_counts, format_ms, format_percent};

pub(crate) fn render(summary: &RunSummary) -> String {
    let mut out = String::new();

    if summary.scenarios.is_empty() {
        out.push_str("summary: no scenarios\n");
        return out;
    }

    out.push_str("summary\n");
    for s in &summary.scenarios {
        render_scenario(s, &mut out);
        out.push('\n');
    }

    out
}

fn render_scenario(s: &ScenarioSummary, out: &mut String) {
    writeln!(out, "scenario: {}", s.pattern).ok();
    writeln!(
        out,
        "  requests: planned {} attempted {} succeeded {} ({})",
        s.total_requests,
        s.attempted_requests,
        s.successful_requests,
        format_percent(s.success_rate)
    )
    .ok();
    writeln!(out, "  bytes: recv {}", format_bytes(s.bytes_received)).ok();

    if s.status_counts.is_empty() {
        out.push_str("  latency: n/a\n");
    } else {
        writeln!(
            out,
            "  latency = p50={} p95={} p99={} p99.9={} stdev={}",
            format_ms(s.p50),
            format_ms(s.p95),
            format_ms(s.p99),
            format_ms(s.p999),
            format_ms(s.std_dev)
        )
        .ok();
    }

    writeln!(out, "  status: {}", format_counts(&s.status_counts)).ok();
    if !s.error_counts.is_empty() {
        writeln!(out, "  errors: {}", format_counts(&s.error_counts)).ok();
    }

    let elapsed = (s.end_time - s.start_time).num_milliseconds().max(0);
    writeln!(out, "  elapsed: {:.3}s", elapsed as f64 / 1000.0).ok();

    if s.phases.len() > 1 {
        for p in &s.phases {
            writeln!(
                out,
                "  phase {}: ok {}/{} ({}) p50={} {}",
                p.index,
                p.successful_requests,
                p.planned_requests,
                format_percent(p.success_rate),
                format_ms(p.latency.p50),
                p.outcome
            )
            .ok();
        }
    }
}

pub(crate) fn render_violations(violations: &[ThresholdViolation]) -> String {
    let mut out = String::from("success threshold failed:\n");
    for v in violations {
        writeln!(
            out,
            "  {}: {} < {} ({}/{} ok; status {}; errors {})",
            v.scenario,
            format_percent(v.success_rate),
            format_percent(v.min_success_rate),
            v.successful_requests,
            v.total_requests,
            format_counts(&v.status_counts),
            format_counts(&v.error_counts)
        )
        .ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdnbench_core::runner::{ErrorKind, ScenarioAggregator};
    use chrono::{TimeDelta, Utc};
    use std::collections::BTreeMap;

    fn summary() -> ScenarioSummary {
        let agg = ScenarioAggregator {
            latencies: vec![10.0, 20.0, 30.0],
            status_counts: BTreeMap::from([(200, 2), (503, 1)]),
            error_counts: BTreeMap::from([(ErrorKind::Timeout, 1)]),
            success_count: 2,
            attempted_count: 4,
            planned_count: 4,
            bytes_received: 3 * 1024,
        };
        let start = Utc::now();
        ScenarioSummary::new(
            "steady_load".to_string(),
            agg,
            Vec::new(),
            start,
            start + TimeDelta::milliseconds(1500),
        )
    }

    #[test]
    fn render_includes_counts_and_percentiles() {
        let out = render(&RunSummary {
            scenarios: vec![summary()],
            violations: Vec::new(),
        });

        assert!(out.starts_with("summary\n"));
        assert!(out.contains("scenario: steady_load\n"));
        assert!(out.contains("requests: planned 4 attempted 4 succeeded 2 (50.00%)"));
        assert!(out.contains("bytes: recv 3.00KiB"));
        assert!(out.contains("p50=20.00ms"));
        assert!(out.contains("status: 200=2 503=1"));
        assert!(out.contains("errors: timeout=1"));
        assert!(out.contains("elapsed: 1.500s"));
    }

    #[test]
    fn render_without_scenarios() {
        assert_eq!(render(&RunSummary::default()), "summary: no scenarios\n");
    }

    #[test]
    fn violations_name_the_scenario() {
        let violation = match summary().check_success_threshold(100.0) {
            Err(v) => v,
            Ok(()) => panic!("50% must not pass a 100% threshold"),
        };

        let out = render_violations(&[violation]);
        assert!(out.contains("steady_load: 50.00% < 100.00% (2/4 ok; status 200=2 503=1; errors timeout=1)"));
    }
}
