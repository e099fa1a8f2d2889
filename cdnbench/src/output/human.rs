use std::sync::Arc;

use cdnbench_core::TrafficScenario;
use cdnbench_core::runner::{PhaseEvent, ProgressFn, RunConfig, RunSummary};

pub(crate) mod format;
mod progress;
mod summary;

use format::{format_bytes, format_duration, format_percent};
use progress::HumanProgress;
use summary::{render, render_violations};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, base_url: &str, scenarios: &[TrafficScenario], cfg: &RunConfig) {
        println!("target: {base_url}");
        println!(
            "concurrency={} request_timeout={} grace={} min_success_rate={}",
            cfg.concurrency,
            format_duration(cfg.request_timeout),
            format_duration(cfg.grace_window),
            format_percent(cfg.min_success_rate)
        );
        for s in scenarios {
            println!(
                "scenario: {} phases={} duration={}",
                s.name,
                s.schedule.len(),
                format_duration(s.nominal_duration())
            );
        }
        if !scenarios.is_empty() {
            println!();
        }
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u| {
            let (done, message) = match &u.event {
                PhaseEvent::PhaseStarted {
                    planned,
                    target_rate,
                    duration,
                    ..
                } => (
                    u.phase_index,
                    format!(
                        "rps={target_rate} planned={planned} duration={}",
                        format_duration(*duration)
                    ),
                ),
                PhaseEvent::PhaseFinished {
                    planned,
                    attempted,
                    succeeded,
                    outcome,
                    elapsed,
                } => (
                    u.phase_index + 1,
                    format!(
                        "ok={succeeded}/{planned} attempted={attempted} {outcome} in {}",
                        format_duration(*elapsed)
                    ),
                ),
            };

            progress.update(&u.scenario, u.phase_count, done, message);
        }))
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(summary));

        if !summary.violations.is_empty() {
            eprint!("{}", render_violations(&summary.violations));
        }

        let bytes: u64 = summary.scenarios.iter().map(|s| s.bytes_received).sum();
        if bytes > 0 {
            println!("received {}", format_bytes(bytes));
        }

        Ok(())
    }
}
