use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One bar per scenario, advancing one step per finished phase.
pub(crate) struct HumanProgress {
    inner: Mutex<Inner>,
}

struct Inner {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));

        Self {
            inner: Mutex::new(Inner {
                multi,
                bars: HashMap::new(),
            }),
        }
    }

    pub(crate) fn update(&self, scenario: &str, phase_count: usize, done: usize, message: String) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let pb = inner.bar(scenario, phase_count);
        pb.set_position(done.min(phase_count) as u64);
        pb.set_message(message);
        if done >= phase_count {
            pb.finish();
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (_, pb) in inner.bars.drain() {
            pb.finish_and_clear();
        }

        let _ = inner.multi.clear();
    }
}

impl Inner {
    fn bar(&mut self, scenario: &str, phase_count: usize) -> &ProgressBar {
        self.bars.entry(scenario.to_string()).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(phase_count as u64));
            pb.set_style(bar_style());
            pb.set_prefix(scenario.to_string());
            pb.enable_steady_tick(Duration::from_millis(200));
            pb
        })
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix} [ {bar:20.cyan/blue} ] phase {pos}/{len} {elapsed_precise} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█░")
}
