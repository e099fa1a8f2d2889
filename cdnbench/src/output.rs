use cdnbench_core::TrafficScenario;
use cdnbench_core::runner::{ProgressFn, RunConfig, RunSummary};

use crate::cli::OutputFormat;

pub(crate) mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, base_url: &str, scenarios: &[TrafficScenario], cfg: &RunConfig);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
