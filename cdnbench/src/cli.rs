use clap::{Args, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    humantime::parse_duration(s)
        .map_err(|err| format!("invalid duration '{s}': {err} (expected e.g. 10s, 250ms, 1m)"))
}

fn parse_percent(input: &str) -> Result<f64, String> {
    let value: f64 = input
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("invalid percentage '{input}' (expected a number within 0..=100)"))?;

    if !(0.0..=100.0).contains(&value) {
        return Err(format!("percentage {value} is outside 0..=100"));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bars and a text summary.
    HumanReadable,
    /// Emit JSON progress and summary lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "cdnbench",
    author,
    version,
    about = "Scheduled load generator for CDN edge caches",
    long_about = "cdnbench drives an HTTP origin or CDN edge with scheduled traffic.\n\nEach scenario is a list of phases; each phase sends GET requests to `<base-url>/cache/<payload_size>/<scenario>_phase` at a fixed rate for a fixed duration. After the last phase the scenario's latency percentiles and success rate are reported and optionally appended to a JSON Lines results file.",
    after_help = "Examples:\n  cdnbench list\n  cdnbench run steady_load --base-url http://edge.local\n  cdnbench run --scenarios traffic.yaml --concurrency 256 --output json\n  cdnbench run burst_test --min-success-rate 99.5 --results results.jsonl"
)]
pub struct Cli {
    /// Log line format (filter with RUST_LOG)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run traffic scenarios against a target
    #[command(
        long_about = "Run scenarios one after another, phase by phase.\n\nWithout --scenarios the built-in catalog is used. Positional names select scenarios from whichever catalog is active; with no names every scenario runs."
    )]
    Run(RunArgs),

    /// List available scenarios
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Scenario file (.json, .yaml or .yml) instead of the built-in catalog
    #[arg(long, value_name = "PATH")]
    pub scenarios: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Scenario names to run (default: all)
    #[arg(value_name = "SCENARIO")]
    pub names: Vec<String>,

    /// Scenario file (.json, .yaml or .yml) instead of the built-in catalog
    #[arg(long, value_name = "PATH")]
    pub scenarios: Option<PathBuf>,

    /// Target base URL (default: http://$HOSTNAME, or http://localhost)
    #[arg(long, env = "CDNBENCH_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum requests in flight
    #[arg(long, env = "CDNBENCH_CONCURRENCY", default_value = "64")]
    pub concurrency: NonZeroUsize,

    /// TCP connect timeout (e.g. 5s, 500ms)
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub connect_timeout: Duration,

    /// Whole-request timeout, body included
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub request_timeout: Duration,

    /// How long after a phase's nominal end to wait for stragglers
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub grace: Duration,

    /// Pause between consecutive phases
    #[arg(long, value_parser = parse_duration, default_value = "100ms")]
    pub phase_pause: Duration,

    /// Fail the run when a scenario's success rate is below this percentage
    #[arg(long, value_parser = parse_percent, default_value = "100")]
    pub min_success_rate: f64,

    /// Append one JSON record per scenario to this file
    #[arg(long, env = "CDNBENCH_RESULTS", value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
