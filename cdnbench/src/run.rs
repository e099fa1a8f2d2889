use std::sync::Arc;

use anyhow::Context as _;
use cdnbench_core::runner::{HttpExecutor, JsonLinesSink, RunConfig, ScenarioRunner};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;
use crate::scenarios::{load_catalog, select};

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    let catalog = load_catalog(args.scenarios.as_deref()).map_err(RunError::InvalidInput)?;
    let scenarios = select(catalog, &args.names).map_err(RunError::InvalidInput)?;

    let cfg = run_config(&args);
    cfg.validate()
        .context("invalid run configuration")
        .map_err(RunError::InvalidInput)?;

    let base_url = resolve_base_url(args.base_url.as_deref()).map_err(RunError::InvalidInput)?;

    out.print_header(&base_url, &scenarios, &cfg);

    let executor = Arc::new(HttpExecutor::from_config(&cfg));
    let mut runner = ScenarioRunner::new(executor, cfg, base_url);
    if let Some(path) = &args.results {
        tracing::info!(path = %path.display(), "appending results");
        runner = runner.with_sink(Arc::new(JsonLinesSink::new(path)));
    }
    if let Some(progress) = out.progress() {
        runner = runner.with_progress(progress);
    }

    let summary = runner.run_scenarios(&scenarios).await;

    out.print_summary(&summary)
        .context("failed to print summary")
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_threshold(summary.passed()))
}

fn run_config(args: &RunArgs) -> RunConfig {
    RunConfig {
        concurrency: args.concurrency,
        connect_timeout: args.connect_timeout,
        request_timeout: args.request_timeout,
        grace_window: args.grace,
        phase_pause: args.phase_pause,
        min_success_rate: args.min_success_rate,
        ..RunConfig::default()
    }
}

/// `--base-url`/`CDNBENCH_BASE_URL`, else `http://$HOSTNAME`, else `http://localhost`.
fn resolve_base_url(explicit: Option<&str>) -> anyhow::Result<String> {
    let base = match explicit {
        Some(url) => url.trim().to_string(),
        None => {
            let host = std::env::var("HOSTNAME")
                .ok()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| "localhost".to_string());
            format!("http://{}", host.trim())
        }
    };

    anyhow::ensure!(
        base.starts_with("http://"),
        "base url must start with http:// (got `{base}`)"
    );
    Ok(base.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_base_url_is_normalized() -> anyhow::Result<()> {
        assert_eq!(
            resolve_base_url(Some(" http://edge.test/ "))?,
            "http://edge.test"
        );
        Ok(())
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        assert!(resolve_base_url(Some("https://edge.test")).is_err());
        assert!(resolve_base_url(Some("edge.test")).is_err());
    }

    #[test]
    fn fallback_base_url_is_http() -> anyhow::Result<()> {
        assert!(resolve_base_url(None)?.starts_with("http://"));
        Ok(())
    }
}
