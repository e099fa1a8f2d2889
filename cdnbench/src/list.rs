use cdnbench_core::TrafficScenario;

use crate::cli::ListArgs;
use crate::output::human::format::{format_bytes, format_duration};
use crate::run_error::RunError;
use crate::scenarios::load_catalog;

pub fn list(args: ListArgs) -> Result<(), RunError> {
    let scenarios = load_catalog(args.scenarios.as_deref()).map_err(RunError::InvalidInput)?;
    print!("{}", render(&scenarios));
    Ok(())
}

fn render(scenarios: &[TrafficScenario]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for s in scenarios {
        let peak_rate = s
            .schedule
            .iter()
            .map(|p| p.target_rate)
            .fold(0.0_f64, f64::max);
        let max_payload = s.schedule.iter().map(|p| p.payload_size).max().unwrap_or(0);

        writeln!(
            out,
            "{}: phases={} duration={} peak_rps={peak_rate} max_payload={}",
            s.name,
            s.schedule.len(),
            format_duration(s.nominal_duration()),
            format_bytes(max_payload)
        )
        .ok();
    }
    out
}
