use std::path::Path;

use anyhow::Context as _;
use cdnbench_core::{TrafficScenario, builtin_scenarios, load_scenarios};

/// The scenario file when given, the built-in catalog otherwise.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<Vec<TrafficScenario>> {
    match path {
        Some(path) => load_scenarios(path)
            .with_context(|| format!("failed to load scenarios from {}", path.display())),
        None => Ok(builtin_scenarios()),
    }
}

/// Keep the named scenarios in the order requested; no names keeps everything.
pub fn select(
    catalog: Vec<TrafficScenario>,
    names: &[String],
) -> anyhow::Result<Vec<TrafficScenario>> {
    if names.is_empty() {
        anyhow::ensure!(!catalog.is_empty(), "no scenarios to run");
        return Ok(catalog);
    }

    names
        .iter()
        .map(|name| {
            catalog
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .with_context(|| {
                    let known = catalog
                        .iter()
                        .map(|s| s.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("unknown scenario `{name}` (available: {known})")
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_keeps_requested_order() -> anyhow::Result<()> {
        let names = vec!["burst_test".to_string(), "steady_load".to_string()];
        let picked = select(builtin_scenarios(), &names)?;
        let picked: Vec<&str> = picked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(picked, vec!["burst_test", "steady_load"]);
        Ok(())
    }

    #[test]
    fn select_rejects_unknown_names() {
        let err = match select(builtin_scenarios(), &["nope".to_string()]) {
            Err(err) => err,
            Ok(v) => panic!("expected error, got {v:?}"),
        };
        assert!(err.to_string().contains("unknown scenario `nope`"));
    }

    #[test]
    fn select_rejects_empty_catalog() {
        assert!(select(Vec::new(), &[]).is_err());
    }
}
