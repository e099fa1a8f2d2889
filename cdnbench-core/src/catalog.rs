//! Scenario definitions: the built-in CDN traffic catalog and the scenario file loader.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::{Error, Result};

/// One mebibyte, the unit payload sizes in the built-in catalog are expressed in.
pub const BASE_SIZE: u64 = 1_048_576;

const DEFAULT_SCENARIO_NAME: &str = "generic_scenario";

/// A fixed-duration segment of a scenario with a constant rate and payload size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficPhase {
    #[serde(default = "default_duration", with = "duration_serde")]
    pub duration: Duration,

    /// Requests per second.
    #[serde(
        rename = "requests_per_second",
        alias = "target_rate",
        alias = "rate",
        default = "default_rate"
    )]
    pub target_rate: f64,

    /// Bytes per response.
    #[serde(default = "default_payload_size")]
    pub payload_size: u64,
}

impl TrafficPhase {
    pub fn new(duration: Duration, target_rate: f64, payload_size: u64) -> Self {
        Self {
            duration,
            target_rate,
            payload_size,
        }
    }

    fn secs(duration_secs: u64, target_rate: f64, payload_size: u64) -> Self {
        Self::new(Duration::from_secs(duration_secs), target_rate, payload_size)
    }
}

fn default_duration() -> Duration {
    Duration::from_secs(1)
}

fn default_rate() -> f64 {
    1.0
}

fn default_payload_size() -> u64 {
    1
}

fn default_name() -> String {
    DEFAULT_SCENARIO_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficScenario {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub schedule: Vec<TrafficPhase>,
}

impl TrafficScenario {
    pub fn new(name: impl Into<String>, schedule: Vec<TrafficPhase>) -> Self {
        Self {
            name: name.into(),
            schedule,
        }
    }

    /// Sum of phase durations, excluding gate grace and inter-phase pauses.
    pub fn nominal_duration(&self) -> Duration {
        self.schedule.iter().map(|p| p.duration).sum()
    }

    fn validate(&self) -> Result<()> {
        for (idx, phase) in self.schedule.iter().enumerate() {
            if !phase.target_rate.is_finite() || phase.target_rate < 0.0 {
                return Err(Error::InvalidRate {
                    scenario: self.name.clone(),
                    phase: idx,
                    rate: phase.target_rate,
                });
            }
        }
        Ok(())
    }
}

pub fn builtin_scenarios() -> Vec<TrafficScenario> {
    let mb10 = BASE_SIZE * 10;

    vec![
        // 100 MB/s steady.
        TrafficScenario::new("steady_load", vec![TrafficPhase::secs(10, 10.0, mb10)]),
        // 125 MB/s peak.
        TrafficScenario::new("burst_test", vec![TrafficPhase::secs(1, 12.5, mb10)]),
        TrafficScenario::new(
            "spike_pattern",
            vec![
                TrafficPhase::secs(5, 5.0, mb10),
                TrafficPhase::secs(2, 12.0, mb10),
                TrafficPhase::secs(8, 3.0, mb10),
            ],
        ),
        TrafficScenario::new(
            "ramp_up_down",
            vec![
                TrafficPhase::secs(2, 5.0, mb10),
                TrafficPhase::secs(2, 8.0, mb10),
                TrafficPhase::secs(2, 12.5, mb10),
                TrafficPhase::secs(2, 8.0, mb10),
                TrafficPhase::secs(2, 5.0, mb10),
            ],
        ),
        TrafficScenario::new("sustained_load", vec![TrafficPhase::secs(300, 8.0, mb10)]),
        // Same byte rate, different object sizes.
        TrafficScenario::new(
            "mixed_payload_sizes",
            vec![
                TrafficPhase::secs(30, 12.5, mb10),
                TrafficPhase::secs(30, 2.5, BASE_SIZE * 50),
                TrafficPhase::secs(30, 5.0, BASE_SIZE * 25),
            ],
        ),
        TrafficScenario::new(
            "oscillating_load",
            vec![
                TrafficPhase::secs(10, 5.0, mb10),
                TrafficPhase::secs(10, 8.0, mb10),
                TrafficPhase::secs(10, 5.0, mb10),
                TrafficPhase::secs(10, 8.0, mb10),
            ],
        ),
        TrafficScenario::new("stress_test", vec![TrafficPhase::secs(60, 12.5, mb10)]),
    ]
}

pub fn builtin_scenario(name: &str) -> Option<TrafficScenario> {
    builtin_scenarios().into_iter().find(|s| s.name == name)
}

/// Load scenarios from a `.json`, `.yaml` or `.yml` file.
pub fn load_scenarios(path: &Path) -> Result<Vec<TrafficScenario>> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::ScenarioFileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let scenarios: Vec<TrafficScenario> = match ext.as_str() {
        "json" => serde_json::from_str(&contents).map_err(|e| Error::ScenarioFileParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| Error::ScenarioFileParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        other => {
            return Err(Error::UnsupportedScenarioFile {
                path: path.to_path_buf(),
                extension: other.to_string(),
            });
        }
    };

    for s in &scenarios {
        s.validate()?;
    }

    Ok(scenarios)
}

/// Lowercased scenario name with spaces replaced by underscores.
pub fn scenario_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// `<base>/cache/<payload_size>/<slug>_phase`
pub fn target_url(base: &str, scenario: &TrafficScenario, phase: &TrafficPhase) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    format!(
        "{base}/cache/{}/{}_phase",
        phase.payload_size,
        scenario_slug(&scenario.name)
    )
}

mod duration_serde {
    use std::time::Duration;

    use serde::{Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.subsec_nanos() == 0 {
            serializer.serialize_u64(value.as_secs())
        } else {
            serializer.serialize_str(&humantime::format_duration(*value).to_string())
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = Duration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 10s), integer seconds, or float seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Duration::from_secs(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v < 0 {
                    return Err(E::custom("duration must be non-negative"));
                }
                Ok(Duration::from_secs(v as u64))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom("duration must be a finite non-negative number"));
                }
                Duration::try_from_secs_f64(v).map_err(E::custom)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                humantime::parse_duration(v.trim()).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn builtin_catalog_matches_known_patterns() {
        let names: Vec<String> = builtin_scenarios().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "steady_load",
                "burst_test",
                "spike_pattern",
                "ramp_up_down",
                "sustained_load",
                "mixed_payload_sizes",
                "oscillating_load",
                "stress_test",
            ]
        );

        let spike = builtin_scenario("spike_pattern")
            .unwrap_or_else(|| panic!("spike_pattern should exist"));
        assert_eq!(spike.schedule.len(), 3);
        assert_eq!(spike.schedule[1].target_rate, 12.0);
        assert_eq!(spike.nominal_duration(), Duration::from_secs(15));

        let mixed = builtin_scenario("mixed_payload_sizes")
            .unwrap_or_else(|| panic!("mixed_payload_sizes should exist"));
        assert_eq!(mixed.schedule[1].payload_size, 50 * BASE_SIZE);
        assert!(builtin_scenario("nope").is_none());
    }

    #[test]
    fn target_url_follows_cache_convention() {
        let scenario = TrafficScenario::new("Spike Pattern", vec![]);
        let phase = TrafficPhase::secs(1, 1.0, 1024);
        assert_eq!(
            target_url("http://cdn.local/", &scenario, &phase),
            "http://cdn.local/cache/1024/spike_pattern_phase"
        );
        assert_eq!(
            target_url("http://cdn.local", &scenario, &phase),
            "http://cdn.local/cache/1024/spike_pattern_phase"
        );
    }

    #[test]
    fn loads_json_with_defaults_and_aliases() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap_or_else(|e| panic!("tempfile: {e}"));
        let doc = r#"[
            {"name": "edge warmup", "schedule": [
                {"duration": 2, "requests_per_second": 12.5, "payload_size": 10},
                {"duration": "500ms", "rate": 4},
                {}
            ]},
            {"schedule": [{"duration": 1.5, "target_rate": 0}]}
        ]"#;
        file.write_all(doc.as_bytes())
            .unwrap_or_else(|e| panic!("write: {e}"));

        let scenarios = load_scenarios(file.path()).unwrap_or_else(|e| panic!("load: {e}"));
        assert_eq!(scenarios.len(), 2);

        let first = &scenarios[0];
        assert_eq!(first.name, "edge warmup");
        assert_eq!(first.schedule[0].target_rate, 12.5);
        assert_eq!(first.schedule[1].duration, Duration::from_millis(500));
        assert_eq!(first.schedule[1].target_rate, 4.0);
        assert_eq!(first.schedule[1].payload_size, 1);
        assert_eq!(first.schedule[2], TrafficPhase::secs(1, 1.0, 1));

        assert_eq!(scenarios[1].name, DEFAULT_SCENARIO_NAME);
        assert_eq!(scenarios[1].schedule[0].duration, Duration::from_millis(1500));
    }

    #[test]
    fn loads_yaml() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap_or_else(|e| panic!("tempfile: {e}"));
        let doc = "- name: night_batch\n  schedule:\n    - duration: 10s\n      requests_per_second: 3\n      payload_size: 2048\n";
        file.write_all(doc.as_bytes())
            .unwrap_or_else(|e| panic!("write: {e}"));

        let scenarios = load_scenarios(file.path()).unwrap_or_else(|e| panic!("load: {e}"));
        assert_eq!(
            scenarios,
            vec![TrafficScenario::new(
                "night_batch",
                vec![TrafficPhase::secs(10, 3.0, 2048)]
            )]
        );
    }

    #[test]
    fn rejects_negative_rate() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap_or_else(|e| panic!("tempfile: {e}"));
        file.write_all(br#"[{"name": "bad", "schedule": [{"rate": 1}, {"rate": -2}]}]"#)
            .unwrap_or_else(|e| panic!("write: {e}"));

        match load_scenarios(file.path()) {
            Err(Error::InvalidRate { scenario, phase, .. }) => {
                assert_eq!(scenario, "bad");
                assert_eq!(phase, 1);
            }
            other => panic!("expected InvalidRate, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_duration_is_a_parse_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap_or_else(|e| panic!("tempfile: {e}"));
        file.write_all(br#"[{"name": "x", "schedule": [{"duration": 1e30, "rate": 1}]}]"#)
            .unwrap_or_else(|e| panic!("write: {e}"));

        match load_scenarios(file.path()) {
            Err(Error::ScenarioFileParse { message, .. }) => {
                assert!(!message.is_empty());
            }
            other => panic!("expected ScenarioFileParse, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_and_unknown_extension_are_errors() {
        assert!(matches!(
            load_scenarios(Path::new("/definitely/not/here.json")),
            Err(Error::ScenarioFileRead { .. })
        ));

        let file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap_or_else(|e| panic!("tempfile: {e}"));
        assert!(matches!(
            load_scenarios(file.path()),
            Err(Error::UnsupportedScenarioFile { .. })
        ));
    }
}
