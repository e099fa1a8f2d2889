use std::collections::BTreeMap;
use std::fmt::Display;
use std::time::Duration;

pub(crate) fn format_bytes(b: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;

    if b >= GIB {
        return format!("{:.2}GiB", (b as f64) / (GIB as f64));
    }
    if b >= MIB {
        return format!("{:.2}MiB", (b as f64) / (MIB as f64));
    }
    if b >= KIB {
        return format!("{:.2}KiB", (b as f64) / (KIB as f64));
    }

    format!("{b}B")
}

/// Whole milliseconds are enough for schedule-level durations.
pub(crate) fn format_duration(d: Duration) -> String {
    let rounded = Duration::from_millis(d.as_millis() as u64);
    humantime::format_duration(rounded).to_string()
}

pub(crate) fn format_ms(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.2}ms")
    } else {
        "n/a".to_string()
    }
}

pub(crate) fn format_percent(v: f64) -> String {
    format!("{v:.2}%")
}

/// `k=v` pairs separated by spaces, or `-` when empty.
pub(crate) fn format_counts<K: Display>(counts: &BTreeMap<K, u64>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }

    counts
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}
