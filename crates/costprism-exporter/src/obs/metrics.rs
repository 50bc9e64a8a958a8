//! The exporter's own counters.
//!
//! Counter and histogram types with dynamic labels backed by `DashMap`. Labels
//! are flattened into sorted key vectors to keep deterministic ordering, and
//! rendered series are sorted so two scrapes without activity in between are
//! identical. Histogram buckets are fixed in milliseconds to avoid floating
//! point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn series(name: &str, labels: &str) -> String {
    if labels.is_empty() {
        name.to_string()
    } else {
        format!("{name}{{{labels}}}")
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for one label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} counter");
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (label_str(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (labels, val) in rows {
            let _ = writeln!(out, "{} {}", series(name, &labels), val);
        }
    }
}

// Fixed buckets in milliseconds.
// 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s, 60s
const BUCKETS_MILLIS: [u64; 10] = [50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000, 60_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; BUCKETS_MILLIS.len()],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (millisecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(millis, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MILLIS.iter().enumerate() {
            if millis <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for one label set.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.value().count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format (unit: milliseconds).
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} histogram");
        let mut keys: Vec<LabelKey> = self.map.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        for key in keys {
            let Some(hist) = self.map.get(&key) else { continue };
            let labels = label_str(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{labels},") };

            for (i, &le) in BUCKETS_MILLIS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"{le}\"}} {count}");
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}_bucket{{{prefix}le=\"+Inf\"}} {count}");

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), &labels), sum);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_count"), &labels), count);
        }
    }
}

/// Refresh-loop health, rendered only when `server.self_metrics` is on.
#[derive(Default)]
pub struct ExporterMetrics {
    pub refresh_runs: CounterVec,
    pub refresh_skipped: CounterVec,
    pub refresh_panics: CounterVec,
    pub query_failures: CounterVec,
    pub query_duration: HistogramVec, // milliseconds
}

impl ExporterMetrics {
    /// Append every series to `out`.
    pub fn render_into(&self, out: &mut String) {
        self.refresh_runs.render(
            "costprism_refresh_runs_total",
            "Refresh runs started",
            out,
        );
        self.refresh_skipped.render(
            "costprism_refresh_skipped_total",
            "Ticks skipped because a refresh was still running",
            out,
        );
        self.refresh_panics.render(
            "costprism_refresh_panics_total",
            "Refresh runs that panicked",
            out,
        );
        self.query_failures.render(
            "costprism_query_failures_total",
            "Billing queries that failed, by metric and error code",
            out,
        );
        self.query_duration.render(
            "costprism_query_duration_millis",
            "Billing query latency in milliseconds",
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_labels_are_order_insensitive() {
        let c = CounterVec::default();
        c.inc(&[("metric", "a"), ("code", "UPSTREAM")]);
        c.inc(&[("code", "UPSTREAM"), ("metric", "a")]);
        assert_eq!(c.get(&[("metric", "a"), ("code", "UPSTREAM")]), 2);
        assert_eq!(c.get(&[("metric", "b")]), 0);
    }

    #[test]
    fn unlabeled_counter_renders_bare_series() {
        let m = ExporterMetrics::default();
        m.refresh_runs.inc(&[]);
        let mut out = String::new();
        m.render_into(&mut out);
        assert!(out.contains("\ncostprism_refresh_runs_total 1\n"));
        assert!(out.contains("# TYPE costprism_query_duration_millis histogram"));
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let h = HistogramVec::default();
        h.observe(&[("metric", "m")], Duration::from_millis(300));
        let mut out = String::new();
        h.render("q", "help", &mut out);
        assert!(out.contains("q_bucket{metric=\"m\",le=\"250\"} 0"));
        assert!(out.contains("q_bucket{metric=\"m\",le=\"500\"} 1"));
        assert!(out.contains("q_bucket{metric=\"m\",le=\"+Inf\"} 1"));
        assert!(out.contains("q_sum{metric=\"m\"} 300"));
        assert_eq!(h.count(&[("metric", "m")]), 1);
    }

    #[test]
    fn escapes_label_values() {
        assert_eq!(escape_label("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}
