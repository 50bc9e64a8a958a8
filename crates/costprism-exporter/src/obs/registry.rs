//! Billing gauge registry.
//!
//! Holds the latest value of every enabled gauge. Only the refresh job writes;
//! `/metrics` reads. Each entry is locked on its own, so a reader sees every
//! gauge either before or after a given write, never in between.

use std::fmt::Write;

use dashmap::DashMap;

use costprism_core::metric::{MetricDefinition, MetricId};

pub struct MetricRegistry {
    enabled: Vec<MetricDefinition>,
    values: DashMap<MetricId, f64>,
}

impl MetricRegistry {
    /// Keep only enabled definitions, in `MetricId` order.
    pub fn new(definitions: &[MetricDefinition]) -> Self {
        let mut enabled: Vec<MetricDefinition> =
            definitions.iter().copied().filter(|d| d.enabled).collect();
        enabled.sort_by_key(|d| d.id);
        enabled.dedup_by_key(|d| d.id);
        Self {
            enabled,
            values: DashMap::new(),
        }
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.enabled
    }

    pub fn is_enabled(&self, id: MetricId) -> bool {
        self.enabled.iter().any(|d| d.id == id)
    }

    /// Store the latest value. Writes for a disabled gauge are dropped and
    /// reported as `false`.
    pub fn set(&self, id: MetricId, value: f64) -> bool {
        if !self.is_enabled(id) {
            tracing::warn!(metric = id.name(), "set on disabled metric ignored");
            return false;
        }
        self.values.insert(id, value);
        true
    }

    pub fn get(&self, id: MetricId) -> Option<f64> {
        self.values.get(&id).map(|v| *v.value())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    /// Prometheus text format. Gauges never set are left out entirely.
    pub fn render_into(&self, out: &mut String) {
        for def in &self.enabled {
            let Some(value) = self.get(def.id) else { continue };
            let name = def.name();
            let _ = writeln!(out, "# HELP {name} {}", def.help());
            let _ = writeln!(out, "# TYPE {name} gauge");
            let _ = writeln!(out, "{name} {}", format_value(value));
        }
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else {
        v.to_string()
    }
}
