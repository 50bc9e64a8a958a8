//! In-process metrics.
//!
//! `registry` holds the billing gauges the exporter exists to publish;
//! `metrics` holds the exporter's own counters. Both render to the Prometheus
//! text format for the `/metrics` handler.

pub mod metrics;
pub mod registry;

pub use metrics::ExporterMetrics;
pub use registry::MetricRegistry;
