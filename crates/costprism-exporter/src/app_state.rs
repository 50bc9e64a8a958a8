//! Shared application state.
//!
//! Built once at startup from a validated config. The gauge registry is the
//! only piece the refresh loop and the HTTP handlers both touch.

use std::sync::Arc;

use costprism_core::metric::MetricId;

use crate::billing::BillingClient;
use crate::config::ExporterConfig;
use crate::obs::{ExporterMetrics, MetricRegistry};
use crate::refresh::{RefreshJob, Scheduler};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<MetricRegistry>,
    metrics: Arc<ExporterMetrics>,
    job: Arc<RefreshJob>,
}

struct AppStateInner {
    cfg: ExporterConfig,
}

impl AppState {
    pub fn new(cfg: ExporterConfig, client: Arc<dyn BillingClient>) -> Self {
        let registry = Arc::new(MetricRegistry::new(&cfg.definitions()));
        let metrics = Arc::new(ExporterMetrics::default());
        let job = Arc::new(RefreshJob::new(
            client,
            Arc::clone(&registry),
            Arc::clone(&metrics),
            cfg.refresh.query_timeout(),
        ));

        let enabled: Vec<&'static str> = registry.definitions().iter().map(|d| d.name()).collect();
        if enabled.is_empty() {
            tracing::warn!("no metrics enabled; /metrics will stay empty");
        } else {
            tracing::info!(?enabled, "metrics enabled");
        }

        Self {
            inner: Arc::new(AppStateInner { cfg }),
            registry,
            metrics,
            job,
        }
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<ExporterMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn job(&self) -> Arc<RefreshJob> {
        Arc::clone(&self.job)
    }

    pub fn enabled_metrics(&self) -> Vec<MetricId> {
        self.registry.definitions().iter().map(|d| d.id).collect()
    }

    /// Scheduler over this state's job, timed from config.
    pub fn scheduler(&self) -> Scheduler {
        let refresh = &self.inner.cfg.refresh;
        Scheduler::new(
            self.job(),
            self.metrics(),
            refresh.query_period(),
            refresh.initial_delay(),
        )
        .with_shutdown_grace(refresh.shutdown_grace())
    }

    /// Body for `/metrics`: billing gauges, then self metrics if enabled.
    pub fn render_metrics(&self) -> String {
        let mut out = self.registry.render();
        if self.inner.cfg.server.self_metrics {
            self.metrics.render_into(&mut out);
        }
        out
    }
}
