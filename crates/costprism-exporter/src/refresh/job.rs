use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};

use costprism_core::billing::DateAnchors;
use costprism_core::error::{ExporterError, Result};
use costprism_core::metric::MetricId;

use crate::billing::BillingClient;
use crate::obs::{ExporterMetrics, MetricRegistry};

/// Outcome of one run. A metric is in exactly one of the two lists.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshReport {
    pub updated: Vec<MetricId>,
    pub failed: Vec<MetricId>,
}

/// Queries every enabled gauge once and writes what succeeded.
///
/// Holds no state between runs besides what it writes into the registry.
pub struct RefreshJob {
    client: Arc<dyn BillingClient>,
    registry: Arc<MetricRegistry>,
    metrics: Arc<ExporterMetrics>,
    query_timeout: Duration,
}

impl RefreshJob {
    pub fn new(
        client: Arc<dyn BillingClient>,
        registry: Arc<MetricRegistry>,
        metrics: Arc<ExporterMetrics>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            client,
            registry,
            metrics,
            query_timeout,
        }
    }

    /// Run against the current UTC date.
    pub async fn run(&self) -> RefreshReport {
        self.run_at(Utc::now().date_naive()).await
    }

    /// Run with every date range derived from `today`.
    pub async fn run_at(&self, today: NaiveDate) -> RefreshReport {
        let mut report = RefreshReport::default();
        let definitions = self.registry.definitions();

        let anchors = match DateAnchors::at(today) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(%today, error = %e, "cannot derive date ranges, skipping run");
                report.failed = definitions.iter().map(|d| d.id).collect();
                return report;
            }
        };

        tracing::info!(%today, metrics = definitions.len(), "calculating costs");

        for def in definitions {
            let id = def.id;
            match self.refresh_one(id, &anchors).await {
                Ok(value) => {
                    if self.registry.set(id, value) {
                        tracing::info!(metric = id.name(), value, "metric updated");
                        report.updated.push(id);
                    } else {
                        report.failed.push(id);
                    }
                }
                Err(e) => {
                    let code = e.code().as_str();
                    tracing::warn!(metric = id.name(), code, error = %e, "metric refresh failed, keeping previous value");
                    self.metrics
                        .query_failures
                        .inc(&[("metric", id.name()), ("code", code)]);
                    report.failed.push(id);
                }
            }
        }

        tracing::info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "finished calculating costs"
        );
        report
    }

    async fn refresh_one(&self, id: MetricId, anchors: &DateAnchors) -> Result<f64> {
        let q = id.query(anchors)?;
        tracing::debug!(
            metric = id.name(),
            range = %q.range,
            granularity = q.granularity.as_str(),
            kind = q.kind.api_name(),
            "querying billing api"
        );

        let started = Instant::now();
        let res = tokio::time::timeout(self.query_timeout, self.client.query(&q)).await;
        self.metrics
            .query_duration
            .observe(&[("metric", id.name())], started.elapsed());

        match res {
            Ok(r) => r,
            Err(_) => Err(ExporterError::Upstream(format!(
                "query timed out after {}s",
                self.query_timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use costprism_core::billing::BillingQuery;
    use costprism_core::metric::MetricDefinition;

    use super::*;

    struct Never;

    #[async_trait]
    impl BillingClient for Never {
        async fn query(&self, _q: &BillingQuery) -> Result<f64> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_query_times_out_as_upstream_error() {
        let registry = Arc::new(MetricRegistry::new(&[MetricDefinition {
            id: MetricId::MonthlyCost,
            enabled: true,
        }]));
        let metrics = Arc::new(ExporterMetrics::default());
        let job = RefreshJob::new(
            Arc::new(Never),
            registry.clone(),
            metrics.clone(),
            Duration::from_secs(3),
        );

        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let report = job.run_at(today).await;

        assert_eq!(report.failed, vec![MetricId::MonthlyCost]);
        assert_eq!(registry.get(MetricId::MonthlyCost), None);
        assert_eq!(
            metrics
                .query_failures
                .get(&[("metric", "aws_monyhly_costs"), ("code", "UPSTREAM")]),
            1
        );
    }
}
