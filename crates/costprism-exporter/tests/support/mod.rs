//! Shared test fixtures: a scripted billing client and small helpers.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use costprism_core::billing::{BillingQuery, DateAnchors};
use costprism_core::error::Result;
use costprism_core::metric::{MetricDefinition, MetricId};
use costprism_exporter::billing::BillingClient;
use costprism_exporter::config::ExporterConfig;
use costprism_exporter::obs::{ExporterMetrics, MetricRegistry};
use costprism_exporter::refresh::RefreshJob;

type Answer = dyn Fn(&BillingQuery) -> Result<f64> + Send + Sync;

/// Answers every query through a closure, optionally after a delay, and
/// records what was asked and how many calls overlapped.
pub struct ScriptedClient {
    answer: Box<Answer>,
    delay: Duration,
    calls: Mutex<Vec<BillingQuery>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new<F>(answer: F) -> Self
    where
        F: Fn(&BillingQuery) -> Result<f64> + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(move |_| Ok(value))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<BillingQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingClient for ScriptedClient {
    async fn query(&self, q: &BillingQuery) -> Result<f64> {
        self.calls.lock().unwrap().push(*q);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let res = (self.answer)(q);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Query a given gauge would issue on `today`.
pub fn query_for(id: MetricId, today: NaiveDate) -> BillingQuery {
    id.query(&DateAnchors::at(today).unwrap()).unwrap()
}

pub fn definitions(enabled: &[MetricId]) -> Vec<MetricDefinition> {
    MetricId::ALL
        .iter()
        .map(|&id| MetricDefinition {
            id,
            enabled: enabled.contains(&id),
        })
        .collect()
}

/// Config with only `enabled` turned on and everything else defaulted.
pub fn config_with(enabled: &[MetricId]) -> ExporterConfig {
    let mut cfg = ExporterConfig::default();
    for &id in enabled {
        cfg.metrics.enable(id);
    }
    cfg
}

pub struct Harness {
    pub client: Arc<ScriptedClient>,
    pub registry: Arc<MetricRegistry>,
    pub metrics: Arc<ExporterMetrics>,
    pub job: Arc<RefreshJob>,
}

pub fn harness(enabled: &[MetricId], client: ScriptedClient) -> Harness {
    let client = Arc::new(client);
    let registry = Arc::new(MetricRegistry::new(&definitions(enabled)));
    let metrics = Arc::new(ExporterMetrics::default());
    let job = Arc::new(RefreshJob::new(
        client.clone(),
        registry.clone(),
        metrics.clone(),
        Duration::from_secs(60),
    ));
    Harness {
        client,
        registry,
        metrics,
        job,
    }
}

/// Poll `cond` on a 100ms (virtual) cadence, up to `limit`.
pub async fn wait_until<F, Fut>(limit: Duration, mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let step = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited <= limit {
        if cond().await {
            return true;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    false
}
