//! AWS Cost Explorer (`GetCostAndUsage`) client.

use async_trait::async_trait;
use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::types::{DateInterval, Granularity as CeGranularity, ResultByTime};
use aws_sdk_costexplorer::Client;

use costprism_core::billing::{BillingQuery, Granularity, MetricKind};
use costprism_core::error::{ExporterError, Result};

use super::BillingClient;

#[derive(Clone)]
pub struct CostExplorerClient {
    client: Client,
}

impl CostExplorerClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Credentials and region come from the hosting environment.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl BillingClient for CostExplorerClient {
    async fn query(&self, q: &BillingQuery) -> Result<f64> {
        let period = DateInterval::builder()
            .start(q.range.start_str())
            .end(q.range.end_str())
            .build()
            .map_err(|e| ExporterError::Internal(format!("date interval: {e}")))?;

        let out = self
            .client
            .get_cost_and_usage()
            .time_period(period)
            .granularity(ce_granularity(q.granularity))
            .metrics(q.kind.api_name())
            .send()
            .await
            .map_err(|e| ExporterError::Upstream(DisplayErrorContext(&e).to_string()))?;

        extract_amount(out.results_by_time(), q.kind)
    }
}

fn ce_granularity(g: Granularity) -> CeGranularity {
    match g {
        Granularity::Daily => CeGranularity::Daily,
        Granularity::Monthly => CeGranularity::Monthly,
    }
}

/// `ResultsByTime[0].Total[<kind>].Amount`, parsed.
fn extract_amount(results: &[ResultByTime], kind: MetricKind) -> Result<f64> {
    let metric = kind.api_name();
    let bucket = results
        .first()
        .ok_or_else(|| ExporterError::MalformedResponse("no result buckets".into()))?;
    let amount = bucket
        .total()
        .and_then(|t| t.get(metric))
        .and_then(|v| v.amount())
        .ok_or_else(|| ExporterError::MalformedResponse(format!("no {metric} amount in first bucket")))?;
    amount.trim().parse::<f64>().map_err(|e| {
        ExporterError::MalformedResponse(format!("{metric} amount {amount:?} is not a number: {e}"))
    })
}
