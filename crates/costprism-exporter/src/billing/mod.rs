//! Billing API seam.
//!
//! The refresh job only sees `BillingClient`; the AWS implementation lives in
//! `cost_explorer` and tests plug in their own.

pub mod cost_explorer;

use async_trait::async_trait;

use costprism_core::billing::BillingQuery;
use costprism_core::error::Result;

pub use cost_explorer::CostExplorerClient;

/// One upstream call per `query`, no retries, no caching.
#[async_trait]
pub trait BillingClient: Send + Sync {
    /// Aggregate amount of the single result bucket for `q`.
    ///
    /// Fails with `ExporterError::Upstream` when the API cannot be reached or
    /// refuses the call, and `ExporterError::MalformedResponse` when the answer
    /// lacks the expected bucket or amount.
    async fn query(&self, q: &BillingQuery) -> Result<f64>;
}
