use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use costprism_core::error::{ExporterError, Result};
use costprism_core::metric::{MetricDefinition, MetricId};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub refresh: RefreshSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.refresh.validate()?;
        Ok(())
    }

    /// Full gauge set with enablement resolved. Built once at startup.
    pub fn definitions(&self) -> Vec<MetricDefinition> {
        MetricId::ALL
            .iter()
            .map(|&id| MetricDefinition {
                id,
                enabled: self.metrics.is_enabled(id),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Append the exporter's own counters to `/metrics`.
    #[serde(default)]
    pub self_metrics: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            self_metrics: false,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ExporterError::Configuration(format!(
                "server.listen must be a valid socket address ({}): {e}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshSection {
    #[serde(default = "default_query_period_secs")]
    pub query_period_secs: u64,

    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            query_period_secs: default_query_period_secs(),
            initial_delay_secs: default_initial_delay_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl RefreshSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=86_400).contains(&self.query_period_secs) {
            return Err(ExporterError::Configuration(
                "refresh.query_period_secs must be between 1 and 86400".into(),
            ));
        }
        if self.initial_delay_secs > 3_600 {
            return Err(ExporterError::Configuration(
                "refresh.initial_delay_secs must be at most 3600".into(),
            ));
        }
        if !(1..=600).contains(&self.query_timeout_secs) {
            return Err(ExporterError::Configuration(
                "refresh.query_timeout_secs must be between 1 and 600".into(),
            ));
        }
        if self.shutdown_grace_secs > 300 {
            return Err(ExporterError::Configuration(
                "refresh.shutdown_grace_secs must be at most 300".into(),
            ));
        }
        Ok(())
    }

    pub fn query_period(&self) -> Duration {
        Duration::from_secs(self.query_period_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Capped at the query period.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs.min(self.query_period_secs))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_query_period_secs() -> u64 {
    1800
}
fn default_initial_delay_secs() -> u64 {
    5
}
fn default_query_timeout_secs() -> u64 {
    60
}
fn default_shutdown_grace_secs() -> u64 {
    10
}

/// Which gauges are exported. Everything is off unless turned on.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default)]
    pub monthly_cost: bool,
    #[serde(default)]
    pub today_daily_cost: bool,
    #[serde(default)]
    pub yesterday_daily_cost: bool,
    #[serde(default)]
    pub today_daily_usage: bool,
    #[serde(default)]
    pub today_daily_usage_normalized: bool,
}

impl MetricsSection {
    pub fn is_enabled(&self, id: MetricId) -> bool {
        match id {
            MetricId::MonthlyCost => self.monthly_cost,
            MetricId::TodayDailyCost => self.today_daily_cost,
            MetricId::YesterdayDailyCost => self.yesterday_daily_cost,
            MetricId::TodayDailyUsage => self.today_daily_usage,
            MetricId::TodayDailyUsageNormalized => self.today_daily_usage_normalized,
        }
    }

    pub fn enable(&mut self, id: MetricId) {
        let flag = match id {
            MetricId::MonthlyCost => &mut self.monthly_cost,
            MetricId::TodayDailyCost => &mut self.today_daily_cost,
            MetricId::YesterdayDailyCost => &mut self.yesterday_daily_cost,
            MetricId::TodayDailyUsage => &mut self.today_daily_usage,
            MetricId::TodayDailyUsageNormalized => &mut self.today_daily_usage_normalized,
        };
        *flag = true;
    }
}
