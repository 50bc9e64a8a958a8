//! The fixed set of exported billing gauges.

use crate::billing::{BillingQuery, DateAnchors, DateRange, Granularity, MetricKind};
use crate::error::Result;

/// Every gauge the exporter knows about, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricId {
    MonthlyCost,
    TodayDailyCost,
    YesterdayDailyCost,
    TodayDailyUsage,
    TodayDailyUsageNormalized,
}

impl MetricId {
    pub const ALL: [MetricId; 5] = [
        MetricId::MonthlyCost,
        MetricId::TodayDailyCost,
        MetricId::YesterdayDailyCost,
        MetricId::TodayDailyUsage,
        MetricId::TodayDailyUsageNormalized,
    ];

    /// Exposition name. These are the names already scraped by existing
    /// dashboards, spelling included.
    pub fn name(self) -> &'static str {
        match self {
            MetricId::MonthlyCost => "aws_monyhly_costs",
            MetricId::TodayDailyCost => "aws_today_daily_costs",
            MetricId::YesterdayDailyCost => "aws_yesterday_daily_costs",
            MetricId::TodayDailyUsage => "aws_today_daily_usage",
            MetricId::TodayDailyUsageNormalized => "aws_today_daily_usage_norm",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricId::MonthlyCost => "Today monthly costs from AWS",
            MetricId::TodayDailyCost => "Today daily costs from AWS",
            MetricId::YesterdayDailyCost => "Yesterday daily costs from AWS",
            MetricId::TodayDailyUsage => "Today daily usage from AWS",
            MetricId::TodayDailyUsageNormalized => "Today daily usage normalized from AWS",
        }
    }

    /// Environment flag that enables this gauge.
    pub fn env_key(self) -> &'static str {
        match self {
            MetricId::MonthlyCost => "METRIC_MONTHLY_COSTS",
            MetricId::TodayDailyCost => "METRIC_TODAY_DAILY_COSTS",
            MetricId::YesterdayDailyCost => "METRIC_YESTERDAY_DAILY_COSTS",
            MetricId::TodayDailyUsage => "METRIC_TODAY_DAILY_USAGE",
            MetricId::TodayDailyUsageNormalized => "METRIC_TODAY_DAILY_USAGE_NORM",
        }
    }

    /// Upstream query for this gauge relative to the run's anchors.
    pub fn query(self, a: &DateAnchors) -> Result<BillingQuery> {
        let (start, end, granularity, kind) = match self {
            MetricId::MonthlyCost => (a.first_of_month, a.today, Granularity::Monthly, MetricKind::Cost),
            MetricId::TodayDailyCost => (a.yesterday, a.today, Granularity::Daily, MetricKind::Cost),
            MetricId::YesterdayDailyCost => {
                (a.two_days_ago, a.yesterday, Granularity::Daily, MetricKind::Cost)
            }
            MetricId::TodayDailyUsage => {
                (a.yesterday, a.today, Granularity::Daily, MetricKind::UsageQuantity)
            }
            MetricId::TodayDailyUsageNormalized => {
                (a.yesterday, a.today, Granularity::Daily, MetricKind::NormalizedUsage)
            }
        };
        Ok(BillingQuery {
            range: DateRange::new(start, end)?,
            granularity,
            kind,
        })
    }
}

/// A gauge plus whether this process exports it. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub id: MetricId,
    pub enabled: bool,
}

impl MetricDefinition {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn help(&self) -> &'static str {
        self.id.help()
    }
}
