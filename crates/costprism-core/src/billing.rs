//! Billing query primitives: granularity, metric kind and date ranges.
//!
//! Everything here is pure data. Dates are calendar dates without a time zone;
//! callers decide which clock "today" comes from.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::{ExporterError, Result};

/// Time bucketing of a billing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

/// Billing dimension requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Blended cost.
    Cost,
    /// Raw usage quantity.
    UsageQuantity,
    /// Normalized usage amount.
    NormalizedUsage,
}

impl MetricKind {
    /// Metric name as the billing API spells it, both in the request and as
    /// the key of the result totals.
    pub fn api_name(self) -> &'static str {
        match self {
            MetricKind::Cost => "BlendedCost",
            MetricKind::UsageQuantity => "UsageQuantity",
            MetricKind::NormalizedUsage => "NormalizedUsageAmount",
        }
    }
}

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `start` may equal `end` (empty range, the API will reject it);
    /// `start` after `end` is refused.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ExporterError::Internal(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_str(), self.end_str())
    }
}

/// The reference dates of one refresh run, all derived from a single "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateAnchors {
    pub today: NaiveDate,
    pub yesterday: NaiveDate,
    pub two_days_ago: NaiveDate,
    pub first_of_month: NaiveDate,
}

impl DateAnchors {
    pub fn at(today: NaiveDate) -> Result<Self> {
        let yesterday = today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| ExporterError::Internal(format!("no day before {today}")))?;
        let two_days_ago = today
            .checked_sub_days(Days::new(2))
            .ok_or_else(|| ExporterError::Internal(format!("no day two days before {today}")))?;
        let first_of_month = today
            .with_day(1)
            .ok_or_else(|| ExporterError::Internal(format!("no first day for {today}")))?;

        Ok(Self {
            today,
            yesterday,
            two_days_ago,
            first_of_month,
        })
    }
}

/// One upstream request: what to ask for, over which range, at which bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingQuery {
    pub range: DateRange,
    pub granularity: Granularity,
    pub kind: MetricKind,
}
