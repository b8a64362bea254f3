//! Vendor performance metric types and formulas
//!
//! The rate formulas live here as pure functions so the metrics engine and
//! the trend bucketing reuse exactly the same arithmetic.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fill rate for one vendor over a filtered assignment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorFillRate {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub total_assigned: i64,
    pub total_confirmed: i64,
    /// `confirmed / assigned × 100`, rounded to 2 decimal places
    pub fill_rate: Decimal,
}

/// SLA posture for a vendor's currently open orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    Met,
    Breached,
    NoCurrentOrders,
}

impl SlaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlaStatus::Met => "met",
            SlaStatus::Breached => "breached",
            SlaStatus::NoCurrentOrders => "no_current_orders",
        }
    }
}

/// Service-level figures for one vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorSla {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    /// Average historical fulfillment duration in days
    pub avg_fulfillment_days: Decimal,
    /// `avg × (1 + buffer/100)`
    pub sla_benchmark_days: Decimal,
    /// Share of historical orders fulfilled within the benchmark
    pub sla_compliance_rate: Decimal,
    pub historical_orders: i64,
    pub open_orders: i64,
    pub sla_status: SlaStatus,
}

/// Trend bucket granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendGranularity {
    Days,
    Weeks,
    Months,
}

impl TrendGranularity {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "days" => Some(TrendGranularity::Days),
            "weeks" => Some(TrendGranularity::Weeks),
            "months" => Some(TrendGranularity::Months),
            _ => None,
        }
    }

    /// Fixed bucket counts: 30 daily, 4 weekly, 12 monthly
    pub fn bucket_count(&self) -> usize {
        match self {
            TrendGranularity::Days => 30,
            TrendGranularity::Weeks => 4,
            TrendGranularity::Months => 12,
        }
    }
}

/// One trend bucket, computed independently of its neighbors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub bucket_start: NaiveDate,
    pub bucket_end: NaiveDate,
    pub assignment_count: i64,
    pub fill_rate: Decimal,
    pub sla_compliance_rate: Decimal,
}

/// Overall fulfillment summary attached to a trend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    pub total_assignments: i64,
    pub completed_assignments: i64,
    pub fill_rate: Decimal,
    pub sla_compliance_rate: Decimal,
}

/// Trend series for one vendor, most recent bucket first
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceTrends {
    pub vendor_id: Uuid,
    pub granularity: TrendGranularity,
    pub trends: Vec<TrendPoint>,
    pub fulfillment: FulfillmentSummary,
}

/// Outcome of a best-effort bulk fill-rate recompute
#[derive(Debug, Clone, Serialize)]
pub struct BulkRecomputeOutcome {
    pub updated_count: usize,
    pub errors: Vec<BulkRecomputeError>,
}

/// One vendor's failure during a bulk recompute
#[derive(Debug, Clone, Serialize)]
pub struct BulkRecomputeError {
    pub vendor_id: Uuid,
    pub message: String,
}

/// `confirmed / assigned × 100`, 0 when nothing was assigned, 2 decimals
///
/// Clamped to [0, 100]: an over-confirmed history never reports more than
/// a full fill.
pub fn fill_rate(assigned_sum: i64, confirmed_sum: i64) -> Decimal {
    if assigned_sum <= 0 {
        return Decimal::ZERO;
    }
    let rate =
        (Decimal::from(confirmed_sum) / Decimal::from(assigned_sum) * Decimal::from(100)).round_dp(2);
    rate.clamp(Decimal::ZERO, Decimal::from(100))
}

/// `avg × (1 + buffer/100)`
pub fn sla_benchmark(avg_fulfillment_days: Decimal, buffer_percent: Decimal) -> Decimal {
    avg_fulfillment_days * (Decimal::ONE + buffer_percent / Decimal::from(100))
}

/// `compliant / total × 100`, 0 for an empty history, 2 decimals
pub fn compliance_rate(compliant: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(compliant as u64) / Decimal::from(total as u64) * Decimal::from(100)).round_dp(2)
}

/// Fulfillment duration in fractional days between assignment and the
/// vendor's completing action
pub fn fulfillment_days(assigned_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Decimal {
    let seconds = (completed_at - assigned_at).num_seconds().max(0);
    (Decimal::from(seconds) / Decimal::from(86_400)).round_dp(4)
}
