//! Vendor performance metrics service
//!
//! Read-only aggregation over the assignment/dispatch/receipt history:
//! fill rates, SLA compliance, and time-bucketed trends. Aggregations run
//! against committed rows outside any transaction; only the bulk recompute
//! writes, using one independent transaction per vendor.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::config::FulfillmentConfig;
use crate::error::{AppError, AppResult};
use crate::services::query::AssignmentFilter;
use shared::{
    compliance_rate, fill_rate, fulfillment_days, sla_benchmark, validate_buffer_percentage,
    validate_lookback_days, AssignmentStatus, BulkRecomputeError, BulkRecomputeOutcome, DateRange,
    FulfillmentSummary, PerformanceTrends, SlaStatus, TrendGranularity, TrendPoint, VendorFillRate,
    VendorSla,
};

/// Vendor metrics service
#[derive(Clone)]
pub struct VendorMetricsService {
    db: PgPool,
    policy: FulfillmentConfig,
}

/// Filter for fill-rate calculation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FillRateFilter {
    pub vendor_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Parameters for SLA calculation
#[derive(Debug, Clone, Deserialize)]
pub struct SlaParams {
    pub vendor_id: Option<Uuid>,
    pub buffer_percentage: Option<Decimal>,
    pub lookback_days: Option<i64>,
}

/// Aggregated quantity sums per vendor
#[derive(Debug, sqlx::FromRow)]
struct FillRateRow {
    vendor_id: Uuid,
    vendor_name: String,
    total_assigned: i64,
    total_confirmed: i64,
}

/// Assignment timing row for SLA and trend calculations
#[derive(Debug, sqlx::FromRow)]
struct AssignmentHistoryRow {
    assigned_quantity: i64,
    confirmed_quantity: i64,
    status: String,
    assigned_at: DateTime<Utc>,
    vendor_action_at: Option<DateTime<Utc>>,
}

impl VendorMetricsService {
    /// Create a new VendorMetricsService instance
    pub fn new(db: PgPool, policy: FulfillmentConfig) -> Self {
        Self { db, policy }
    }

    /// Fill rate per vendor over the filtered assignment history, ranked
    /// descending
    ///
    /// Vendors with zero assigned quantity stay in the output with a 0 rate.
    pub async fn calculate_fill_rates(
        &self,
        filter: &FillRateFilter,
    ) -> AppResult<Vec<VendorFillRate>> {
        let mut assignment_filter = AssignmentFilter::new();
        if let Some(vendor_id) = filter.vendor_id {
            assignment_filter = assignment_filter.vendor(vendor_id);
        }
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            assignment_filter = assignment_filter.assigned_between(DateRange { start, end });
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            r#"
            SELECT a.vendor_id, v.name AS vendor_name,
                   COALESCE(SUM(a.assigned_quantity), 0)::bigint AS total_assigned,
                   COALESCE(SUM(a.confirmed_quantity), 0)::bigint AS total_confirmed
            FROM assignments a
            JOIN vendors v ON v.id = a.vendor_id
            "#,
        );
        assignment_filter.push_where(&mut builder, "a");
        builder.push(" GROUP BY a.vendor_id, v.name");

        let rows: Vec<FillRateRow> = builder.build_query_as().fetch_all(&self.db).await?;

        let mut rates: Vec<VendorFillRate> = rows
            .into_iter()
            .map(|r| VendorFillRate {
                vendor_id: r.vendor_id,
                vendor_name: r.vendor_name,
                total_assigned: r.total_assigned,
                total_confirmed: r.total_confirmed,
                fill_rate: fill_rate(r.total_assigned, r.total_confirmed),
            })
            .collect();

        rates.sort_by(|a, b| b.fill_rate.cmp(&a.fill_rate));

        Ok(rates)
    }

    /// SLA figures per vendor over the lookback window
    ///
    /// With a vendor id the result contains exactly that vendor or fails
    /// with NotFound.
    pub async fn calculate_sla(&self, params: &SlaParams) -> AppResult<Vec<VendorSla>> {
        let buffer = params
            .buffer_percentage
            .unwrap_or(self.policy.sla_buffer_percent);
        let lookback = params.lookback_days.unwrap_or(self.policy.sla_lookback_days);

        validate_buffer_percentage(buffer).map_err(|msg| AppError::Validation {
            field: "buffer_percentage".to_string(),
            message: msg.to_string(),
            message_th: format!("เปอร์เซ็นต์กันชนไม่ถูกต้อง: {}", msg),
        })?;
        validate_lookback_days(lookback).map_err(|msg| AppError::Validation {
            field: "lookback_days".to_string(),
            message: msg.to_string(),
            message_th: format!("ช่วงเวลาย้อนหลังไม่ถูกต้อง: {}", msg),
        })?;

        let vendors = self.resolve_vendors(params.vendor_id).await?;
        let cutoff = Utc::now() - ChronoDuration::days(lookback);

        let mut results = Vec::with_capacity(vendors.len());
        for (vendor_id, vendor_name) in vendors {
            let sla = self
                .vendor_sla(vendor_id, vendor_name, buffer, cutoff)
                .await?;
            results.push(sla);
        }

        Ok(results)
    }

    async fn vendor_sla(
        &self,
        vendor_id: Uuid,
        vendor_name: String,
        buffer: Decimal,
        cutoff: DateTime<Utc>,
    ) -> AppResult<VendorSla> {
        // Historical completed assignments inside the lookback window
        let completed = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT assigned_at, vendor_action_at
            FROM assignments
            WHERE vendor_id = $1 AND status = $2
              AND vendor_action_at IS NOT NULL AND vendor_action_at >= $3
            "#,
        )
        .bind(vendor_id)
        .bind(AssignmentStatus::Completed.as_str())
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;

        let durations: Vec<Decimal> = completed
            .iter()
            .map(|(assigned_at, action_at)| fulfillment_days(*assigned_at, *action_at))
            .collect();

        let avg = if durations.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = durations.iter().copied().sum();
            (sum / Decimal::from(durations.len() as u64)).round_dp(4)
        };
        let benchmark = sla_benchmark(avg, buffer);
        let compliant = durations.iter().filter(|d| **d <= benchmark).count();

        // Elapsed time of currently open assignments against the benchmark
        let open_assigned_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT assigned_at
            FROM assignments
            WHERE vendor_id = $1 AND status NOT IN ($2, $3)
            "#,
        )
        .bind(vendor_id)
        .bind(AssignmentStatus::Completed.as_str())
        .bind(AssignmentStatus::VendorDeclined.as_str())
        .fetch_all(&self.db)
        .await?;

        let now = Utc::now();
        let sla_status = if open_assigned_at.is_empty() {
            SlaStatus::NoCurrentOrders
        } else if open_assigned_at
            .iter()
            .all(|assigned_at| fulfillment_days(*assigned_at, now) <= benchmark)
        {
            SlaStatus::Met
        } else {
            SlaStatus::Breached
        };

        Ok(VendorSla {
            vendor_id,
            vendor_name,
            avg_fulfillment_days: avg,
            sla_benchmark_days: benchmark.round_dp(4),
            sla_compliance_rate: compliance_rate(compliant, durations.len()),
            historical_orders: durations.len() as i64,
            open_orders: open_assigned_at.len() as i64,
            sla_status,
        })
    }

    /// Time-bucketed fill rate and SLA compliance for one vendor
    ///
    /// 30 daily, 4 weekly, or 12 monthly buckets, most recent first; empty
    /// buckets yield zero rates.
    pub async fn get_performance_trends(
        &self,
        vendor_id: Uuid,
        granularity: TrendGranularity,
    ) -> AppResult<PerformanceTrends> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM vendors WHERE id = $1)",
        )
        .bind(vendor_id)
        .fetch_one(&self.db)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Vendor".to_string()));
        }

        let today = Utc::now().date_naive();
        let buckets = bucket_ranges(today, granularity);
        let window_start = buckets
            .last()
            .map(|b| b.start)
            .unwrap_or(today);

        let history = sqlx::query_as::<_, AssignmentHistoryRow>(
            r#"
            SELECT assigned_quantity, confirmed_quantity, status, assigned_at, vendor_action_at
            FROM assignments
            WHERE vendor_id = $1 AND assigned_at::date >= $2
            "#,
        )
        .bind(vendor_id)
        .bind(window_start)
        .fetch_all(&self.db)
        .await?;

        let trends: Vec<TrendPoint> = buckets
            .iter()
            .map(|range| {
                let in_bucket: Vec<&AssignmentHistoryRow> = history
                    .iter()
                    .filter(|row| {
                        let date = row.assigned_at.date_naive();
                        date >= range.start && date <= range.end
                    })
                    .collect();
                trend_point(*range, &in_bucket, self.policy.sla_buffer_percent)
            })
            .collect();

        let all: Vec<&AssignmentHistoryRow> = history.iter().collect();
        let fulfillment = fulfillment_summary(&all, self.policy.sla_buffer_percent);

        Ok(PerformanceTrends {
            vendor_id,
            granularity,
            trends,
            fulfillment,
        })
    }

    /// Recompute and persist the fill rate of every vendor
    ///
    /// Best-effort: each vendor runs in its own transaction and one
    /// vendor's failure never aborts the sweep.
    pub async fn bulk_recompute_fill_rates(&self) -> AppResult<BulkRecomputeOutcome> {
        let vendor_ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM vendors ORDER BY code")
            .fetch_all(&self.db)
            .await?;

        let mut updated_count = 0;
        let mut errors = Vec::new();

        for vendor_id in vendor_ids {
            match self.recompute_vendor_fill_rate(vendor_id).await {
                Ok(()) => updated_count += 1,
                Err(e) => {
                    tracing::warn!("Fill rate recompute failed for vendor {}: {}", vendor_id, e);
                    errors.push(BulkRecomputeError {
                        vendor_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(BulkRecomputeOutcome {
            updated_count,
            errors,
        })
    }

    async fn recompute_vendor_fill_rate(&self, vendor_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let (total_assigned, total_confirmed) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(assigned_quantity), 0)::bigint,
                   COALESCE(SUM(confirmed_quantity), 0)::bigint
            FROM assignments
            WHERE vendor_id = $1
            "#,
        )
        .bind(vendor_id)
        .fetch_one(&mut *tx)
        .await?;

        let rate = fill_rate(total_assigned, total_confirmed);

        sqlx::query(
            r#"
            INSERT INTO vendor_performance (vendor_id, fill_rate, total_assigned, total_confirmed, computed_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (vendor_id)
            DO UPDATE SET fill_rate = $2, total_assigned = $3, total_confirmed = $4, computed_at = NOW()
            "#,
        )
        .bind(vendor_id)
        .bind(rate)
        .bind(total_assigned)
        .bind(total_confirmed)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Export fill-rate rows as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                crate::error::AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(wtr.into_inner().map_err(|e| {
            crate::error::AppError::Internal(format!("CSV writer error: {}", e))
        })?)
        .map_err(|e| crate::error::AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }

    /// Resolve the vendor set for an SLA run
    async fn resolve_vendors(&self, vendor_id: Option<Uuid>) -> AppResult<Vec<(Uuid, String)>> {
        match vendor_id {
            Some(id) => {
                let vendor = sqlx::query_as::<_, (Uuid, String)>(
                    "SELECT id, name FROM vendors WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;
                Ok(vec![vendor])
            }
            None => {
                let vendors = sqlx::query_as::<_, (Uuid, String)>(
                    "SELECT id, name FROM vendors WHERE is_active = TRUE ORDER BY name",
                )
                .fetch_all(&self.db)
                .await?;
                Ok(vendors)
            }
        }
    }
}

/// Compute the bucket date ranges for a granularity, most recent first
fn bucket_ranges(today: NaiveDate, granularity: TrendGranularity) -> Vec<DateRange> {
    let count = granularity.bucket_count();
    (0..count)
        .map(|i| match granularity {
            TrendGranularity::Days => {
                let day = today - ChronoDuration::days(i as i64);
                DateRange {
                    start: day,
                    end: day,
                }
            }
            TrendGranularity::Weeks => {
                let end = today - ChronoDuration::days(7 * i as i64);
                DateRange {
                    start: end - ChronoDuration::days(6),
                    end,
                }
            }
            TrendGranularity::Months => {
                let start = months_back(today, i as u32);
                DateRange {
                    start,
                    end: month_end(start),
                }
            }
        })
        .collect()
}

/// First day of the month `n` months before `date`'s month
fn months_back(date: NaiveDate, n: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 - n as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid month start")
}

/// Last day of the month containing `month_start`
fn month_end(month_start: NaiveDate) -> NaiveDate {
    let next = months_back(month_start, 0) + ChronoDuration::days(32);
    months_back(next, 0) - ChronoDuration::days(1)
}

/// One trend bucket computed independently of its neighbors
fn trend_point(
    range: DateRange,
    rows: &[&AssignmentHistoryRow],
    buffer: Decimal,
) -> TrendPoint {
    let assigned: i64 = rows.iter().map(|r| r.assigned_quantity).sum();
    let confirmed: i64 = rows.iter().map(|r| r.confirmed_quantity).sum();

    TrendPoint {
        bucket_start: range.start,
        bucket_end: range.end,
        assignment_count: rows.len() as i64,
        fill_rate: fill_rate(assigned, confirmed),
        sla_compliance_rate: sla_compliance_of(rows, buffer),
    }
}

/// SLA compliance of the completed assignments among `rows`
fn sla_compliance_of(rows: &[&AssignmentHistoryRow], buffer: Decimal) -> Decimal {
    let durations: Vec<Decimal> = rows
        .iter()
        .filter(|r| r.status == AssignmentStatus::Completed.as_str())
        .filter_map(|r| {
            r.vendor_action_at
                .map(|action_at| fulfillment_days(r.assigned_at, action_at))
        })
        .collect();

    if durations.is_empty() {
        return Decimal::ZERO;
    }

    let sum: Decimal = durations.iter().copied().sum();
    let avg = sum / Decimal::from(durations.len() as u64);
    let benchmark = sla_benchmark(avg, buffer);
    let compliant = durations.iter().filter(|d| **d <= benchmark).count();

    compliance_rate(compliant, durations.len())
}

/// Overall fulfillment summary over the fetched window
fn fulfillment_summary(rows: &[&AssignmentHistoryRow], buffer: Decimal) -> FulfillmentSummary {
    let assigned: i64 = rows.iter().map(|r| r.assigned_quantity).sum();
    let confirmed: i64 = rows.iter().map(|r| r.confirmed_quantity).sum();
    let completed = rows
        .iter()
        .filter(|r| r.status == AssignmentStatus::Completed.as_str())
        .count();

    FulfillmentSummary {
        total_assignments: rows.len() as i64,
        completed_assignments: completed as i64,
        fill_rate: fill_rate(assigned, confirmed),
        sla_compliance_rate: sla_compliance_of(rows, buffer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_buckets_cover_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let buckets = bucket_ranges(today, TrendGranularity::Days);
        assert_eq!(buckets.len(), 30);
        assert_eq!(buckets[0].start, today);
        assert_eq!(buckets[29].start, today - ChronoDuration::days(29));
    }

    #[test]
    fn weekly_buckets_are_contiguous() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let buckets = bucket_ranges(today, TrendGranularity::Weeks);
        assert_eq!(buckets.len(), 4);
        for pair in buckets.windows(2) {
            assert_eq!(pair[1].end + ChronoDuration::days(1), pair[0].start);
        }
    }

    #[test]
    fn monthly_buckets_align_to_calendar_months() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let buckets = bucket_ranges(today, TrendGranularity::Months);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(buckets[0].end, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        // Crosses the year boundary
        assert_eq!(buckets[11].start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(buckets[11].end, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn month_end_handles_february() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(month_end(start), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }
}
