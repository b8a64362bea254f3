//! HTTP handlers for vendor performance metric endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::metrics::{FillRateFilter, SlaParams, VendorMetricsService};
use crate::AppState;
use shared::{BulkRecomputeOutcome, PerformanceTrends, TrendGranularity, VendorFillRate, VendorSla};

/// Fill rate per vendor, ranked descending
pub async fn get_fill_rates(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<FillRateFilter>,
) -> AppResult<Json<Vec<VendorFillRate>>> {
    let rates = state.services.metrics.calculate_fill_rates(&filter).await?;
    Ok(Json(rates))
}

/// Fill rates exported as CSV
pub async fn export_fill_rates(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<FillRateFilter>,
) -> AppResult<impl IntoResponse> {
    let rates = state.services.metrics.calculate_fill_rates(&filter).await?;
    let csv = VendorMetricsService::export_to_csv(&rates)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"fill_rates.csv\"",
            ),
        ],
        csv,
    ))
}

/// SLA compliance per vendor
pub async fn get_sla(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(params): Query<SlaParams>,
) -> AppResult<Json<Vec<VendorSla>>> {
    let slas = state.services.metrics.calculate_sla(&params).await?;
    Ok(Json(slas))
}

/// Query parameters for the trend endpoint
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub granularity: Option<String>,
}

/// Time-bucketed performance trends for one vendor
pub async fn get_performance_trends(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(vendor_id): Path<Uuid>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<PerformanceTrends>> {
    let granularity = match query.granularity.as_deref() {
        None => TrendGranularity::Days,
        Some(raw) => TrendGranularity::from_str(raw).ok_or_else(|| AppError::Validation {
            field: "granularity".to_string(),
            message: "Granularity must be one of days, weeks, months".to_string(),
            message_th: "ช่วงเวลาต้องเป็น days, weeks หรือ months".to_string(),
        })?,
    };

    let trends = state
        .services
        .metrics
        .get_performance_trends(vendor_id, granularity)
        .await?;
    Ok(Json(trends))
}

/// Recompute and persist fill rates for every vendor
pub async fn recompute_fill_rates(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<BulkRecomputeOutcome>> {
    if !current_user.0.has_permission("metrics", "recompute") {
        return Err(AppError::InsufficientPermissions);
    }

    let outcome = state.services.metrics.bulk_recompute_fill_rates().await?;
    Ok(Json(outcome))
}
