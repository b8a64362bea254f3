//! HTTP handlers for assignment read endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::query::AssignmentFilter;
use crate::AppState;
use shared::{Assignment, AssignmentStatus, DateRange, Pagination};

/// Query parameters for the assignment list
#[derive(Debug, Deserialize)]
pub struct ListAssignmentsQuery {
    pub vendor_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List assignments visible to the caller
pub async fn list_assignments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListAssignmentsQuery>,
) -> AppResult<Json<Vec<Assignment>>> {
    let mut filter = AssignmentFilter::new();

    // Vendor callers are always pinned to their own assignments
    if let Some(vendor_id) = current_user.0.vendor_scope().or(query.vendor_id) {
        filter = filter.vendor(vendor_id);
    }
    if let Some(status) = query.status {
        filter = filter.with_statuses(&[status]);
    }
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        filter = filter.assigned_between(DateRange { start, end });
    }

    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let assignments = state
        .services
        .assignments
        .list_assignments(&filter, &pagination)
        .await?;
    Ok(Json(assignments))
}

/// Get one assignment
pub async fn get_assignment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(assignment_id): Path<Uuid>,
) -> AppResult<Json<Assignment>> {
    let assignment = state
        .services
        .assignments
        .get_assignment(assignment_id, current_user.0.vendor_scope())
        .await?;
    Ok(Json(assignment))
}
