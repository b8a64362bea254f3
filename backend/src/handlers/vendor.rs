//! HTTP handlers for vendor read endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::AppState;
use shared::Vendor;

/// List all vendors
pub async fn list_vendors(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Vendor>>> {
    let vendors = state.services.vendors.list_vendors().await?;
    Ok(Json(vendors))
}

/// Get one vendor
pub async fn get_vendor(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(vendor_id): Path<Uuid>,
) -> AppResult<Json<Vendor>> {
    let vendor = state.services.vendors.get_vendor(vendor_id).await?;
    Ok(Json(vendor))
}
