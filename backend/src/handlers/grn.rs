//! HTTP handlers for goods receipt endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::grn::CreateGrnInput;
use crate::AppState;
use shared::{GoodsReceiptNote, GrnWithItems, Ticket};

/// Response for a created goods receipt: the verified GRN plus the
/// exception ticket opened for it, if any
#[derive(Debug, Serialize)]
pub struct CreateGrnResponse {
    #[serde(flatten)]
    pub grn: GrnWithItems,
    pub ticket: Option<Ticket>,
}

/// Record and verify a goods receipt, auto-ticketing any discrepancy
pub async fn create_grn(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateGrnInput>,
) -> AppResult<Json<CreateGrnResponse>> {
    let grn = state
        .services
        .grn
        .create_grn(current_user.0.user_id, input)
        .await?;

    // A non-clean receipt is escalated immediately
    let ticket = state
        .services
        .ticketing
        .process_grn_verification(current_user.0.user_id, grn.grn.id)
        .await?;

    Ok(Json(CreateGrnResponse { grn, ticket }))
}

/// Get a goods receipt with its items and summary
pub async fn get_grn(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(grn_id): Path<Uuid>,
) -> AppResult<Json<GrnWithItems>> {
    let grn = state.services.grn.get_grn(grn_id).await?;
    Ok(Json(grn))
}

/// List all goods receipts
pub async fn list_grns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<GoodsReceiptNote>>> {
    let grns = state.services.grn.list_grns().await?;
    Ok(Json(grns))
}

/// List goods receipts still awaiting verification
pub async fn get_pending_grns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<GoodsReceiptNote>>> {
    let grns = state.services.ticketing.get_pending_grns().await?;
    Ok(Json(grns))
}
