//! HTTP handlers for dispatch management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{ObjectStorageClient, StoredObject};
use crate::middleware::CurrentUser;
use crate::services::dispatch::{AttachProofInput, CreateDispatchInput};
use crate::AppState;
use shared::{AttachmentReference, Dispatch, DispatchStatus, DispatchWithItems};

/// Create a dispatch from vendor-confirmed assignments
pub async fn create_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDispatchInput>,
) -> AppResult<Json<DispatchWithItems>> {
    // Vendor callers may only dispatch on their own behalf
    if let Some(scope) = current_user.0.vendor_scope() {
        if scope != input.vendor_id {
            return Err(AppError::Forbidden(
                "Vendors can only create dispatches for themselves".to_string(),
            ));
        }
    }

    let dispatch = state
        .services
        .dispatch
        .create_dispatch(current_user.0.user_id, input)
        .await?;
    Ok(Json(dispatch))
}

/// Get a dispatch with items and proof documents
pub async fn get_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
) -> AppResult<Json<DispatchWithItems>> {
    let dispatch = state
        .services
        .dispatch
        .get_dispatch(dispatch_id, current_user.0.vendor_scope())
        .await?;
    Ok(Json(dispatch))
}

/// List dispatches visible to the caller
pub async fn list_dispatches(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Dispatch>>> {
    let dispatches = state
        .services
        .dispatch
        .list_dispatches(current_user.0.vendor_scope())
        .await?;
    Ok(Json(dispatches))
}

/// Request body for a dispatch status update
#[derive(Debug, Deserialize)]
pub struct UpdateDispatchStatusRequest {
    pub status: DispatchStatus,
}

/// Advance the shipment status
pub async fn update_dispatch_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
    Json(input): Json<UpdateDispatchStatusRequest>,
) -> AppResult<Json<Dispatch>> {
    let dispatch = state
        .services
        .dispatch
        .update_status(current_user.0.user_id, dispatch_id, input.status)
        .await?;
    Ok(Json(dispatch))
}

/// Attach a proof-of-dispatch document
pub async fn attach_proof_document(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
    Json(input): Json<AttachProofInput>,
) -> AppResult<Json<AttachmentReference>> {
    let attachment = state
        .services
        .dispatch
        .attach_proof(dispatch_id, input)
        .await?;
    Ok(Json(attachment))
}

/// Query parameters for an upload slot request
#[derive(Debug, Deserialize)]
pub struct UploadSlotQuery {
    pub filename: String,
    pub content_type: String,
}

/// Request an upload slot from the object-storage service
pub async fn request_proof_upload_slot(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<UploadSlotQuery>,
) -> AppResult<Json<StoredObject>> {
    let client = ObjectStorageClient::new(
        state.config.storage.endpoint.clone(),
        state.config.storage.bucket.clone(),
    );
    let slot = client
        .request_upload_slot(&query.filename, &query.content_type)
        .await?;
    Ok(Json(slot))
}
