//! HTTP handlers for the audit trail

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::audit::AuditRecord;
use crate::AppState;

/// Query parameters for the audit trail
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub entity_type: String,
    pub entity_id: Uuid,
}

/// Audit entries for one entity, newest first
pub async fn get_entity_audit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<Vec<AuditRecord>>> {
    let records = state
        .services
        .audit
        .list_for_entity(&query.entity_type, query.entity_id)
        .await?;
    Ok(Json(records))
}
