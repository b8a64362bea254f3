//! Dispatch management service
//!
//! Validates vendor-confirmed assignments and atomically creates dispatch
//! records. The whole mutation runs inside one transaction with a finite
//! completion budget; assignment statuses are re-checked inside the
//! transaction so a racing caller observes a state conflict instead of
//! corrupting the pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditEntry, AuditService};
use crate::services::map_pool_timeout;
use crate::services::notification::NotificationService;
use shared::{
    validate_dispatched_quantity, validate_tracking_code, AssignmentStatus, AttachmentReference,
    AttachmentType, Dispatch, DispatchLineItem, DispatchStatus, DispatchWithItems,
};

/// Dispatch service for shipment creation and tracking
#[derive(Clone)]
pub struct DispatchService {
    db: PgPool,
    db_config: DatabaseConfig,
    audit: AuditService,
    notifications: NotificationService,
}

/// Input for creating a dispatch
#[derive(Debug, Deserialize)]
pub struct CreateDispatchInput {
    pub vendor_id: Uuid,
    pub tracking_code: String,
    pub carrier_name: String,
    pub dispatch_date: Option<NaiveDate>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub remarks_th: Option<String>,
    pub items: Vec<DispatchItemInput>,
}

/// One assignment's share of the shipment
#[derive(Debug, Deserialize)]
pub struct DispatchItemInput {
    pub assignment_id: Uuid,
    pub dispatched_quantity: i64,
}

/// Input for attaching a proof document
#[derive(Debug, Deserialize)]
pub struct AttachProofInput {
    pub file_type: AttachmentType,
    pub storage_key: String,
    pub url: String,
    pub original_filename: Option<String>,
}

/// Database row for a dispatch
#[derive(Debug, sqlx::FromRow)]
struct DispatchRow {
    id: Uuid,
    vendor_id: Uuid,
    tracking_code: String,
    carrier_name: String,
    dispatch_date: NaiveDate,
    estimated_delivery_date: Option<NaiveDate>,
    status: String,
    remarks: Option<String>,
    remarks_th: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DispatchRow> for Dispatch {
    fn from(row: DispatchRow) -> Self {
        Dispatch {
            id: row.id,
            vendor_id: row.vendor_id,
            tracking_code: row.tracking_code,
            carrier_name: row.carrier_name,
            dispatch_date: row.dispatch_date,
            estimated_delivery_date: row.estimated_delivery_date,
            status: DispatchStatus::from_str(&row.status).unwrap_or(DispatchStatus::Pending),
            remarks: row.remarks,
            remarks_th: row.remarks_th,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Locked assignment row read inside the creation transaction
#[derive(Debug, sqlx::FromRow)]
struct AssignmentGuardRow {
    id: Uuid,
    vendor_id: Uuid,
    status: String,
}

impl DispatchService {
    /// Create a new DispatchService instance
    pub fn new(
        db: PgPool,
        db_config: DatabaseConfig,
        audit: AuditService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db,
            db_config,
            audit,
            notifications,
        }
    }

    /// Create a dispatch from vendor-confirmed assignments
    ///
    /// Not idempotent: resubmitting an already-dispatched assignment fails
    /// with a state conflict. The in-transaction status guard is the
    /// correctness backstop against concurrent submissions.
    pub async fn create_dispatch(
        &self,
        actor_id: Uuid,
        input: CreateDispatchInput,
    ) -> AppResult<DispatchWithItems> {
        self.validate_create_input(&input)?;

        let budget = Duration::from_secs(self.db_config.txn_timeout_secs);
        let dispatch_id = tokio::time::timeout(budget, self.create_dispatch_tx(actor_id, &input))
            .await
            .map_err(|_| {
                AppError::ConcurrencyTimeout(
                    "dispatch creation exceeded the transaction budget".to_string(),
                )
            })??;

        let dispatch = self.get_dispatch(dispatch_id, None).await?;

        // Best-effort notification; failures never roll back the dispatch
        if let Err(e) = self.notifications.notify_dispatch_created(&dispatch).await {
            tracing::warn!("Dispatch notification failed: {}", e);
        }

        Ok(dispatch)
    }

    /// The transactional part of dispatch creation
    async fn create_dispatch_tx(
        &self,
        actor_id: Uuid,
        input: &CreateDispatchInput,
    ) -> AppResult<Uuid> {
        let mut tx = self.db.begin().await.map_err(map_pool_timeout)?;

        let assignment_ids: Vec<Uuid> = input.items.iter().map(|i| i.assignment_id).collect();

        // Lock the referenced assignments and re-check their state inside
        // the transaction
        let rows = sqlx::query_as::<_, AssignmentGuardRow>(
            r#"
            SELECT id, vendor_id, status
            FROM assignments
            WHERE id = ANY($1)
            FOR UPDATE
            "#,
        )
        .bind(&assignment_ids)
        .fetch_all(&mut *tx)
        .await?;

        if rows.len() != assignment_ids.len() {
            let found: HashSet<Uuid> = rows.iter().map(|r| r.id).collect();
            let missing = assignment_ids.iter().find(|id| !found.contains(id));
            return Err(AppError::NotFound(format!(
                "Assignment {}",
                missing.map(|id| id.to_string()).unwrap_or_default()
            )));
        }

        for row in &rows {
            if row.vendor_id != input.vendor_id {
                return Err(AppError::Forbidden(format!(
                    "Assignment {} does not belong to vendor {}",
                    row.id, input.vendor_id
                )));
            }

            let status = AssignmentStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Internal(format!("Unknown assignment status '{}'", row.status))
            })?;

            if status.is_dispatched_or_later() {
                return Err(AppError::StateConflict(format!(
                    "Assignment {} already dispatched",
                    row.id
                )));
            }
            if !status.is_vendor_confirmed() {
                return Err(AppError::StateConflict(format!(
                    "Cannot dispatch unconfirmed items: assignment {} is {}",
                    row.id,
                    status.as_str()
                )));
            }
        }

        let dispatch_date = input.dispatch_date.unwrap_or_else(|| Utc::now().date_naive());

        let dispatch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO dispatches (vendor_id, tracking_code, carrier_name, dispatch_date,
                                    estimated_delivery_date, status, remarks, remarks_th, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(input.vendor_id)
        .bind(&input.tracking_code)
        .bind(&input.carrier_name)
        .bind(dispatch_date)
        .bind(input.estimated_delivery_date)
        .bind(DispatchStatus::Dispatched.as_str())
        .bind(&input.remarks)
        .bind(&input.remarks_th)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO dispatch_line_items (dispatch_id, assignment_id, dispatched_quantity)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(dispatch_id)
            .bind(item.assignment_id)
            .bind(item.dispatched_quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE assignments SET status = $1, updated_at = NOW() WHERE id = ANY($2)",
        )
        .bind(AssignmentStatus::Dispatched.as_str())
        .bind(&assignment_ids)
        .execute(&mut *tx)
        .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEntry {
                    actor_id,
                    action: "dispatch.created",
                    entity_type: "dispatch",
                    entity_id: dispatch_id,
                    vendor_id: Some(input.vendor_id),
                    detail: serde_json::json!({
                        "tracking_code": input.tracking_code,
                        "carrier_name": input.carrier_name,
                        "item_count": input.items.len(),
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(dispatch_id)
    }

    /// Get a dispatch with its line items and proof documents
    ///
    /// Vendor callers only see their own dispatches.
    pub async fn get_dispatch(
        &self,
        dispatch_id: Uuid,
        vendor_scope: Option<Uuid>,
    ) -> AppResult<DispatchWithItems> {
        let row = sqlx::query_as::<_, DispatchRow>(
            r#"
            SELECT id, vendor_id, tracking_code, carrier_name, dispatch_date,
                   estimated_delivery_date, status, remarks, remarks_th, created_by,
                   created_at, updated_at
            FROM dispatches
            WHERE id = $1 AND ($2::uuid IS NULL OR vendor_id = $2)
            "#,
        )
        .bind(dispatch_id)
        .bind(vendor_scope)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Dispatch".to_string()))?;

        let items = sqlx::query_as::<_, (Uuid, Uuid, Uuid, i64)>(
            r#"
            SELECT id, dispatch_id, assignment_id, dispatched_quantity
            FROM dispatch_line_items
            WHERE dispatch_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(dispatch_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|(id, dispatch_id, assignment_id, dispatched_quantity)| DispatchLineItem {
            id,
            dispatch_id,
            assignment_id,
            dispatched_quantity,
        })
        .collect();

        let proof_documents = self.get_proof_documents(dispatch_id).await?;

        Ok(DispatchWithItems {
            dispatch: row.into(),
            items,
            proof_documents,
        })
    }

    /// List dispatches, scoped to one vendor for vendor callers
    pub async fn list_dispatches(&self, vendor_scope: Option<Uuid>) -> AppResult<Vec<Dispatch>> {
        let rows = sqlx::query_as::<_, DispatchRow>(
            r#"
            SELECT id, vendor_id, tracking_code, carrier_name, dispatch_date,
                   estimated_delivery_date, status, remarks, remarks_th, created_by,
                   created_at, updated_at
            FROM dispatches
            WHERE ($1::uuid IS NULL OR vendor_id = $1)
            ORDER BY dispatch_date DESC, created_at DESC
            "#,
        )
        .bind(vendor_scope)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Advance the shipment status (forward-only)
    pub async fn update_status(
        &self,
        actor_id: Uuid,
        dispatch_id: Uuid,
        new_status: DispatchStatus,
    ) -> AppResult<Dispatch> {
        let budget = Duration::from_secs(self.db_config.txn_timeout_secs);
        tokio::time::timeout(budget, self.update_status_tx(actor_id, dispatch_id, new_status))
            .await
            .map_err(|_| {
                AppError::ConcurrencyTimeout(
                    "dispatch status update exceeded the transaction budget".to_string(),
                )
            })?
    }

    async fn update_status_tx(
        &self,
        actor_id: Uuid,
        dispatch_id: Uuid,
        new_status: DispatchStatus,
    ) -> AppResult<Dispatch> {
        let mut tx = self.db.begin().await.map_err(map_pool_timeout)?;

        let (vendor_id, current_raw) = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT vendor_id, status FROM dispatches WHERE id = $1 FOR UPDATE",
        )
        .bind(dispatch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Dispatch".to_string()))?;

        let current = DispatchStatus::from_str(&current_raw)
            .ok_or_else(|| AppError::Internal(format!("Unknown dispatch status '{}'", current_raw)))?;

        if !current.can_transition_to(new_status) {
            return Err(AppError::StateConflict(format!(
                "Dispatch cannot move from {} to {}",
                current.as_str(),
                new_status.as_str()
            )));
        }

        let row = sqlx::query_as::<_, DispatchRow>(
            r#"
            UPDATE dispatches SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, vendor_id, tracking_code, carrier_name, dispatch_date,
                      estimated_delivery_date, status, remarks, remarks_th, created_by,
                      created_at, updated_at
            "#,
        )
        .bind(new_status.as_str())
        .bind(dispatch_id)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEntry {
                    actor_id,
                    action: "dispatch.status_changed",
                    entity_type: "dispatch",
                    entity_id: dispatch_id,
                    vendor_id: Some(vendor_id),
                    detail: serde_json::json!({
                        "from": current.as_str(),
                        "to": new_status.as_str(),
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Attach a proof-of-dispatch document
    ///
    /// The storage key and URL come from the object-storage service and are
    /// stored verbatim, never parsed.
    pub async fn attach_proof(
        &self,
        dispatch_id: Uuid,
        input: AttachProofInput,
    ) -> AppResult<AttachmentReference> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM dispatches WHERE id = $1)",
        )
        .bind(dispatch_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Dispatch".to_string()));
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO dispatch_proof_documents (dispatch_id, file_type, storage_key, url, original_filename)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(dispatch_id)
        .bind(input.file_type.as_str())
        .bind(&input.storage_key)
        .bind(&input.url)
        .bind(&input.original_filename)
        .fetch_one(&self.db)
        .await?;

        Ok(AttachmentReference {
            id,
            file_type: input.file_type,
            storage_key: input.storage_key,
            url: input.url,
            original_filename: input.original_filename,
        })
    }

    /// Proof documents attached to a dispatch
    async fn get_proof_documents(&self, dispatch_id: Uuid) -> AppResult<Vec<AttachmentReference>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, String, Option<String>)>(
            r#"
            SELECT id, file_type, storage_key, url, original_filename
            FROM dispatch_proof_documents
            WHERE dispatch_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(dispatch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, file_type, storage_key, url, original_filename)| AttachmentReference {
                id,
                file_type: AttachmentType::from_str(&file_type).unwrap_or(AttachmentType::Document),
                storage_key,
                url,
                original_filename,
            })
            .collect())
    }

    /// Validate dispatch input fields before touching the database
    fn validate_create_input(&self, input: &CreateDispatchInput) -> AppResult<()> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A dispatch must contain at least one item".to_string(),
                message_th: "การจัดส่งต้องมีรายการอย่างน้อยหนึ่งรายการ".to_string(),
            });
        }

        validate_tracking_code(&input.tracking_code).map_err(|msg| AppError::Validation {
            field: "tracking_code".to_string(),
            message: msg.to_string(),
            message_th: format!("รหัสติดตามไม่ถูกต้อง: {}", msg),
        })?;

        if input.carrier_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "carrier_name".to_string(),
                message: "Carrier name is required".to_string(),
                message_th: "ต้องระบุชื่อผู้ขนส่ง".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for item in &input.items {
            validate_dispatched_quantity(item.dispatched_quantity).map_err(|msg| {
                AppError::Validation {
                    field: "dispatched_quantity".to_string(),
                    message: msg.to_string(),
                    message_th: format!("จำนวนจัดส่งไม่ถูกต้อง: {}", msg),
                }
            })?;

            if !seen.insert(item.assignment_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!("Assignment {} appears more than once", item.assignment_id),
                    message_th: format!("รายการ {} ซ้ำกัน", item.assignment_id),
                });
            }
        }

        Ok(())
    }
}
