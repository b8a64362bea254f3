//! Goods receipt verification service
//!
//! Records received quantities per dispatched line, classifies each
//! discrepancy through the pure classifier, and derives the aggregate
//! receipt status. The GRN, its items, and the resulting assignment and
//! dispatch advancement are persisted in one bounded transaction.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditEntry, AuditService};
use crate::services::map_pool_timeout;
use shared::{
    classify_discrepancy, grn_aggregate_status, grn_item_status, validate_damage_report,
    validate_grn_item_count, validate_received_quantity, AssignmentStatus, DiscrepancyInput,
    DispatchStatus, GoodsReceiptNote, GrnItem, GrnItemStatus, GrnStatus, GrnSummary, GrnWithItems,
};

/// GRN verification service
#[derive(Clone)]
pub struct GrnService {
    db: PgPool,
    db_config: DatabaseConfig,
    audit: AuditService,
}

/// Input for creating a goods receipt note
#[derive(Debug, Deserialize)]
pub struct CreateGrnInput {
    pub dispatch_id: Uuid,
    pub receipt_date: Option<NaiveDate>,
    pub remarks: Option<String>,
    pub remarks_th: Option<String>,
    pub items: Vec<GrnItemInput>,
}

/// One inspected line of the receipt
#[derive(Debug, Deserialize)]
pub struct GrnItemInput {
    pub dispatch_item_id: Uuid,
    pub received_quantity: i64,
    #[serde(default)]
    pub damage_reported: bool,
    pub damage_description: Option<String>,
    pub item_remarks: Option<String>,
}

/// Database row for a goods receipt note
#[derive(Debug, sqlx::FromRow)]
struct GrnRow {
    id: Uuid,
    receipt_number: String,
    dispatch_id: Uuid,
    status: String,
    receipt_date: NaiveDate,
    received_by: Uuid,
    remarks: Option<String>,
    remarks_th: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GrnRow> for GoodsReceiptNote {
    fn from(row: GrnRow) -> Self {
        GoodsReceiptNote {
            id: row.id,
            receipt_number: row.receipt_number,
            dispatch_id: row.dispatch_id,
            status: GrnStatus::from_str(&row.status).unwrap_or(GrnStatus::PendingVerification),
            receipt_date: row.receipt_date,
            received_by: row.received_by,
            remarks: row.remarks,
            remarks_th: row.remarks_th,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a GRN item
#[derive(Debug, sqlx::FromRow)]
struct GrnItemRow {
    id: Uuid,
    grn_id: Uuid,
    dispatch_item_id: Uuid,
    received_quantity: i64,
    discrepancy_quantity: i64,
    discrepancy_percentage: Decimal,
    damage_reported: bool,
    damage_description: Option<String>,
    item_remarks: Option<String>,
    status: String,
}

impl From<GrnItemRow> for GrnItem {
    fn from(row: GrnItemRow) -> Self {
        GrnItem {
            id: row.id,
            grn_id: row.grn_id,
            dispatch_item_id: row.dispatch_item_id,
            received_quantity: row.received_quantity,
            discrepancy_quantity: row.discrepancy_quantity,
            discrepancy_percentage: row.discrepancy_percentage,
            damage_reported: row.damage_reported,
            damage_description: row.damage_description,
            item_remarks: row.item_remarks,
            status: GrnItemStatus::from_str(&row.status).unwrap_or(GrnItemStatus::VerifiedOk),
        }
    }
}

/// Dispatched line with its underlying assignment quantities, locked inside
/// the verification transaction
#[derive(Debug, sqlx::FromRow)]
struct DispatchItemContext {
    dispatch_item_id: Uuid,
    assignment_id: Uuid,
    assigned_quantity: i64,
    confirmed_quantity: i64,
}

impl GrnService {
    /// Create a new GrnService instance
    pub fn new(db: PgPool, db_config: DatabaseConfig, audit: AuditService) -> Self {
        Self {
            db,
            db_config,
            audit,
        }
    }

    /// Record and verify a goods receipt for a dispatch
    pub async fn create_grn(
        &self,
        operator_id: Uuid,
        input: CreateGrnInput,
    ) -> AppResult<GrnWithItems> {
        // Fail fast before any persistence
        self.validate_create_input(&input)?;

        let budget = Duration::from_secs(self.db_config.txn_timeout_secs);
        let grn_id = tokio::time::timeout(budget, self.create_grn_tx(operator_id, &input))
            .await
            .map_err(|_| {
                AppError::ConcurrencyTimeout(
                    "goods receipt creation exceeded the transaction budget".to_string(),
                )
            })??;

        self.get_grn(grn_id).await
    }

    /// The transactional part of GRN creation
    async fn create_grn_tx(&self, operator_id: Uuid, input: &CreateGrnInput) -> AppResult<Uuid> {
        let mut tx = self.db.begin().await.map_err(map_pool_timeout)?;

        // Lock the dispatch row; this also serializes duplicate submissions
        let (vendor_id, dispatch_status) = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT vendor_id, status FROM dispatches WHERE id = $1 FOR UPDATE",
        )
        .bind(input.dispatch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Dispatch".to_string()))?;

        let already_received = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM goods_receipt_notes WHERE dispatch_id = $1)",
        )
        .bind(input.dispatch_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_received {
            return Err(AppError::Conflict {
                resource: "dispatch_id".to_string(),
                message: "A goods receipt already exists for this dispatch".to_string(),
                message_th: "มีใบรับสินค้าสำหรับการจัดส่งนี้แล้ว".to_string(),
            });
        }

        // Resolve each dispatched line and its assignment quantities
        let contexts = sqlx::query_as::<_, DispatchItemContext>(
            r#"
            SELECT dli.id AS dispatch_item_id, a.id AS assignment_id,
                   a.assigned_quantity, a.confirmed_quantity
            FROM dispatch_line_items dli
            JOIN assignments a ON a.id = dli.assignment_id
            WHERE dli.dispatch_id = $1
            FOR UPDATE OF a
            "#,
        )
        .bind(input.dispatch_id)
        .fetch_all(&mut *tx)
        .await?;

        let by_item: HashMap<Uuid, &DispatchItemContext> =
            contexts.iter().map(|c| (c.dispatch_item_id, c)).collect();

        for item in &input.items {
            if !by_item.contains_key(&item.dispatch_item_id) {
                return Err(AppError::NotFound(format!(
                    "Dispatch line item {}",
                    item.dispatch_item_id
                )));
            }
        }

        let receipt_number = self.next_receipt_number(&mut tx).await?;
        let receipt_date = input.receipt_date.unwrap_or_else(|| Utc::now().date_naive());

        // Classify every inspected line and collect the status fold inputs
        let mut item_statuses = Vec::with_capacity(input.items.len());
        let mut classified = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let ctx = by_item[&item.dispatch_item_id];
            let result = classify_discrepancy(&DiscrepancyInput {
                assigned_quantity: ctx.assigned_quantity,
                confirmed_quantity: ctx.confirmed_quantity,
                received_quantity: item.received_quantity,
                damage_reported: item.damage_reported,
            });
            let status = grn_item_status(item.damage_reported, result.discrepancy_quantity);
            item_statuses.push(status);
            classified.push((ctx.assignment_id, result, status));
        }

        let aggregate = grn_aggregate_status(&item_statuses);

        let grn_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO goods_receipt_notes (receipt_number, dispatch_id, status, receipt_date,
                                             received_by, remarks, remarks_th)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&receipt_number)
        .bind(input.dispatch_id)
        .bind(aggregate.as_str())
        .bind(receipt_date)
        .bind(operator_id)
        .bind(&input.remarks)
        .bind(&input.remarks_th)
        .fetch_one(&mut *tx)
        .await?;

        for (item, (assignment_id, result, status)) in input.items.iter().zip(&classified) {
            sqlx::query(
                r#"
                INSERT INTO grn_items (grn_id, dispatch_item_id, received_quantity,
                                       discrepancy_quantity, discrepancy_percentage,
                                       damage_reported, damage_description, item_remarks, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(grn_id)
            .bind(item.dispatch_item_id)
            .bind(item.received_quantity)
            .bind(result.discrepancy_quantity)
            .bind(result.discrepancy_percentage)
            .bind(item.damage_reported)
            .bind(&item.damage_description)
            .bind(&item.item_remarks)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

            // The inspected assignment moves straight to its verification
            // outcome
            let next = if status.is_clean() {
                AssignmentStatus::VerifiedOk
            } else {
                AssignmentStatus::VerifiedMismatch
            };
            sqlx::query("UPDATE assignments SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(next.as_str())
                .bind(assignment_id)
                .execute(&mut *tx)
                .await?;
        }

        // Receiving completes the shipment
        let current = DispatchStatus::from_str(&dispatch_status);
        if current.map_or(true, |s| s.can_transition_to(DispatchStatus::Delivered)) {
            sqlx::query("UPDATE dispatches SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(DispatchStatus::Delivered.as_str())
                .bind(input.dispatch_id)
                .execute(&mut *tx)
                .await?;
        }

        self.audit
            .record_tx(
                &mut tx,
                AuditEntry {
                    actor_id: operator_id,
                    action: "grn.created",
                    entity_type: "goods_receipt_note",
                    entity_id: grn_id,
                    vendor_id: Some(vendor_id),
                    detail: serde_json::json!({
                        "receipt_number": receipt_number,
                        "dispatch_id": input.dispatch_id,
                        "aggregate_status": aggregate.as_str(),
                        "item_count": input.items.len(),
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(grn_id)
    }

    /// Get a GRN with its items and verification summary
    pub async fn get_grn(&self, grn_id: Uuid) -> AppResult<GrnWithItems> {
        let row = sqlx::query_as::<_, GrnRow>(
            r#"
            SELECT id, receipt_number, dispatch_id, status, receipt_date, received_by,
                   remarks, remarks_th, created_at, updated_at
            FROM goods_receipt_notes
            WHERE id = $1
            "#,
        )
        .bind(grn_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods receipt note".to_string()))?;

        let items = self.get_items(grn_id).await?;
        let summary = GrnSummary::from_items(&items);

        Ok(GrnWithItems {
            grn: row.into(),
            items,
            summary,
        })
    }

    /// List all goods receipt notes, newest first
    pub async fn list_grns(&self) -> AppResult<Vec<GoodsReceiptNote>> {
        let rows = sqlx::query_as::<_, GrnRow>(
            r#"
            SELECT id, receipt_number, dispatch_id, status, receipt_date, received_by,
                   remarks, remarks_th, created_at, updated_at
            FROM goods_receipt_notes
            ORDER BY receipt_date DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Items of one GRN in insertion order
    pub async fn get_items(&self, grn_id: Uuid) -> AppResult<Vec<GrnItem>> {
        let rows = sqlx::query_as::<_, GrnItemRow>(
            r#"
            SELECT id, grn_id, dispatch_item_id, received_quantity, discrepancy_quantity,
                   discrepancy_percentage, damage_reported, damage_description, item_remarks, status
            FROM grn_items
            WHERE grn_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(grn_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Generate receipt number: GRN-YYYY-NNNNN
    async fn next_receipt_number(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> AppResult<String> {
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('grn_receipt_seq')")
            .fetch_one(&mut **tx)
            .await?;

        Ok(format!("GRN-{}-{:05}", Utc::now().year(), sequence))
    }

    /// Validate receipt input fields before touching the database
    fn validate_create_input(&self, input: &CreateGrnInput) -> AppResult<()> {
        validate_grn_item_count(input.items.len()).map_err(|msg| AppError::Validation {
            field: "items".to_string(),
            message: msg.to_string(),
            message_th: format!("จำนวนรายการไม่ถูกต้อง: {}", msg),
        })?;

        let mut seen = HashSet::new();
        for item in &input.items {
            validate_received_quantity(item.received_quantity).map_err(|msg| {
                AppError::Validation {
                    field: "received_quantity".to_string(),
                    message: msg.to_string(),
                    message_th: format!("จำนวนรับไม่ถูกต้อง: {}", msg),
                }
            })?;

            validate_damage_report(item.damage_reported, item.damage_description.as_deref())
                .map_err(|msg| AppError::Validation {
                    field: "damage_description".to_string(),
                    message: msg.to_string(),
                    message_th: format!("รายงานความเสียหายไม่ถูกต้อง: {}", msg),
                })?;

            if !seen.insert(item.dispatch_item_id) {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!(
                        "Dispatch line item {} appears more than once",
                        item.dispatch_item_id
                    ),
                    message_th: format!("รายการ {} ซ้ำกัน", item.dispatch_item_id),
                });
            }
        }

        Ok(())
    }
}
