//! Exception ticketing service
//!
//! Inspects verified goods receipts and opens at most one exception ticket
//! per GRN. Ticket priority is derived from discrepancy severity against a
//! configured escalation threshold, and tickets move through a fixed
//! resolution workflow.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::config::{DatabaseConfig, FulfillmentConfig};
use crate::error::{AppError, AppResult};
use crate::services::audit::{AuditEntry, AuditService};
use crate::services::map_pool_timeout;
use crate::services::notification::NotificationService;
use shared::{
    derive_ticket_priority, GoodsReceiptNote, GrnStatus, Ticket, TicketPriority,
    TicketSeverityInput, TicketStatus,
};

/// Ticketing service for exception management
#[derive(Clone)]
pub struct TicketingService {
    db: PgPool,
    db_config: DatabaseConfig,
    policy: FulfillmentConfig,
    audit: AuditService,
    notifications: NotificationService,
}

/// Database row for a ticket
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    ticket_number: String,
    grn_id: Uuid,
    status: String,
    priority: String,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            id: row.id,
            ticket_number: row.ticket_number,
            grn_id: row.grn_id,
            status: TicketStatus::from_str(&row.status).unwrap_or(TicketStatus::Open),
            priority: TicketPriority::from_str(&row.priority).unwrap_or(TicketPriority::Medium),
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            resolved_at: row.resolved_at,
        }
    }
}

const TICKET_COLUMNS: &str = "id, ticket_number, grn_id, status, priority, title, description, \
                              created_at, updated_at, resolved_at";

impl TicketingService {
    /// Create a new TicketingService instance
    pub fn new(
        db: PgPool,
        db_config: DatabaseConfig,
        policy: FulfillmentConfig,
        audit: AuditService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db,
            db_config,
            policy,
            audit,
            notifications,
        }
    }

    /// Open an exception ticket for a non-clean goods receipt
    ///
    /// Returns None for a clean receipt. Calling this twice for the same
    /// GRN returns the existing ticket instead of creating a duplicate.
    pub async fn process_grn_verification(
        &self,
        actor_id: Uuid,
        grn_id: Uuid,
    ) -> AppResult<Option<Ticket>> {
        let budget = Duration::from_secs(self.db_config.txn_timeout_secs);
        let outcome = tokio::time::timeout(budget, self.process_grn_tx(actor_id, grn_id))
            .await
            .map_err(|_| {
                AppError::ConcurrencyTimeout(
                    "ticket creation exceeded the transaction budget".to_string(),
                )
            })??;

        if let ProcessOutcome::Created(ticket) = &outcome {
            // Best-effort notification; failures never roll back the ticket
            if let Err(e) = self.notifications.notify_ticket_opened(ticket).await {
                tracing::warn!("Ticket notification failed: {}", e);
            }
        }

        Ok(match outcome {
            ProcessOutcome::Clean => None,
            ProcessOutcome::Existing(ticket) | ProcessOutcome::Created(ticket) => Some(ticket),
        })
    }

    async fn process_grn_tx(&self, actor_id: Uuid, grn_id: Uuid) -> AppResult<ProcessOutcome> {
        let mut tx = self.db.begin().await.map_err(map_pool_timeout)?;

        // Lock the GRN row so concurrent processors serialize here
        let (receipt_number, status_raw) = sqlx::query_as::<_, (String, String)>(
            "SELECT receipt_number, status FROM goods_receipt_notes WHERE id = $1 FOR UPDATE",
        )
        .bind(grn_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods receipt note".to_string()))?;

        let status = GrnStatus::from_str(&status_raw)
            .ok_or_else(|| AppError::Internal(format!("Unknown GRN status '{}'", status_raw)))?;

        // A clean receipt needs no ticket; an unverified one has nothing to
        // escalate yet
        if matches!(status, GrnStatus::VerifiedOk | GrnStatus::PendingVerification) {
            return Ok(ProcessOutcome::Clean);
        }

        if let Some(existing) = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE grn_id = $1",
            TICKET_COLUMNS
        ))
        .bind(grn_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            return Ok(ProcessOutcome::Existing(existing.into()));
        }

        // Severity of the offending items drives the priority
        let severities = sqlx::query_as::<_, (bool, Decimal)>(
            r#"
            SELECT damage_reported, discrepancy_percentage
            FROM grn_items
            WHERE grn_id = $1 AND status <> 'verified_ok'
            "#,
        )
        .bind(grn_id)
        .fetch_all(&mut *tx)
        .await?;

        let inputs: Vec<TicketSeverityInput> = severities
            .into_iter()
            .map(|(damage_reported, discrepancy_percentage)| TicketSeverityInput {
                damage_reported,
                discrepancy_percentage,
            })
            .collect();
        let priority = derive_ticket_priority(&inputs, self.policy.ticket_escalation_percent);

        let ticket_number = self.next_ticket_number(&mut tx).await?;
        let title = format!("Discrepancy on receipt {}", receipt_number);

        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            INSERT INTO tickets (ticket_number, grn_id, status, priority, title, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TICKET_COLUMNS
        ))
        .bind(&ticket_number)
        .bind(grn_id)
        .bind(TicketStatus::Open.as_str())
        .bind(priority.as_str())
        .bind(&title)
        .bind(format!(
            "Automatically opened for goods receipt {} with status {}",
            receipt_number,
            status.as_str()
        ))
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEntry {
                    actor_id,
                    action: "ticket.opened",
                    entity_type: "ticket",
                    entity_id: row.id,
                    vendor_id: None,
                    detail: serde_json::json!({
                        "ticket_number": ticket_number,
                        "grn_id": grn_id,
                        "priority": priority.as_str(),
                    }),
                },
            )
            .await?;

        tx.commit().await?;

        Ok(ProcessOutcome::Created(row.into()))
    }

    /// Advance a ticket through the resolution workflow
    pub async fn update_ticket_status(
        &self,
        actor_id: Uuid,
        ticket_id: Uuid,
        new_status: TicketStatus,
    ) -> AppResult<Ticket> {
        let budget = Duration::from_secs(self.db_config.txn_timeout_secs);
        tokio::time::timeout(
            budget,
            self.update_ticket_status_tx(actor_id, ticket_id, new_status),
        )
        .await
        .map_err(|_| {
            AppError::ConcurrencyTimeout(
                "ticket status update exceeded the transaction budget".to_string(),
            )
        })?
    }

    async fn update_ticket_status_tx(
        &self,
        actor_id: Uuid,
        ticket_id: Uuid,
        new_status: TicketStatus,
    ) -> AppResult<Ticket> {
        let mut tx = self.db.begin().await.map_err(map_pool_timeout)?;

        let current_raw = sqlx::query_scalar::<_, String>(
            "SELECT status FROM tickets WHERE id = $1 FOR UPDATE",
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?;

        let current = TicketStatus::from_str(&current_raw)
            .ok_or_else(|| AppError::Internal(format!("Unknown ticket status '{}'", current_raw)))?;

        if !current.can_transition_to(new_status) {
            return Err(AppError::StateConflict(format!(
                "Ticket cannot move from {} to {}",
                current.as_str(),
                new_status.as_str()
            )));
        }

        let resolved_at = matches!(new_status, TicketStatus::Resolved).then(Utc::now);

        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            UPDATE tickets
            SET status = $1, updated_at = NOW(), resolved_at = COALESCE($2, resolved_at)
            WHERE id = $3
            RETURNING {}
            "#,
            TICKET_COLUMNS
        ))
        .bind(new_status.as_str())
        .bind(resolved_at)
        .bind(ticket_id)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_tx(
                &mut tx,
                AuditEntry {
                    actor_id,
                    action: "ticket.status_changed",
                    entity_type: "ticket",
                    entity_id: ticket_id,
                    vendor_id: None,
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

    /// Get one ticket
    pub async fn get_ticket(&self, ticket_id: Uuid) -> AppResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket".to_string()))?;

        Ok(row.into())
    }

    /// List tickets, optionally filtered by workflow status
    pub async fn list_tickets(&self, status: Option<TicketStatus>) -> AppResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            SELECT {}
            FROM tickets
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
            TICKET_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Goods receipts still awaiting verification, for operator queuing
    pub async fn get_pending_grns(&self) -> AppResult<Vec<GoodsReceiptNote>> {
        let rows = sqlx::query_as::<_, PendingGrnRow>(
            r#"
            SELECT id, receipt_number, dispatch_id, status, receipt_date, received_by,
                   remarks, remarks_th, created_at, updated_at
            FROM goods_receipt_notes
            WHERE status = 'pending_verification'
            ORDER BY receipt_date ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Generate ticket number: TKT-YYYY-NNNNN
    async fn next_ticket_number(&self, tx: &mut Transaction<'_, Postgres>) -> AppResult<String> {
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('ticket_seq')")
            .fetch_one(&mut **tx)
            .await?;

        Ok(format!("TKT-{}-{:05}", Utc::now().year(), sequence))
    }
}

/// Outcome of processing one GRN
enum ProcessOutcome {
    Clean,
    Existing(Ticket),
    Created(Ticket),
}

/// Database row for a pending goods receipt note
#[derive(Debug, sqlx::FromRow)]
struct PendingGrnRow {
    id: Uuid,
    receipt_number: String,
    dispatch_id: Uuid,
    status: String,
    receipt_date: chrono::NaiveDate,
    received_by: Uuid,
    remarks: Option<String>,
    remarks_th: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PendingGrnRow> for GoodsReceiptNote {
    fn from(row: PendingGrnRow) -> Self {
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
