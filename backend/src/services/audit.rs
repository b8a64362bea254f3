//! Audit trail service
//!
//! Audit entries for mutating operations are written inside the same
//! transaction as the mutation they describe, so a rolled-back operation
//! leaves no audit trace.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;

/// Audit service writing the append-only audit log
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

/// One audit entry describing a mutating operation
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub detail: serde_json::Value,
}

/// Persisted audit record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditService {
    /// Create a new AuditService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an audit entry inside the caller's transaction
    pub async fn record_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: AuditEntry,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (actor_id, action, entity_type, entity_id, vendor_id, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.vendor_id)
        .bind(&entry.detail)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// List audit entries for one entity, newest first
    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<AuditRecord>> {
        let records = sqlx::query_as::<_, AuditRecord>(
            r#"
            SELECT id, actor_id, action, entity_type, entity_id, vendor_id, detail, created_at
            FROM audit_log
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }
}
