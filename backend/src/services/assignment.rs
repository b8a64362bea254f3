//! Read-only access to order assignments
//!
//! Assignments are owned by the vendor-facing ordering flow; the
//! fulfillment pipeline reads them here and advances their status inside
//! the dispatch and receipt transactions.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::query::AssignmentFilter;
use shared::{Assignment, AssignmentStatus, Pagination};

/// Assignment read service
#[derive(Clone)]
pub struct AssignmentService {
    db: PgPool,
}

/// Database row for an assignment
#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    vendor_id: Uuid,
    order_line_id: Uuid,
    assigned_quantity: i64,
    confirmed_quantity: i64,
    status: String,
    assigned_at: DateTime<Utc>,
    vendor_action_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            vendor_id: row.vendor_id,
            order_line_id: row.order_line_id,
            assigned_quantity: row.assigned_quantity,
            confirmed_quantity: row.confirmed_quantity,
            status: AssignmentStatus::from_str(&row.status)
                .unwrap_or(AssignmentStatus::PendingConfirmation),
            assigned_at: row.assigned_at,
            vendor_action_at: row.vendor_action_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ASSIGNMENT_COLUMNS: &str = "a.id, a.vendor_id, a.order_line_id, a.assigned_quantity, \
                                  a.confirmed_quantity, a.status, a.assigned_at, \
                                  a.vendor_action_at, a.created_at, a.updated_at";

impl AssignmentService {
    /// Create a new AssignmentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get one assignment, scoped to the vendor for vendor callers
    pub async fn get_assignment(
        &self,
        assignment_id: Uuid,
        vendor_scope: Option<Uuid>,
    ) -> AppResult<Assignment> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"
            SELECT {}
            FROM assignments a
            WHERE a.id = $1 AND ($2::uuid IS NULL OR a.vendor_id = $2)
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .bind(vendor_scope)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment".to_string()))?;

        Ok(row.into())
    }

    /// List assignments matching the typed filter, newest first
    pub async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
        pagination: &Pagination,
    ) -> AppResult<Vec<Assignment>> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM assignments a",
            ASSIGNMENT_COLUMNS
        ));
        filter.push_where(&mut builder, "a");
        builder.push(" ORDER BY a.assigned_at DESC LIMIT ");
        builder.push_bind(pagination.limit());
        builder.push(" OFFSET ");
        builder.push_bind(pagination.offset());

        let rows: Vec<AssignmentRow> = builder.build_query_as().fetch_all(&self.db).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
