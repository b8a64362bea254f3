//! Vendor read service

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::Vendor;

/// Vendor service
#[derive(Clone)]
pub struct VendorService {
    db: PgPool,
}

/// Database row for a vendor
#[derive(Debug, sqlx::FromRow)]
struct VendorRow {
    id: Uuid,
    code: String,
    name: String,
    contact_email: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Vendor {
            id: row.id,
            code: row.code,
            name: row.name,
            contact_email: row.contact_email,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl VendorService {
    /// Create a new VendorService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get one vendor
    pub async fn get_vendor(&self, vendor_id: Uuid) -> AppResult<Vendor> {
        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            SELECT id, code, name, contact_email, is_active, created_at, updated_at
            FROM vendors
            WHERE id = $1
            "#,
        )
        .bind(vendor_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor".to_string()))?;

        Ok(row.into())
    }

    /// List all vendors ordered by code
    pub async fn list_vendors(&self) -> AppResult<Vec<Vendor>> {
        let rows = sqlx::query_as::<_, VendorRow>(
            r#"
            SELECT id, code, name, contact_email, is_active, created_at, updated_at
            FROM vendors
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
