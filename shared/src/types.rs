//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference to a document held by the external object-storage service
///
/// The storage key and URL are opaque to the core; they are stored and
/// returned verbatim, never parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentReference {
    pub id: uuid::Uuid,
    pub file_type: AttachmentType,
    pub storage_key: String,
    pub url: String,
    pub original_filename: Option<String>,
}

/// Types of attached files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    Image,
    Document,
}

impl AttachmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentType::Image => "image",
            AttachmentType::Document => "document",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(AttachmentType::Image),
            "document" => Some(AttachmentType::Document),
            _ => None,
        }
    }
}

/// Inclusive date range filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        ((self.page.max(1) - 1) * self.per_page) as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}
