//! Dispatch models
//!
//! A dispatch is one shipment event for a vendor. It is immutable after
//! creation except for forward-only status advancement and attachment of
//! proof documents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AttachmentReference;

/// Shipment status, advanced forward-only by carrier events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Dispatched,
    InTransit,
    Delivered,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "pending",
            DispatchStatus::Dispatched => "dispatched",
            DispatchStatus::InTransit => "in_transit",
            DispatchStatus::Delivered => "delivered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DispatchStatus::Pending),
            "dispatched" => Some(DispatchStatus::Dispatched),
            "in_transit" => Some(DispatchStatus::InTransit),
            "delivered" => Some(DispatchStatus::Delivered),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DispatchStatus::Pending => 0,
            DispatchStatus::Dispatched => 1,
            DispatchStatus::InTransit => 2,
            DispatchStatus::Delivered => 3,
        }
    }

    /// Shipments only move forward; skipping intermediate carrier states
    /// is allowed (a shipment can be delivered before any in-transit scan)
    pub fn can_transition_to(&self, next: DispatchStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// One shipment event for a vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub tracking_code: String,
    pub carrier_name: String,
    pub dispatch_date: NaiveDate,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub status: DispatchStatus,
    pub remarks: Option<String>,
    pub remarks_th: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One assignment's share of a dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLineItem {
    pub id: Uuid,
    pub dispatch_id: Uuid,
    pub assignment_id: Uuid,
    pub dispatched_quantity: i64,
}

/// Dispatch with its ordered line items and proof attachments
#[derive(Debug, Clone, Serialize)]
pub struct DispatchWithItems {
    #[serde(flatten)]
    pub dispatch: Dispatch,
    pub items: Vec<DispatchLineItem>,
    pub proof_documents: Vec<AttachmentReference>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_advances() {
        assert!(DispatchStatus::Pending.can_transition_to(DispatchStatus::Dispatched));
        assert!(DispatchStatus::Dispatched.can_transition_to(DispatchStatus::Delivered));
        assert!(!DispatchStatus::Delivered.can_transition_to(DispatchStatus::InTransit));
        assert!(!DispatchStatus::InTransit.can_transition_to(DispatchStatus::InTransit));
    }
}
