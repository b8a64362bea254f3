//! Order assignment models
//!
//! An assignment records a vendor's commitment against one order line. It is
//! created and confirmed by the vendor-facing ordering flow; the fulfillment
//! pipeline only reads assignments and advances their status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assignment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    PendingConfirmation,
    VendorConfirmedFull,
    VendorConfirmedPartial,
    VendorDeclined,
    Dispatched,
    StoreReceived,
    VerifiedOk,
    VerifiedMismatch,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::PendingConfirmation => "pending_confirmation",
            AssignmentStatus::VendorConfirmedFull => "vendor_confirmed_full",
            AssignmentStatus::VendorConfirmedPartial => "vendor_confirmed_partial",
            AssignmentStatus::VendorDeclined => "vendor_declined",
            AssignmentStatus::Dispatched => "dispatched",
            AssignmentStatus::StoreReceived => "store_received",
            AssignmentStatus::VerifiedOk => "verified_ok",
            AssignmentStatus::VerifiedMismatch => "verified_mismatch",
            AssignmentStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_confirmation" => Some(AssignmentStatus::PendingConfirmation),
            "vendor_confirmed_full" => Some(AssignmentStatus::VendorConfirmedFull),
            "vendor_confirmed_partial" => Some(AssignmentStatus::VendorConfirmedPartial),
            "vendor_declined" => Some(AssignmentStatus::VendorDeclined),
            "dispatched" => Some(AssignmentStatus::Dispatched),
            "store_received" => Some(AssignmentStatus::StoreReceived),
            "verified_ok" => Some(AssignmentStatus::VerifiedOk),
            "verified_mismatch" => Some(AssignmentStatus::VerifiedMismatch),
            "completed" => Some(AssignmentStatus::Completed),
            _ => None,
        }
    }

    /// Vendor has committed stock and the line can be dispatched
    pub fn is_vendor_confirmed(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::VendorConfirmedFull | AssignmentStatus::VendorConfirmedPartial
        )
    }

    /// The line has already been shipped (or progressed past shipping)
    pub fn is_dispatched_or_later(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Dispatched
                | AssignmentStatus::StoreReceived
                | AssignmentStatus::VerifiedOk
                | AssignmentStatus::VerifiedMismatch
                | AssignmentStatus::Completed
        )
    }

    /// The assignment still counts as an open order for SLA tracking
    pub fn is_open(&self) -> bool {
        !matches!(
            self,
            AssignmentStatus::VendorDeclined | AssignmentStatus::Completed
        )
    }

    /// Validate a status transition against the fixed lifecycle
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (PendingConfirmation, VendorConfirmedFull)
                | (PendingConfirmation, VendorConfirmedPartial)
                | (PendingConfirmation, VendorDeclined)
                | (VendorConfirmedFull, Dispatched)
                | (VendorConfirmedPartial, Dispatched)
                | (Dispatched, StoreReceived)
                | (Dispatched, VerifiedOk)
                | (Dispatched, VerifiedMismatch)
                | (StoreReceived, VerifiedOk)
                | (StoreReceived, VerifiedMismatch)
                | (VerifiedOk, Completed)
                | (VerifiedMismatch, Completed)
        )
    }
}

/// A vendor's commitment against one order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub order_line_id: Uuid,
    pub assigned_quantity: i64,
    pub confirmed_quantity: i64,
    pub status: AssignmentStatus,
    /// When the assignment was offered to the vendor
    pub assigned_at: DateTime<Utc>,
    /// Last vendor action (confirmation, decline); completion timestamp for
    /// historical SLA durations
    pub vendor_action_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_states_can_dispatch() {
        assert!(AssignmentStatus::VendorConfirmedFull.can_transition_to(AssignmentStatus::Dispatched));
        assert!(
            AssignmentStatus::VendorConfirmedPartial.can_transition_to(AssignmentStatus::Dispatched)
        );
    }

    #[test]
    fn dispatched_cannot_be_redispatched() {
        assert!(!AssignmentStatus::Dispatched.can_transition_to(AssignmentStatus::Dispatched));
        assert!(AssignmentStatus::Dispatched.is_dispatched_or_later());
    }

    #[test]
    fn pending_cannot_dispatch() {
        assert!(!AssignmentStatus::PendingConfirmation.can_transition_to(AssignmentStatus::Dispatched));
        assert!(!AssignmentStatus::PendingConfirmation.is_vendor_confirmed());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            AssignmentStatus::PendingConfirmation,
            AssignmentStatus::VendorConfirmedFull,
            AssignmentStatus::VendorConfirmedPartial,
            AssignmentStatus::VendorDeclined,
            AssignmentStatus::Dispatched,
            AssignmentStatus::StoreReceived,
            AssignmentStatus::VerifiedOk,
            AssignmentStatus::VerifiedMismatch,
            AssignmentStatus::Completed,
        ] {
            assert_eq!(AssignmentStatus::from_str(status.as_str()), Some(status));
        }
    }
}
