//! Tests for dispatch guards and assignment lifecycle
//!
//! The status guard inside the creation transaction is the backstop
//! against double-dispatch; these tests pin down exactly which states may
//! enter a dispatch.

use shared::{
    validate_dispatched_quantity, validate_tracking_code, AssignmentStatus, DispatchStatus,
};

// =============================================================================
// Dispatch Eligibility Guard
// =============================================================================
// Only vendor-confirmed assignments can be dispatched; anything already
// dispatched (or later) must be rejected.

mod eligibility {
    use super::*;

    #[test]
    fn confirmed_assignments_are_eligible() {
        assert!(AssignmentStatus::VendorConfirmedFull.is_vendor_confirmed());
        assert!(AssignmentStatus::VendorConfirmedPartial.is_vendor_confirmed());
    }

    #[test]
    fn unconfirmed_assignments_are_rejected() {
        assert!(!AssignmentStatus::PendingConfirmation.is_vendor_confirmed());
        assert!(!AssignmentStatus::VendorDeclined.is_vendor_confirmed());
    }

    #[test]
    fn dispatched_and_later_states_are_rejected() {
        for status in [
            AssignmentStatus::Dispatched,
            AssignmentStatus::StoreReceived,
            AssignmentStatus::VerifiedOk,
            AssignmentStatus::VerifiedMismatch,
            AssignmentStatus::Completed,
        ] {
            assert!(status.is_dispatched_or_later(), "{:?} must block dispatch", status);
        }
    }

    #[test]
    fn double_dispatch_guard_is_stable() {
        // The same check that rejects the loser of a race rejects an
        // explicit resubmission
        let after_first_dispatch = AssignmentStatus::Dispatched;
        assert!(after_first_dispatch.is_dispatched_or_later());
        assert!(!after_first_dispatch.is_vendor_confirmed());
    }
}

// =============================================================================
// Assignment Lifecycle
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn full_lifecycle_path_is_legal() {
        let path = [
            AssignmentStatus::PendingConfirmation,
            AssignmentStatus::VendorConfirmedFull,
            AssignmentStatus::Dispatched,
            AssignmentStatus::StoreReceived,
            AssignmentStatus::VerifiedMismatch,
            AssignmentStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{:?} -> {:?} must be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn verification_can_skip_store_received() {
        assert!(AssignmentStatus::Dispatched.can_transition_to(AssignmentStatus::VerifiedOk));
        assert!(AssignmentStatus::Dispatched.can_transition_to(AssignmentStatus::VerifiedMismatch));
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!AssignmentStatus::Dispatched
            .can_transition_to(AssignmentStatus::VendorConfirmedFull));
        assert!(!AssignmentStatus::Completed.can_transition_to(AssignmentStatus::Dispatched));
        assert!(!AssignmentStatus::VerifiedOk.can_transition_to(AssignmentStatus::StoreReceived));
    }

    #[test]
    fn declined_is_terminal() {
        for next in [
            AssignmentStatus::VendorConfirmedFull,
            AssignmentStatus::Dispatched,
            AssignmentStatus::Completed,
        ] {
            assert!(!AssignmentStatus::VendorDeclined.can_transition_to(next));
        }
    }

    #[test]
    fn open_states_for_sla_tracking() {
        assert!(AssignmentStatus::Dispatched.is_open());
        assert!(AssignmentStatus::PendingConfirmation.is_open());
        assert!(!AssignmentStatus::Completed.is_open());
        assert!(!AssignmentStatus::VendorDeclined.is_open());
    }
}

// =============================================================================
// Shipment Status Advancement
// =============================================================================

mod shipment_status {
    use super::*;

    #[test]
    fn forward_only() {
        assert!(DispatchStatus::Pending.can_transition_to(DispatchStatus::InTransit));
        assert!(DispatchStatus::Dispatched.can_transition_to(DispatchStatus::Delivered));
        assert!(!DispatchStatus::Delivered.can_transition_to(DispatchStatus::Pending));
        assert!(!DispatchStatus::InTransit.can_transition_to(DispatchStatus::Dispatched));
    }
}

// =============================================================================
// Input Validations
// =============================================================================

mod validations {
    use super::*;

    #[test]
    fn dispatched_quantity_must_be_positive() {
        assert!(validate_dispatched_quantity(1).is_ok());
        assert!(validate_dispatched_quantity(0).is_err());
        assert!(validate_dispatched_quantity(-3).is_err());
    }

    #[test]
    fn tracking_code_format() {
        assert!(validate_tracking_code("TH-20260801-0042").is_ok());
        assert!(validate_tracking_code("X1").is_err());
        assert!(validate_tracking_code("BAD CODE").is_err());
        assert!(validate_tracking_code(&"A".repeat(41)).is_err());
    }
}
