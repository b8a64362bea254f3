//! Tests for goods receipt verification logic
//!
//! Covers item status priority, the aggregate status fold, summary counts,
//! and the input validations that run before any persistence.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    classify_discrepancy, grn_aggregate_status, grn_item_status, validate_damage_report,
    validate_grn_item_count, validate_received_quantity, DiscrepancyInput, GrnItem, GrnItemStatus,
    GrnStatus, GrnSummary,
};

fn item_with_status(status: GrnItemStatus) -> GrnItem {
    GrnItem {
        id: Uuid::new_v4(),
        grn_id: Uuid::new_v4(),
        dispatch_item_id: Uuid::new_v4(),
        received_quantity: 10,
        discrepancy_quantity: 0,
        discrepancy_percentage: Decimal::ZERO,
        damage_reported: false,
        damage_description: None,
        item_remarks: None,
        status,
    }
}

// =============================================================================
// Item Status Priority
// =============================================================================
// Priority, highest first: damage, shortage, excess, clean.

mod item_status_priority {
    use super::*;

    #[test]
    fn damage_beats_shortage() {
        assert_eq!(grn_item_status(true, -5), GrnItemStatus::DamageReported);
    }

    #[test]
    fn damage_beats_excess() {
        assert_eq!(grn_item_status(true, 5), GrnItemStatus::DamageReported);
    }

    #[test]
    fn damage_beats_exact_match() {
        assert_eq!(grn_item_status(true, 0), GrnItemStatus::DamageReported);
    }

    #[test]
    fn negative_discrepancy_is_shortage() {
        assert_eq!(grn_item_status(false, -1), GrnItemStatus::ShortageReported);
    }

    #[test]
    fn positive_discrepancy_is_excess() {
        assert_eq!(grn_item_status(false, 1), GrnItemStatus::ExcessReceived);
    }

    #[test]
    fn zero_discrepancy_is_clean() {
        assert_eq!(grn_item_status(false, 0), GrnItemStatus::VerifiedOk);
    }
}

// =============================================================================
// Aggregate Status Fold
// =============================================================================
// All clean => verified-ok; none clean => verified-mismatch; mixed =>
// partially-verified. The aggregate is never set independently of items.

mod aggregate_fold {
    use super::*;

    #[test]
    fn all_clean_is_verified_ok() {
        let statuses = [GrnItemStatus::VerifiedOk, GrnItemStatus::VerifiedOk];
        assert_eq!(grn_aggregate_status(&statuses), GrnStatus::VerifiedOk);
    }

    #[test]
    fn single_mismatch_among_clean_is_partial() {
        let statuses = [
            GrnItemStatus::VerifiedOk,
            GrnItemStatus::ShortageReported,
            GrnItemStatus::VerifiedOk,
        ];
        assert_eq!(grn_aggregate_status(&statuses), GrnStatus::PartiallyVerified);
    }

    #[test]
    fn all_mismatched_is_verified_mismatch() {
        let statuses = [
            GrnItemStatus::DamageReported,
            GrnItemStatus::ExcessReceived,
            GrnItemStatus::ShortageReported,
        ];
        assert_eq!(grn_aggregate_status(&statuses), GrnStatus::VerifiedMismatch);
    }

    #[test]
    fn single_mismatched_item_is_verified_mismatch() {
        let statuses = [GrnItemStatus::ShortageReported];
        assert_eq!(grn_aggregate_status(&statuses), GrnStatus::VerifiedMismatch);
    }

    #[test]
    fn single_clean_item_is_verified_ok() {
        let statuses = [GrnItemStatus::VerifiedOk];
        assert_eq!(grn_aggregate_status(&statuses), GrnStatus::VerifiedOk);
    }
}

// =============================================================================
// Summary Counts
// =============================================================================

mod summary {
    use super::*;

    #[test]
    fn summary_counts_non_clean_items() {
        let items = vec![
            item_with_status(GrnItemStatus::VerifiedOk),
            item_with_status(GrnItemStatus::ShortageReported),
            item_with_status(GrnItemStatus::DamageReported),
        ];
        let summary = GrnSummary::from_items(&items);
        assert!(summary.discrepancies_found);
        assert_eq!(summary.total_items_verified, 3);
        assert_eq!(summary.items_with_discrepancy, 2);
    }

    #[test]
    fn clean_receipt_reports_no_discrepancies() {
        let items = vec![
            item_with_status(GrnItemStatus::VerifiedOk),
            item_with_status(GrnItemStatus::VerifiedOk),
        ];
        let summary = GrnSummary::from_items(&items);
        assert!(!summary.discrepancies_found);
        assert_eq!(summary.items_with_discrepancy, 0);
    }
}

// =============================================================================
// End-to-End Verification Scenario (pure parts)
// =============================================================================
// Confirmed 100, received 90, no damage: shortage of 10 at 10%, item status
// shortage-reported, single-item aggregate verified-mismatch.

#[test]
fn short_receipt_end_to_end() {
    let result = classify_discrepancy(&DiscrepancyInput {
        assigned_quantity: 100,
        confirmed_quantity: 100,
        received_quantity: 90,
        damage_reported: false,
    });

    assert_eq!(result.discrepancy_quantity, -10);
    assert_eq!(result.discrepancy_percentage, Decimal::from(10));

    let status = grn_item_status(false, result.discrepancy_quantity);
    assert_eq!(status, GrnItemStatus::ShortageReported);

    assert_eq!(grn_aggregate_status(&[status]), GrnStatus::VerifiedMismatch);
}

// =============================================================================
// Input Validations
// =============================================================================

mod validations {
    use super::*;

    #[test]
    fn received_quantity_range() {
        assert!(validate_received_quantity(0).is_ok());
        assert!(validate_received_quantity(100_000).is_ok());
        assert!(validate_received_quantity(100_001).is_err());
        assert!(validate_received_quantity(-5).is_err());
    }

    #[test]
    fn item_count_range() {
        assert!(validate_grn_item_count(1).is_ok());
        assert!(validate_grn_item_count(100).is_ok());
        assert!(validate_grn_item_count(0).is_err());
        assert!(validate_grn_item_count(101).is_err());
    }

    #[test]
    fn damage_report_requires_description() {
        assert!(validate_damage_report(true, Some("torn packaging")).is_ok());
        assert!(validate_damage_report(true, Some("")).is_err());
        assert!(validate_damage_report(true, None).is_err());
        assert!(validate_damage_report(false, None).is_ok());
    }
}

// =============================================================================
// Fold and Summary Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The summary discrepancy count always equals the number of non-clean
    /// items
    #[test]
    fn summary_matches_item_statuses(
        statuses in proptest::collection::vec(0usize..5, 1..50),
    ) {
        let all = [
            GrnItemStatus::VerifiedOk,
            GrnItemStatus::QuantityMismatch,
            GrnItemStatus::DamageReported,
            GrnItemStatus::ShortageReported,
            GrnItemStatus::ExcessReceived,
        ];
        let items: Vec<GrnItem> = statuses.iter().map(|i| item_with_status(all[*i])).collect();
        let summary = GrnSummary::from_items(&items);

        let expected = items.iter().filter(|i| i.status != GrnItemStatus::VerifiedOk).count();
        prop_assert_eq!(summary.items_with_discrepancy, expected);
        prop_assert_eq!(summary.discrepancies_found, expected > 0);
    }

    /// The aggregate fold is consistent with the share of clean items
    #[test]
    fn aggregate_matches_clean_share(
        statuses in proptest::collection::vec(0usize..5, 1..50),
    ) {
        let all = [
            GrnItemStatus::VerifiedOk,
            GrnItemStatus::QuantityMismatch,
            GrnItemStatus::DamageReported,
            GrnItemStatus::ShortageReported,
            GrnItemStatus::ExcessReceived,
        ];
        let folded: Vec<GrnItemStatus> = statuses.iter().map(|i| all[*i]).collect();
        let clean = folded.iter().filter(|s| s.is_clean()).count();

        let expected = if clean == folded.len() {
            GrnStatus::VerifiedOk
        } else if clean == 0 {
            GrnStatus::VerifiedMismatch
        } else {
            GrnStatus::PartiallyVerified
        };
        prop_assert_eq!(grn_aggregate_status(&folded), expected);
    }
}
