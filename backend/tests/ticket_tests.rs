//! Tests for exception ticket workflow and priority derivation

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{derive_ticket_priority, TicketPriority, TicketSeverityInput, TicketStatus};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn severity(damage: bool, percentage: &str) -> TicketSeverityInput {
    TicketSeverityInput {
        damage_reported: damage,
        discrepancy_percentage: dec(percentage),
    }
}

// =============================================================================
// Workflow Transitions
// =============================================================================
// Legal: open -> in-progress -> resolved -> closed, plus open/in-progress
// straight to closed. Closed is terminal.

mod transitions {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        assert!(TicketStatus::Open.can_transition_to(TicketStatus::InProgress));
        assert!(TicketStatus::InProgress.can_transition_to(TicketStatus::Resolved));
        assert!(TicketStatus::Resolved.can_transition_to(TicketStatus::Closed));
    }

    #[test]
    fn direct_close_from_open_and_in_progress() {
        assert!(TicketStatus::Open.can_transition_to(TicketStatus::Closed));
        assert!(TicketStatus::InProgress.can_transition_to(TicketStatus::Closed));
    }

    #[test]
    fn closed_accepts_nothing() {
        for next in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ] {
            assert!(!TicketStatus::Closed.can_transition_to(next));
        }
    }

    #[test]
    fn no_skipping_to_resolved_from_open() {
        assert!(!TicketStatus::Open.can_transition_to(TicketStatus::Resolved));
    }

    #[test]
    fn no_reopening() {
        assert!(!TicketStatus::Resolved.can_transition_to(TicketStatus::Open));
        assert!(!TicketStatus::InProgress.can_transition_to(TicketStatus::Open));
    }

    #[test]
    fn no_self_transitions() {
        for status in [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Closed,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }
}

// =============================================================================
// Priority Derivation
// =============================================================================
// Damage, or a discrepancy at or beyond the escalation threshold, ranks
// above a plain quantity mismatch.

mod priority {
    use super::*;

    #[test]
    fn plain_mismatch_is_medium() {
        let items = [severity(false, "5"), severity(false, "12.5")];
        assert_eq!(derive_ticket_priority(&items, dec("20")), TicketPriority::Medium);
    }

    #[test]
    fn any_damage_escalates() {
        let items = [severity(false, "1"), severity(true, "0")];
        assert_eq!(derive_ticket_priority(&items, dec("20")), TicketPriority::High);
    }

    #[test]
    fn large_shortage_escalates() {
        let items = [severity(false, "35")];
        assert_eq!(derive_ticket_priority(&items, dec("20")), TicketPriority::High);
    }

    #[test]
    fn threshold_boundary_escalates() {
        let items = [severity(false, "20")];
        assert_eq!(derive_ticket_priority(&items, dec("20")), TicketPriority::High);

        let just_below = [severity(false, "19.99")];
        assert_eq!(
            derive_ticket_priority(&just_below, dec("20")),
            TicketPriority::Medium
        );
    }

    #[test]
    fn threshold_is_configurable() {
        let items = [severity(false, "12")];
        assert_eq!(derive_ticket_priority(&items, dec("10")), TicketPriority::High);
        assert_eq!(derive_ticket_priority(&items, dec("50")), TicketPriority::Medium);
    }
}

// =============================================================================
// Priority Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Damage escalates regardless of every percentage involved
    #[test]
    fn damage_always_escalates(
        percentages in proptest::collection::vec(0u32..200, 1..20),
        damaged_index in 0usize..20,
    ) {
        let mut items: Vec<TicketSeverityInput> = percentages
            .iter()
            .map(|p| TicketSeverityInput {
                damage_reported: false,
                discrepancy_percentage: Decimal::from(*p),
            })
            .collect();
        let index = damaged_index % items.len();
        items[index].damage_reported = true;

        prop_assert_eq!(
            derive_ticket_priority(&items, Decimal::from(1000)),
            TicketPriority::High
        );
    }

    /// Without damage, priority depends only on the threshold comparison
    #[test]
    fn threshold_comparison_decides(
        percentages in proptest::collection::vec(0u32..200, 1..20),
        threshold in 1u32..200,
    ) {
        let items: Vec<TicketSeverityInput> = percentages
            .iter()
            .map(|p| TicketSeverityInput {
                damage_reported: false,
                discrepancy_percentage: Decimal::from(*p),
            })
            .collect();

        let threshold = Decimal::from(threshold);
        let expected = if percentages.iter().any(|p| Decimal::from(*p) >= threshold) {
            TicketPriority::High
        } else {
            TicketPriority::Medium
        };
        prop_assert_eq!(derive_ticket_priority(&items, threshold), expected);
    }
}
