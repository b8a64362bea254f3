//! Tests for the discrepancy classifier
//!
//! Verifies that the pure classification of (confirmed, received, damage)
//! into type, magnitude, and percentage is deterministic and total.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{classify_discrepancy, DiscrepancyInput, DiscrepancyType};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn input(confirmed: i64, received: i64, damage: bool) -> DiscrepancyInput {
    DiscrepancyInput {
        assigned_quantity: confirmed,
        confirmed_quantity: confirmed,
        received_quantity: received,
        damage_reported: damage,
    }
}

// =============================================================================
// Classification Cases
// =============================================================================

mod classification {
    use super::*;

    #[test]
    fn exact_match_is_clean() {
        let result = classify_discrepancy(&input(10, 10, false));
        assert_eq!(result.discrepancy_type, DiscrepancyType::None);
        assert_eq!(result.discrepancy_quantity, 0);
        assert_eq!(result.discrepancy_percentage, Decimal::ZERO);
    }

    #[test]
    fn short_delivery_is_shortage() {
        let result = classify_discrepancy(&input(10, 7, false));
        assert_eq!(result.discrepancy_type, DiscrepancyType::Shortage);
        assert_eq!(result.discrepancy_quantity, -3);
        assert_eq!(result.discrepancy_percentage, dec("30"));
    }

    #[test]
    fn over_delivery_is_excess() {
        let result = classify_discrepancy(&input(10, 12, false));
        assert_eq!(result.discrepancy_type, DiscrepancyType::Excess);
        assert_eq!(result.discrepancy_quantity, 2);
        assert_eq!(result.discrepancy_percentage, dec("20"));
    }

    #[test]
    fn damage_overrides_exact_match() {
        // Physical damage is independently actionable even when counts match
        let result = classify_discrepancy(&input(10, 10, true));
        assert_eq!(result.discrepancy_type, DiscrepancyType::Damage);
        assert_eq!(result.discrepancy_quantity, 0);
        assert_eq!(result.discrepancy_percentage, Decimal::ZERO);
    }

    #[test]
    fn damage_overrides_shortage() {
        let result = classify_discrepancy(&input(10, 7, true));
        assert_eq!(result.discrepancy_type, DiscrepancyType::Damage);
        assert_eq!(result.discrepancy_quantity, -3);
        assert_eq!(result.discrepancy_percentage, dec("30"));
    }

    #[test]
    fn zero_confirmed_never_divides() {
        let result = classify_discrepancy(&input(0, 5, false));
        assert_eq!(result.discrepancy_type, DiscrepancyType::Excess);
        assert_eq!(result.discrepancy_quantity, 5);
        assert_eq!(result.discrepancy_percentage, Decimal::ZERO);
    }

    #[test]
    fn nothing_confirmed_nothing_received() {
        let result = classify_discrepancy(&input(0, 0, false));
        assert_eq!(result.discrepancy_type, DiscrepancyType::None);
        assert_eq!(result.discrepancy_quantity, 0);
        assert_eq!(result.discrepancy_percentage, Decimal::ZERO);
    }

    #[test]
    fn full_shortage_is_one_hundred_percent() {
        let result = classify_discrepancy(&input(50, 0, false));
        assert_eq!(result.discrepancy_type, DiscrepancyType::Shortage);
        assert_eq!(result.discrepancy_quantity, -50);
        assert_eq!(result.discrepancy_percentage, dec("100"));
    }
}

// =============================================================================
// Classifier Properties
// =============================================================================
// For all valid inputs, discrepancy_quantity = received − confirmed, and the
// percentage is non-negative and zero exactly when guarded.

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn quantity_is_received_minus_confirmed(
        confirmed in 0i64..100_000,
        received in 0i64..100_000,
        damage in proptest::bool::ANY,
    ) {
        let result = classify_discrepancy(&input(confirmed, received, damage));
        prop_assert_eq!(result.discrepancy_quantity, received - confirmed);
    }

    #[test]
    fn percentage_is_never_negative(
        confirmed in 0i64..100_000,
        received in 0i64..100_000,
    ) {
        let result = classify_discrepancy(&input(confirmed, received, false));
        prop_assert!(result.discrepancy_percentage >= Decimal::ZERO);
    }

    #[test]
    fn damage_always_wins(
        confirmed in 0i64..100_000,
        received in 0i64..100_000,
    ) {
        let result = classify_discrepancy(&input(confirmed, received, true));
        prop_assert_eq!(result.discrepancy_type, DiscrepancyType::Damage);
    }

    #[test]
    fn type_matches_sign_without_damage(
        confirmed in 0i64..100_000,
        received in 0i64..100_000,
    ) {
        let result = classify_discrepancy(&input(confirmed, received, false));
        let expected = if received < confirmed {
            DiscrepancyType::Shortage
        } else if received > confirmed {
            DiscrepancyType::Excess
        } else {
            DiscrepancyType::None
        };
        prop_assert_eq!(result.discrepancy_type, expected);
    }
}
