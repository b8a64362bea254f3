//! Tests for vendor performance metric formulas
//!
//! Covers fill-rate bounds, the SLA benchmark scenario, compliance
//! counting, and fulfillment duration arithmetic.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{compliance_rate, fill_rate, fulfillment_days, sla_benchmark};

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// =============================================================================
// Fill Rate
// =============================================================================

mod fill_rates {
    use super::*;

    #[test]
    fn full_confirmation_is_one_hundred() {
        assert_eq!(fill_rate(500, 500), dec("100"));
    }

    #[test]
    fn partial_confirmation() {
        assert_eq!(fill_rate(200, 150), dec("75"));
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 1 / 3 * 100 = 33.333... -> 33.33
        assert_eq!(fill_rate(3, 1), dec("33.33"));
    }

    #[test]
    fn zero_assigned_guards_division() {
        assert_eq!(fill_rate(0, 0), Decimal::ZERO);
        assert_eq!(fill_rate(0, 10), Decimal::ZERO);
    }

    #[test]
    fn over_confirmation_clamps_to_one_hundred() {
        assert_eq!(fill_rate(100, 150), dec("100"));
    }
}

// =============================================================================
// Fill Rate Bound Property
// =============================================================================
// For all assigned/confirmed pairs with confirmed <= assigned, the fill
// rate stays within [0, 100].

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn fill_rate_bounded(
        assigned in 0i64..1_000_000,
        confirmed in 0i64..1_000_000,
    ) {
        // Holds even for over-confirmed histories
        let rate = fill_rate(assigned, confirmed);
        prop_assert!(rate >= Decimal::ZERO, "rate {} below 0", rate);
        prop_assert!(rate <= Decimal::from(100), "rate {} above 100", rate);
    }

    #[test]
    fn compliance_rate_bounded(
        total in 0usize..10_000,
        compliant_ratio in 0u32..=100,
    ) {
        let compliant = total * compliant_ratio as usize / 100;
        let rate = compliance_rate(compliant, total);
        prop_assert!(rate >= Decimal::ZERO);
        prop_assert!(rate <= Decimal::from(100));
    }
}

// =============================================================================
// SLA Benchmark Scenario
// =============================================================================
// Average fulfillment of 4 days with a 15% buffer yields a 4.6 day
// benchmark; 4.5 days is compliant, 5 days is not.

mod sla {
    use super::*;

    #[test]
    fn benchmark_adds_buffer() {
        assert_eq!(sla_benchmark(dec("4"), dec("15")), dec("4.6"));
    }

    #[test]
    fn compliance_against_benchmark() {
        let benchmark = sla_benchmark(dec("4"), dec("15"));

        let compliant = dec("4.5");
        let late = dec("5");
        assert!(compliant <= benchmark);
        assert!(late > benchmark);
    }

    #[test]
    fn zero_buffer_keeps_average() {
        assert_eq!(sla_benchmark(dec("3.2"), Decimal::ZERO), dec("3.2"));
    }

    #[test]
    fn compliance_rate_counts() {
        // 3 of 4 orders within the benchmark
        assert_eq!(compliance_rate(3, 4), dec("75"));
        assert_eq!(compliance_rate(0, 0), Decimal::ZERO);
        assert_eq!(compliance_rate(5, 5), dec("100"));
    }
}

// =============================================================================
// Fulfillment Duration
// =============================================================================

mod durations {
    use super::*;

    #[test]
    fn whole_days() {
        let assigned = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let completed = assigned + Duration::days(4);
        assert_eq!(fulfillment_days(assigned, completed), dec("4"));
    }

    #[test]
    fn fractional_days() {
        let assigned = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let completed = assigned + Duration::hours(108);
        assert_eq!(fulfillment_days(assigned, completed), dec("4.5"));
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let assigned = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let completed = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(fulfillment_days(assigned, completed), Decimal::ZERO);
    }

    #[test]
    fn scenario_durations_against_benchmark() {
        let benchmark = sla_benchmark(dec("4"), dec("15"));
        let assigned = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

        let on_time = fulfillment_days(assigned, assigned + Duration::hours(108));
        let late = fulfillment_days(assigned, assigned + Duration::days(5));

        assert!(on_time <= benchmark);
        assert!(late > benchmark);
    }
}
