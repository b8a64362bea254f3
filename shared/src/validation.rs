//! Validation utilities for the Procurement Fulfillment Platform
//!
//! Input bounds are checked before any persistence; violations surface as
//! validation errors with no side effects.

use rust_decimal::Decimal;

/// Upper bound for a received quantity on one GRN item
pub const MAX_RECEIVED_QUANTITY: i64 = 100_000;

/// Bounds for the number of items on one GRN
pub const MIN_GRN_ITEMS: usize = 1;
pub const MAX_GRN_ITEMS: usize = 100;

// ============================================================================
// Goods Receipt Validations
// ============================================================================

/// Validate a received quantity is within the accepted range
pub fn validate_received_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Received quantity cannot be negative");
    }
    if quantity > MAX_RECEIVED_QUANTITY {
        return Err("Received quantity exceeds the maximum of 100000");
    }
    Ok(())
}

/// Validate the item count of one goods receipt
pub fn validate_grn_item_count(count: usize) -> Result<(), &'static str> {
    if count < MIN_GRN_ITEMS {
        return Err("A goods receipt must contain at least one item");
    }
    if count > MAX_GRN_ITEMS {
        return Err("A goods receipt cannot contain more than 100 items");
    }
    Ok(())
}

/// A damage report must carry a description of the damage
pub fn validate_damage_report(
    damage_reported: bool,
    damage_description: Option<&str>,
) -> Result<(), &'static str> {
    if damage_reported {
        match damage_description {
            Some(desc) if !desc.trim().is_empty() => Ok(()),
            _ => Err("Damage description is required when damage is reported"),
        }
    } else {
        Ok(())
    }
}

// ============================================================================
// Dispatch Validations
// ============================================================================

/// Validate a dispatched quantity is positive
pub fn validate_dispatched_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Dispatched quantity must be positive");
    }
    Ok(())
}

/// Validate carrier tracking code format (3-40 chars, alphanumeric and dashes)
pub fn validate_tracking_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Tracking code must be at least 3 characters");
    }
    if code.len() > 40 {
        return Err("Tracking code must be at most 40 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err("Tracking code must be alphanumeric with dashes only");
    }
    Ok(())
}

// ============================================================================
// Metric Parameter Validations
// ============================================================================

/// Validate an SLA buffer percentage
pub fn validate_buffer_percentage(buffer: Decimal) -> Result<(), &'static str> {
    if buffer < Decimal::ZERO || buffer > Decimal::from(100) {
        return Err("Buffer percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate a lookback window in days
pub fn validate_lookback_days(days: i64) -> Result<(), &'static str> {
    if days <= 0 {
        return Err("Lookback window must be positive");
    }
    if days > 365 {
        return Err("Lookback window cannot exceed 365 days");
    }
    Ok(())
}

/// Validate vendor code format (2-10 uppercase alphanumeric)
pub fn validate_vendor_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Vendor code must be at least 2 characters");
    }
    if code.len() > 10 {
        return Err("Vendor code must be at most 10 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err("Vendor code must be uppercase alphanumeric only");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_quantity_bounds() {
        assert!(validate_received_quantity(0).is_ok());
        assert!(validate_received_quantity(100_000).is_ok());
        assert!(validate_received_quantity(-1).is_err());
        assert!(validate_received_quantity(100_001).is_err());
    }

    #[test]
    fn grn_item_count_bounds() {
        assert!(validate_grn_item_count(1).is_ok());
        assert!(validate_grn_item_count(100).is_ok());
        assert!(validate_grn_item_count(0).is_err());
        assert!(validate_grn_item_count(101).is_err());
    }

    #[test]
    fn damage_requires_description() {
        assert!(validate_damage_report(true, Some("crushed cartons")).is_ok());
        assert!(validate_damage_report(true, Some("   ")).is_err());
        assert!(validate_damage_report(true, None).is_err());
        assert!(validate_damage_report(false, None).is_ok());
    }

    #[test]
    fn tracking_code_format() {
        assert!(validate_tracking_code("TH-99812-X").is_ok());
        assert!(validate_tracking_code("AB").is_err());
        assert!(validate_tracking_code("HAS SPACE").is_err());
    }

    #[test]
    fn vendor_code_format() {
        assert!(validate_vendor_code("ACME1").is_ok());
        assert!(validate_vendor_code("a").is_err());
        assert!(validate_vendor_code("lower").is_err());
    }
}
