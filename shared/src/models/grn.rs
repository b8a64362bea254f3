//! Goods receipt models and discrepancy classification
//!
//! A goods receipt note (GRN) records the physical inspection of one
//! dispatch. Classification of each inspected line is a pure function so it
//! can be called from the verification flow and from reporting queries
//! without side effects.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate verification status of a goods receipt note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrnStatus {
    PendingVerification,
    VerifiedOk,
    VerifiedMismatch,
    PartiallyVerified,
}

impl GrnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrnStatus::PendingVerification => "pending_verification",
            GrnStatus::VerifiedOk => "verified_ok",
            GrnStatus::VerifiedMismatch => "verified_mismatch",
            GrnStatus::PartiallyVerified => "partially_verified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_verification" => Some(GrnStatus::PendingVerification),
            "verified_ok" => Some(GrnStatus::VerifiedOk),
            "verified_mismatch" => Some(GrnStatus::VerifiedMismatch),
            "partially_verified" => Some(GrnStatus::PartiallyVerified),
            _ => None,
        }
    }
}

/// Status of one inspected line
///
/// `QuantityMismatch` is retained for rows imported from the predecessor
/// system; the classifier always emits the more specific shortage/excess
/// statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrnItemStatus {
    VerifiedOk,
    QuantityMismatch,
    DamageReported,
    ShortageReported,
    ExcessReceived,
}

impl GrnItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrnItemStatus::VerifiedOk => "verified_ok",
            GrnItemStatus::QuantityMismatch => "quantity_mismatch",
            GrnItemStatus::DamageReported => "damage_reported",
            GrnItemStatus::ShortageReported => "shortage_reported",
            GrnItemStatus::ExcessReceived => "excess_received",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "verified_ok" => Some(GrnItemStatus::VerifiedOk),
            "quantity_mismatch" => Some(GrnItemStatus::QuantityMismatch),
            "damage_reported" => Some(GrnItemStatus::DamageReported),
            "shortage_reported" => Some(GrnItemStatus::ShortageReported),
            "excess_received" => Some(GrnItemStatus::ExcessReceived),
            _ => None,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, GrnItemStatus::VerifiedOk)
    }
}

/// Kind of deviation between promise and delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyType {
    None,
    Shortage,
    Excess,
    Damage,
}

impl DiscrepancyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::None => "none",
            DiscrepancyType::Shortage => "shortage",
            DiscrepancyType::Excess => "excess",
            DiscrepancyType::Damage => "damage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DiscrepancyType::None),
            "shortage" => Some(DiscrepancyType::Shortage),
            "excess" => Some(DiscrepancyType::Excess),
            "damage" => Some(DiscrepancyType::Damage),
            _ => None,
        }
    }
}

/// Quantities and damage flag for one inspected line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscrepancyInput {
    pub assigned_quantity: i64,
    pub confirmed_quantity: i64,
    pub received_quantity: i64,
    pub damage_reported: bool,
}

/// Classification outcome for one inspected line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyResult {
    pub discrepancy_type: DiscrepancyType,
    /// `received − confirmed`; negative for shortages
    pub discrepancy_quantity: i64,
    /// `|discrepancy| / confirmed × 100`, 0 when nothing was confirmed
    pub discrepancy_percentage: Decimal,
}

/// Classify the deviation between confirmed and received quantities
///
/// Damage takes precedence over any quantity outcome: a damaged delivery is
/// independently actionable even when the count matches exactly.
pub fn classify_discrepancy(input: &DiscrepancyInput) -> DiscrepancyResult {
    let discrepancy_quantity = input.received_quantity - input.confirmed_quantity;

    let discrepancy_percentage = if input.confirmed_quantity == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(discrepancy_quantity.abs()) / Decimal::from(input.confirmed_quantity)
            * Decimal::from(100))
        .round_dp(2)
    };

    let discrepancy_type = if input.damage_reported {
        DiscrepancyType::Damage
    } else if discrepancy_quantity < 0 {
        DiscrepancyType::Shortage
    } else if discrepancy_quantity > 0 {
        DiscrepancyType::Excess
    } else {
        DiscrepancyType::None
    };

    DiscrepancyResult {
        discrepancy_type,
        discrepancy_quantity,
        discrepancy_percentage,
    }
}

/// Derive the status of one inspected line
///
/// Priority, highest first: damage, shortage, excess, clean.
pub fn grn_item_status(damage_reported: bool, discrepancy_quantity: i64) -> GrnItemStatus {
    if damage_reported {
        GrnItemStatus::DamageReported
    } else if discrepancy_quantity < 0 {
        GrnItemStatus::ShortageReported
    } else if discrepancy_quantity > 0 {
        GrnItemStatus::ExcessReceived
    } else {
        GrnItemStatus::VerifiedOk
    }
}

/// Fold item statuses into the aggregate GRN status
///
/// All clean means verified-ok, none clean means verified-mismatch, a mix
/// means partially-verified. The aggregate is never set independently of
/// the item statuses.
pub fn grn_aggregate_status(items: &[GrnItemStatus]) -> GrnStatus {
    let clean = items.iter().filter(|s| s.is_clean()).count();
    if clean == items.len() {
        GrnStatus::VerifiedOk
    } else if clean == 0 {
        GrnStatus::VerifiedMismatch
    } else {
        GrnStatus::PartiallyVerified
    }
}

/// One inspection event tied to exactly one dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodsReceiptNote {
    pub id: Uuid,
    pub receipt_number: String,
    pub dispatch_id: Uuid,
    pub status: GrnStatus,
    pub receipt_date: NaiveDate,
    pub received_by: Uuid,
    pub remarks: Option<String>,
    pub remarks_th: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One inspected line of a goods receipt note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrnItem {
    pub id: Uuid,
    pub grn_id: Uuid,
    pub dispatch_item_id: Uuid,
    pub received_quantity: i64,
    pub discrepancy_quantity: i64,
    pub discrepancy_percentage: Decimal,
    pub damage_reported: bool,
    pub damage_description: Option<String>,
    pub item_remarks: Option<String>,
    pub status: GrnItemStatus,
}

/// Verification summary returned alongside a created GRN
#[derive(Debug, Clone, Serialize)]
pub struct GrnSummary {
    pub discrepancies_found: bool,
    pub total_items_verified: usize,
    pub items_with_discrepancy: usize,
}

impl GrnSummary {
    pub fn from_items(items: &[GrnItem]) -> Self {
        let items_with_discrepancy = items.iter().filter(|i| !i.status.is_clean()).count();
        GrnSummary {
            discrepancies_found: items_with_discrepancy > 0,
            total_items_verified: items.len(),
            items_with_discrepancy,
        }
    }
}

/// GRN with its ordered items and verification summary
#[derive(Debug, Clone, Serialize)]
pub struct GrnWithItems {
    #[serde(flatten)]
    pub grn: GoodsReceiptNote,
    pub items: Vec<GrnItem>,
    pub summary: GrnSummary,
}
