//! Exception ticket models
//!
//! A ticket is opened when a goods receipt is not fully clean and is worked
//! through a fixed resolution workflow by the operations team.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket resolution workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }

    /// Validate a workflow transition; closed is terminal
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (InProgress, Resolved) | (Resolved, Closed) | (Open, Closed)
                | (InProgress, Closed)
        )
    }
}

/// Ticket priority derived from discrepancy severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TicketPriority::Low),
            "medium" => Some(TicketPriority::Medium),
            "high" => Some(TicketPriority::High),
            _ => None,
        }
    }
}

/// Severity inputs for priority derivation, one per non-clean GRN item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSeverityInput {
    pub damage_reported: bool,
    pub discrepancy_percentage: Decimal,
}

/// Derive ticket priority from the offending items
///
/// Damage, or a discrepancy at or beyond the escalation threshold, ranks
/// above a plain quantity mismatch. The threshold is a policy parameter
/// supplied by the caller.
pub fn derive_ticket_priority(
    items: &[TicketSeverityInput],
    escalation_percent: Decimal,
) -> TicketPriority {
    let escalated = items
        .iter()
        .any(|i| i.damage_reported || i.discrepancy_percentage >= escalation_percent);
    if escalated {
        TicketPriority::High
    } else {
        TicketPriority::Medium
    }
}

/// Exception record tracking a non-clean goods receipt to resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub ticket_number: String,
    pub grn_id: Uuid,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn closed_is_terminal() {
        assert!(!TicketStatus::Closed.can_transition_to(TicketStatus::Open));
        assert!(!TicketStatus::Closed.can_transition_to(TicketStatus::InProgress));
        assert!(!TicketStatus::Closed.can_transition_to(TicketStatus::Resolved));
        assert!(TicketStatus::Closed.is_terminal());
    }

    #[test]
    fn open_can_close_directly() {
        assert!(TicketStatus::Open.can_transition_to(TicketStatus::Closed));
        assert!(TicketStatus::InProgress.can_transition_to(TicketStatus::Closed));
    }

    #[test]
    fn resolved_cannot_reopen() {
        assert!(!TicketStatus::Resolved.can_transition_to(TicketStatus::Open));
        assert!(!TicketStatus::Resolved.can_transition_to(TicketStatus::InProgress));
    }

    #[test]
    fn damage_escalates_priority() {
        let items = [TicketSeverityInput {
            damage_reported: true,
            discrepancy_percentage: Decimal::ZERO,
        }];
        assert_eq!(derive_ticket_priority(&items, pct(20)), TicketPriority::High);
    }

    #[test]
    fn small_mismatch_stays_medium() {
        let items = [TicketSeverityInput {
            damage_reported: false,
            discrepancy_percentage: pct(5),
        }];
        assert_eq!(derive_ticket_priority(&items, pct(20)), TicketPriority::Medium);
    }

    #[test]
    fn threshold_is_inclusive() {
        let items = [TicketSeverityInput {
            damage_reported: false,
            discrepancy_percentage: pct(20),
        }];
        assert_eq!(derive_ticket_priority(&items, pct(20)), TicketPriority::High);
    }
}
