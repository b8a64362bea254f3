//! Typed query predicates for assignment history
//!
//! Metric queries filter the assignment history in several combinations.
//! Instead of assembling WHERE fragments at every call site, callers build
//! an [`AssignmentFilter`] from typed predicates; `push_where` is the single
//! adapter that translates predicates into SQL.

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use shared::{AssignmentStatus, DateRange};

/// One predicate over the assignment history
#[derive(Debug, Clone)]
pub enum AssignmentPredicate {
    VendorId(Uuid),
    AssignedBetween(NaiveDate, NaiveDate),
    StatusIn(Vec<AssignmentStatus>),
}

/// Composable filter over assignments
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    predicates: Vec<AssignmentPredicate>,
}

impl AssignmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor(mut self, vendor_id: Uuid) -> Self {
        self.predicates.push(AssignmentPredicate::VendorId(vendor_id));
        self
    }

    pub fn assigned_between(mut self, range: DateRange) -> Self {
        self.predicates
            .push(AssignmentPredicate::AssignedBetween(range.start, range.end));
        self
    }

    pub fn with_statuses(mut self, statuses: &[AssignmentStatus]) -> Self {
        self.predicates
            .push(AssignmentPredicate::StatusIn(statuses.to_vec()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Translate the predicates into a WHERE clause on `alias`
    ///
    /// This is the only place predicates become SQL.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>, alias: &str) {
        if self.predicates.is_empty() {
            return;
        }

        builder.push(" WHERE ");
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                builder.push(" AND ");
            }
            match predicate {
                AssignmentPredicate::VendorId(vendor_id) => {
                    builder.push(format!("{}.vendor_id = ", alias));
                    builder.push_bind(*vendor_id);
                }
                AssignmentPredicate::AssignedBetween(start, end) => {
                    builder.push(format!("{}.assigned_at::date BETWEEN ", alias));
                    builder.push_bind(*start);
                    builder.push(" AND ");
                    builder.push_bind(*end);
                }
                AssignmentPredicate::StatusIn(statuses) => {
                    let raw: Vec<String> =
                        statuses.iter().map(|s| s.as_str().to_string()).collect();
                    builder.push(format!("{}.status = ANY(", alias));
                    builder.push_bind(raw);
                    builder.push(")");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_adds_no_clause() {
        let filter = AssignmentFilter::new();
        let mut builder = QueryBuilder::new("SELECT 1 FROM assignments a");
        filter.push_where(&mut builder, "a");
        assert_eq!(builder.sql(), "SELECT 1 FROM assignments a");
    }

    #[test]
    fn predicates_join_with_and() {
        let filter = AssignmentFilter::new()
            .vendor(Uuid::nil())
            .with_statuses(&[AssignmentStatus::Completed]);
        let mut builder = QueryBuilder::new("SELECT 1 FROM assignments a");
        filter.push_where(&mut builder, "a");
        let sql = builder.sql();
        assert!(sql.contains("WHERE a.vendor_id = "));
        assert!(sql.contains(" AND a.status = ANY("));
    }
}
