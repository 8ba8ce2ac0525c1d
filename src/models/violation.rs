//! Constraint violation model.
//!
//! A violation records a concrete breach of one constraint definition:
//! which cell, what the schedule holds, what the constraint expects,
//! and how severe the breach is. Violations drive both scoring
//! penalties and the repair engine's corrective edits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::symbol::ShiftSymbol;
use crate::constraints::ConstraintId;

/// Severity label for a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    /// Tier-1 breach; never silently accepted.
    Critical,
}

/// A detected breach of a constraint definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Breached constraint.
    pub constraint: ConstraintId,
    /// Affected staff member.
    pub staff: String,
    /// Affected date.
    pub date: NaiveDate,
    /// Symbol currently in the schedule.
    pub found: ShiftSymbol,
    /// Symbol the constraint expects, when a single correction exists.
    pub expected: Option<ShiftSymbol>,
    /// Severity of the breach.
    pub severity: Severity,
    /// Human-readable evidence.
    pub message: String,
}

impl Violation {
    /// Creates a violation with a single known correction.
    pub fn with_expected(
        constraint: ConstraintId,
        staff: impl Into<String>,
        date: NaiveDate,
        found: ShiftSymbol,
        expected: ShiftSymbol,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            constraint,
            staff: staff.into(),
            date,
            found,
            expected: Some(expected),
            severity,
            message: message.into(),
        }
    }

    /// Creates a violation without a single-cell correction.
    pub fn observed(
        constraint: ConstraintId,
        staff: impl Into<String>,
        date: NaiveDate,
        found: ShiftSymbol,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            constraint,
            staff: staff.into(),
            date,
            found,
            expected: None,
            severity,
            message: message.into(),
        }
    }
}
