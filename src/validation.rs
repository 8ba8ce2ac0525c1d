//! Input validation for generation requests.
//!
//! Checks structural integrity of the roster, date range, calendar,
//! permissions, and configuration before any search begins. Detects:
//! - Duplicate staff IDs
//! - Empty roster or date range
//! - Unordered date ranges
//! - Conflict groups, permissions, or priority rules referencing
//!   unknown staff
//! - Non-positive search budgets
//!
//! Calendar rules dated outside the requested range are not errors:
//! the locker skips them, so they are only logged at warn level.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;

use crate::config::{EarlyPermissions, EngineConfig, RuleCondition};
use crate::models::{CalendarRules, Staff};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two staff members share the same ID.
    DuplicateId,
    /// The roster has no staff.
    EmptyRoster,
    /// The date range has no dates.
    EmptyDateRange,
    /// Dates are not in ascending order.
    UnorderedDateRange,
    /// Configuration references a staff ID that is not in the roster.
    UnknownStaffReference,
    /// The search budget cannot drive any iterations.
    InvalidBudget,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the inputs of a generation request.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    roster: &[Staff],
    dates: &[NaiveDate],
    calendar: &CalendarRules,
    permissions: &EarlyPermissions,
    config: &EngineConfig,
) -> ValidationResult {
    let mut errors = Vec::new();

    if roster.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "roster is empty",
        ));
    }
    if dates.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyDateRange,
            "date range is empty",
        ));
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnorderedDateRange,
            "date range is not strictly ascending",
        ));
    }

    let mut ids = HashSet::new();
    for staff in roster {
        if !ids.insert(staff.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate staff ID: {}", staff.id),
            ));
        }
    }

    for group in &config.conflict_groups {
        for member in &group.members {
            if !ids.contains(member.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStaffReference,
                    format!("conflict group '{}' references unknown staff '{member}'", group.name),
                ));
            }
        }
    }

    for staff in permissions.staff_ids() {
        if !ids.contains(staff) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownStaffReference,
                format!("early permission references unknown staff '{staff}'"),
            ));
        }
    }

    for (date, _) in calendar.iter() {
        if !dates.contains(&date) {
            warn!(%date, "calendar rule outside the requested range; ignored");
        }
    }

    for rule in &config.priority_rules {
        let referenced: Vec<&String> = match &rule.condition {
            RuleCondition::FixedAssignment { staff, .. } => vec![staff],
            RuleCondition::WeekdaySymbol { staff, .. } => staff.iter().collect(),
            RuleCondition::GroupDailyLimit { members, .. } => members.iter().collect(),
        };
        for staff in referenced {
            if !ids.contains(staff.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStaffReference,
                    format!("priority rule '{}' references unknown staff '{staff}'", rule.id),
                ));
            }
        }
    }

    if config.budget.max_iterations == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidBudget,
            "max_iterations must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConflictGroup, PriorityRule};
    use crate::models::{date_range, CalendarRule, ShiftSymbol};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn sample_roster() -> Vec<Staff> {
        vec![Staff::new("alice"), Staff::new("bob")]
    }

    fn check(roster: &[Staff], dates: &[NaiveDate], config: &EngineConfig) -> ValidationResult {
        validate_input(
            roster,
            dates,
            &CalendarRules::new(),
            &EarlyPermissions::new(),
            config,
        )
    }

    #[test]
    fn test_valid_input() {
        let dates = date_range(day(1), day(7));
        assert!(check(&sample_roster(), &dates, &EngineConfig::new()).is_ok());
    }

    #[test]
    fn test_empty_roster() {
        let dates = date_range(day(1), day(7));
        let errors = check(&[], &dates, &EngineConfig::new()).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyRoster));
    }

    #[test]
    fn test_empty_dates() {
        let errors = check(&sample_roster(), &[], &EngineConfig::new()).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::EmptyDateRange));
    }

    #[test]
    fn test_duplicate_staff_id() {
        let roster = vec![Staff::new("x"), Staff::new("x")];
        let dates = date_range(day(1), day(7));
        let errors = check(&roster, &dates, &EngineConfig::new()).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_unordered_dates() {
        let dates = vec![day(3), day(2)];
        let errors = check(&sample_roster(), &dates, &EngineConfig::new()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnorderedDateRange));
    }

    #[test]
    fn test_unknown_conflict_group_member() {
        let dates = date_range(day(1), day(7));
        let config = EngineConfig::new()
            .with_conflict_group(ConflictGroup::new("g", vec!["alice".into(), "ghost".into()]));
        let errors = check(&sample_roster(), &dates, &config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownStaffReference
                && e.message.contains("ghost")));
    }

    #[test]
    fn test_unknown_priority_rule_staff() {
        let dates = date_range(day(1), day(7));
        let config = EngineConfig::new().with_priority_rule(PriorityRule {
            id: "r1".into(),
            priority: 1,
            condition: RuleCondition::FixedAssignment {
                staff: "ghost".into(),
                date: day(2),
                symbol: ShiftSymbol::Off,
            },
        });
        let errors = check(&sample_roster(), &dates, &config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownStaffReference));
    }

    #[test]
    fn test_zero_budget() {
        let dates = date_range(day(1), day(7));
        let mut config = EngineConfig::new();
        config.budget.max_iterations = 0;
        let errors = check(&sample_roster(), &dates, &config).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidBudget));
    }

    #[test]
    fn test_unknown_permission_staff() {
        let dates = date_range(day(1), day(7));
        let perms = EarlyPermissions::new()
            .grant("alice", day(2))
            .grant("ghost", day(3));
        let errors = validate_input(
            &sample_roster(),
            &dates,
            &CalendarRules::new(),
            &perms,
            &EngineConfig::new(),
        )
        .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownStaffReference
                && e.message.contains("ghost")));
    }

    #[test]
    fn test_out_of_range_calendar_rule_is_not_an_error() {
        let dates = date_range(day(1), day(7));
        let calendar = CalendarRules::new().with_rule(day(20), CalendarRule::MustWork);
        assert!(validate_input(
            &sample_roster(),
            &dates,
            &calendar,
            &EarlyPermissions::new(),
            &EngineConfig::new(),
        )
        .is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let roster = vec![Staff::new("x"), Staff::new("x")];
        let errors = check(&roster, &[], &EngineConfig::new()).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
