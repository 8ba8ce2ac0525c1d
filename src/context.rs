//! Per-request generation context.
//!
//! Bundles the read-only inputs of one generation run: roster, date
//! range, calendar rules, early-shift permissions, configuration, and
//! the constraint registry. Built once per request and passed by
//! reference into every component; nothing here is mutated after
//! construction, so concurrent requests cannot observe each other.

use chrono::{Datelike, NaiveDate};

use crate::config::{EarlyPermissions, EngineConfig};
use crate::constraints::ConstraintRegistry;
use crate::models::{CalendarRules, Staff};

/// Read-only inputs of one generation run.
#[derive(Debug, Clone)]
pub struct EngineContext {
    /// Ordered staff roster.
    pub roster: Vec<Staff>,
    /// Staff ids, in roster order.
    pub staff_ids: Vec<String>,
    /// Ordered, inclusive date range.
    pub dates: Vec<NaiveDate>,
    /// Calendar-mandated rules.
    pub calendar: CalendarRules,
    /// Early-shift permissions.
    pub permissions: EarlyPermissions,
    /// Engine configuration snapshot.
    pub config: EngineConfig,
    /// Constraint catalog.
    pub registry: ConstraintRegistry,
}

impl EngineContext {
    /// Builds a context from request inputs.
    pub fn new(
        roster: Vec<Staff>,
        dates: Vec<NaiveDate>,
        calendar: CalendarRules,
        permissions: EarlyPermissions,
        mut config: EngineConfig,
    ) -> Self {
        let staff_ids = roster.iter().map(|s| s.id.clone()).collect();
        // Staff-declared group memberships merge into the configured
        // conflict groups, so every downstream check sees one member list.
        for group in &mut config.conflict_groups {
            for staff in &roster {
                if staff.groups.iter().any(|g| *g == group.name)
                    && !group.members.contains(&staff.id)
                {
                    group.members.push(staff.id.clone());
                }
            }
        }
        Self {
            roster,
            staff_ids,
            dates,
            calendar,
            permissions,
            config,
            registry: ConstraintRegistry::standard(),
        }
    }

    /// Looks up a staff member by id.
    pub fn staff(&self, id: &str) -> Option<&Staff> {
        self.roster.iter().find(|s| s.id == id)
    }

    /// Whether the staff member may receive EARLY on the date.
    ///
    /// Requires both an eligible employment class and a per-date
    /// permission grant.
    pub fn can_early(&self, staff_id: &str, date: NaiveDate) -> bool {
        self.staff(staff_id)
            .map(|s| s.class_allows_early())
            .unwrap_or(false)
            && self.permissions.allows(staff_id, date)
    }

    /// Dates of the range that fall in the same calendar month as `date`.
    pub fn month_dates(&self, date: NaiveDate) -> Vec<NaiveDate> {
        self.dates
            .iter()
            .copied()
            .filter(|d| d.year() == date.year() && d.month() == date.month())
            .collect()
    }

    /// Index of `date` within the range, if present.
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }

    /// Conflict groups that contain the staff member.
    pub fn conflict_groups_of(&self, staff_id: &str) -> Vec<&crate::config::ConflictGroup> {
        self.config
            .conflict_groups
            .iter()
            .filter(|g| g.members.iter().any(|m| m == staff_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictGroup;
    use crate::models::{date_range, EmploymentClass};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn ctx() -> EngineContext {
        let dates = date_range(day(1), day(7));
        let roster = vec![
            Staff::new("alice"),
            Staff::new("carl").with_class(EmploymentClass::Contract),
        ];
        let perms = EarlyPermissions::new()
            .grant("alice", day(3))
            .grant("carl", day(3));
        let config = EngineConfig::new()
            .with_conflict_group(ConflictGroup::new("g", vec!["alice".into()]));
        EngineContext::new(roster, dates, CalendarRules::new(), perms, config)
    }

    #[test]
    fn test_can_early_needs_class_and_permission() {
        let ctx = ctx();
        assert!(ctx.can_early("alice", day(3)));
        assert!(!ctx.can_early("alice", day(4))); // No grant
        assert!(!ctx.can_early("carl", day(3))); // Contract class
        assert!(!ctx.can_early("ghost", day(3))); // Unknown staff
    }

    #[test]
    fn test_month_dates() {
        let ctx = ctx();
        assert_eq!(ctx.month_dates(day(4)).len(), 7);
    }

    #[test]
    fn test_conflict_groups_of() {
        let ctx = ctx();
        assert_eq!(ctx.conflict_groups_of("alice").len(), 1);
        assert!(ctx.conflict_groups_of("carl").is_empty());
    }

    #[test]
    fn test_staff_declared_groups_merge_into_config() {
        let dates = date_range(day(1), day(7));
        let roster = vec![
            Staff::new("alice"),
            Staff::new("dana").with_group("g"),
        ];
        let config = EngineConfig::new()
            .with_conflict_group(ConflictGroup::new("g", vec!["alice".into()]));
        let ctx = EngineContext::new(
            roster,
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            config,
        );
        let groups = ctx.conflict_groups_of("dana");
        assert_eq!(groups.len(), 1);
        assert!(groups[0].members.contains(&"dana".to_string()));
    }
}
