//! Tiered constraint registry.
//!
//! A static catalog of every rule the engine knows, keyed by
//! [`ConstraintId`]. Each definition carries a tier (1 = must never be
//! violated, 2 = should be satisfied, 3 = optimize-only), a numeric
//! priority used only to break ties within a tier, a hardness flag, a
//! severity label, and a scoring penalty weight.
//!
//! The registry is a pure lookup table: it has no search logic and
//! never mutates a schedule.
//!
//! # Ordering
//! Tier is the primary sort key; the numeric priority is strictly an
//! intra-tier tiebreak. The numeric values do NOT form a global order —
//! entries in different tiers may share a priority number.

use serde::{Deserialize, Serialize};

use crate::models::Severity;

/// Identifier of a constraint definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintId {
    /// Every staff member works on a MUST_WORK date.
    CalendarMustWork,
    /// Every staff member rests on a MUST_DAY_OFF date.
    CalendarMustDayOff,
    /// EARLY requires per-date permission.
    EarlyEligibility,
    /// EARLY never directly adjacent to OFF or another EARLY.
    EarlyAdjacency,
    /// At most 6 consecutive working days.
    MaxConsecutiveWork,
    /// At least one rest day in every trailing 5-day window.
    RestWindow,
    /// Rolling 7-day cap on OFF/EARLY/LATE counts.
    WeeklyShiftCap,
    /// Calendar-month cap on OFF/EARLY/LATE counts.
    MonthlyShiftCap,
    /// At most one conflict-group member OFF/EARLY per date.
    ConflictGroup,
    /// Minimum total staff working per date.
    MinStaffing,
    /// Dynamic priority-rule compliance.
    PreferenceRules,
    /// Per-staff workload within the fairness band.
    FairnessBand,
    /// LATE shifts spread across staff rather than clustered.
    LateDistribution,
    /// Overall workload variance minimized.
    WorkloadBalance,
    /// Daily coverage close to the staffing target.
    CoverageEfficiency,
}

impl ConstraintId {
    /// Stable string form, used in change logs and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintId::CalendarMustWork => "calendar-must-work",
            ConstraintId::CalendarMustDayOff => "calendar-must-day-off",
            ConstraintId::EarlyEligibility => "early-eligibility",
            ConstraintId::EarlyAdjacency => "early-adjacency",
            ConstraintId::MaxConsecutiveWork => "max-consecutive-work",
            ConstraintId::RestWindow => "rest-window",
            ConstraintId::WeeklyShiftCap => "weekly-shift-cap",
            ConstraintId::MonthlyShiftCap => "monthly-shift-cap",
            ConstraintId::ConflictGroup => "conflict-group",
            ConstraintId::MinStaffing => "min-staffing",
            ConstraintId::PreferenceRules => "preference-rules",
            ConstraintId::FairnessBand => "fairness-band",
            ConstraintId::LateDistribution => "late-distribution",
            ConstraintId::WorkloadBalance => "workload-balance",
            ConstraintId::CoverageEfficiency => "coverage-efficiency",
        }
    }
}

impl std::fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope a constraint applies at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintScope {
    /// One staff member's cells.
    Individual,
    /// A named group of staff.
    Group,
    /// The whole roster/date grid.
    Global,
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDef {
    /// Constraint identifier.
    pub id: ConstraintId,
    /// Priority class: 1 never violated, 2 should hold, 3 optimize-only.
    pub tier: u8,
    /// Intra-tier tiebreak; lower wins. Not globally ordered across tiers.
    pub priority: u8,
    /// Whether search must treat this as a hard filter.
    pub hard: bool,
    /// Severity label for violations of this constraint.
    pub severity: Severity,
    /// Scope the constraint applies at.
    pub scope: ConstraintScope,
    /// Score penalty subtracted per violation.
    pub penalty_weight: f64,
}

/// Catalog of all constraint definitions for one request.
///
/// Loaded once per request and treated as read-only for its duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintRegistry {
    defs: Vec<ConstraintDef>,
}

impl ConstraintRegistry {
    /// Builds the standard registry.
    pub fn standard() -> Self {
        use ConstraintId::*;
        use ConstraintScope::*;
        let defs = vec![
            // Tier 1
            def(CalendarMustWork, 1, 1, Severity::Critical, Global, 100.0),
            def(CalendarMustDayOff, 1, 2, Severity::Critical, Global, 100.0),
            def(EarlyEligibility, 1, 3, Severity::Critical, Individual, 80.0),
            def(EarlyAdjacency, 1, 4, Severity::Critical, Individual, 60.0),
            def(MaxConsecutiveWork, 1, 5, Severity::Critical, Individual, 60.0),
            def(RestWindow, 1, 6, Severity::Critical, Individual, 50.0),
            def(WeeklyShiftCap, 1, 7, Severity::High, Individual, 40.0),
            // Priority 8 reappears in tier 2; tier remains the primary key.
            def(MonthlyShiftCap, 1, 8, Severity::High, Individual, 40.0),
            def(ConflictGroup, 1, 9, Severity::Critical, Group, 50.0),
            def(MinStaffing, 1, 10, Severity::Critical, Global, 70.0),
            // Tier 2
            soft(PreferenceRules, 2, 8, Severity::Medium, Individual, 10.0),
            soft(FairnessBand, 2, 11, Severity::Medium, Individual, 8.0),
            soft(LateDistribution, 2, 12, Severity::Low, Group, 5.0),
            // Tier 3
            soft(WorkloadBalance, 3, 20, Severity::Low, Global, 3.0),
            soft(CoverageEfficiency, 3, 21, Severity::Low, Global, 3.0),
        ];
        Self { defs }
    }

    /// Looks up a definition.
    pub fn definition(&self, id: ConstraintId) -> Option<&ConstraintDef> {
        self.defs.iter().find(|d| d.id == id)
    }

    /// All definitions of a tier, in priority order.
    pub fn by_tier(&self, tier: u8) -> Vec<&ConstraintDef> {
        let mut out: Vec<_> = self.defs.iter().filter(|d| d.tier == tier).collect();
        out.sort_by_key(|d| d.priority);
        out
    }

    /// Resolves precedence between two constraints.
    ///
    /// Tier takes precedence over numeric priority; within a tier the
    /// lower priority number wins. `Ordering::Less` means `a` outranks `b`.
    pub fn compare(&self, a: ConstraintId, b: ConstraintId) -> std::cmp::Ordering {
        let da = self.definition(a);
        let db = self.definition(b);
        match (da, db) {
            (Some(da), Some(db)) => da
                .tier
                .cmp(&db.tier)
                .then(da.priority.cmp(&db.priority)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    }

    /// Severity for violations of a constraint. Unknown ids are `Medium`.
    pub fn severity(&self, id: ConstraintId) -> Severity {
        self.definition(id).map(|d| d.severity).unwrap_or(Severity::Medium)
    }

    /// Score penalty per violation. Unknown ids cost nothing.
    pub fn penalty(&self, id: ConstraintId) -> f64 {
        self.definition(id).map(|d| d.penalty_weight).unwrap_or(0.0)
    }

    /// Whether the constraint may ever be overridden.
    ///
    /// Tier-1 constraints: never.
    pub fn is_overridable(&self, id: ConstraintId) -> bool {
        self.definition(id).map(|d| d.tier > 1).unwrap_or(true)
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn def(
    id: ConstraintId,
    tier: u8,
    priority: u8,
    severity: Severity,
    scope: ConstraintScope,
    penalty_weight: f64,
) -> ConstraintDef {
    ConstraintDef {
        id,
        tier,
        priority,
        hard: true,
        severity,
        scope,
        penalty_weight,
    }
}

fn soft(
    id: ConstraintId,
    tier: u8,
    priority: u8,
    severity: Severity,
    scope: ConstraintScope,
    penalty_weight: f64,
) -> ConstraintDef {
    ConstraintDef {
        hard: false,
        ..def(id, tier, priority, severity, scope, penalty_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_tier_one_listing() {
        let reg = ConstraintRegistry::standard();
        let t1 = reg.by_tier(1);
        assert_eq!(t1.len(), 10);
        assert!(t1.iter().all(|d| d.hard && d.tier == 1));
        // Sorted by priority
        assert!(t1.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn test_tier_outranks_priority_number() {
        let reg = ConstraintRegistry::standard();
        // MonthlyShiftCap (tier 1, prio 8) vs PreferenceRules (tier 2, prio 8):
        // identical numbers, tier decides.
        assert_eq!(
            reg.compare(ConstraintId::MonthlyShiftCap, ConstraintId::PreferenceRules),
            Ordering::Less
        );
        // Tier 1 prio 10 still outranks tier 2 prio 8.
        assert_eq!(
            reg.compare(ConstraintId::MinStaffing, ConstraintId::PreferenceRules),
            Ordering::Less
        );
    }

    #[test]
    fn test_intra_tier_priority_tiebreak() {
        let reg = ConstraintRegistry::standard();
        assert_eq!(
            reg.compare(ConstraintId::CalendarMustWork, ConstraintId::CalendarMustDayOff),
            Ordering::Less
        );
    }

    #[test]
    fn test_overridable() {
        let reg = ConstraintRegistry::standard();
        assert!(!reg.is_overridable(ConstraintId::CalendarMustWork));
        assert!(!reg.is_overridable(ConstraintId::MinStaffing));
        assert!(reg.is_overridable(ConstraintId::PreferenceRules));
        assert!(reg.is_overridable(ConstraintId::WorkloadBalance));
    }

    #[test]
    fn test_severity_and_penalty() {
        let reg = ConstraintRegistry::standard();
        assert_eq!(reg.severity(ConstraintId::CalendarMustWork), Severity::Critical);
        assert!(reg.penalty(ConstraintId::CalendarMustWork) > reg.penalty(ConstraintId::PreferenceRules));
    }
}
