//! Composite schedule scoring.
//!
//! Pure, deterministic quality function: two calls on identical inputs
//! return identical results, which the search loops rely on for
//! reproducible ranking.
//!
//! The total starts at 100 and subtracts weighted penalties: tier-1
//! violations cost their registry penalty weight each (heaviest),
//! unsatisfied priority rules cost the tier-2 preference weight, and
//! fairness/efficiency deficits subtract proportionally. The result is
//! clamped to 0..=100, so removing a violation never lowers the score.

use serde::{Deserialize, Serialize};

use crate::config::RuleCondition;
use crate::constraints::checks;
use crate::constraints::ConstraintId;
use crate::context::EngineContext;
use crate::models::{LockedCells, Schedule, ShiftSymbol};

/// Per-objective subscores, each 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Constraint satisfaction (tier-1 and tier-2 penalties applied).
    pub constraint: f64,
    /// Workload-distribution fairness.
    pub fairness: f64,
    /// Priority-rule (preference) satisfaction.
    pub preference: f64,
    /// Coverage vs. target staffing.
    pub efficiency: f64,
}

/// Scoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Composite quality, 0..=100.
    pub total: f64,
    /// Sum of constraint penalties subtracted.
    pub penalty: f64,
    /// Number of tier-1 violations found.
    pub tier1_count: usize,
    /// Per-objective subscores.
    pub breakdown: ScoreBreakdown,
}

/// Weights applied when folding the breakdown into the total.
const FAIRNESS_DEFICIT_WEIGHT: f64 = 0.2;
const EFFICIENCY_DEFICIT_WEIGHT: f64 = 0.1;

/// Scores a schedule against its generation context.
pub fn score(schedule: &Schedule, ctx: &EngineContext) -> ScoreReport {
    // Keeper choice inside conflict detection does not affect the
    // violation count, so an empty lock set keeps this function pure.
    let tier1 = checks::all_tier1(schedule, ctx, &LockedCells::new());
    let tier1_penalty: f64 = tier1.iter().map(|v| ctx.registry.penalty(v.constraint)).sum();

    let (satisfied, rule_total) = preference_satisfaction(schedule, ctx);
    let unsatisfied = rule_total - satisfied;
    let tier2_penalty = unsatisfied as f64 * ctx.registry.penalty(ConstraintId::PreferenceRules);

    let penalty = tier1_penalty + tier2_penalty;
    let fairness = fairness_score(schedule, ctx);
    let preference = if rule_total == 0 {
        100.0
    } else {
        100.0 * satisfied as f64 / rule_total as f64
    };
    let efficiency = efficiency_score(schedule, ctx);

    let total = (100.0
        - penalty
        - FAIRNESS_DEFICIT_WEIGHT * (100.0 - fairness)
        - EFFICIENCY_DEFICIT_WEIGHT * (100.0 - efficiency))
        .clamp(0.0, 100.0);

    ScoreReport {
        total,
        penalty,
        tier1_count: tier1.len(),
        breakdown: ScoreBreakdown {
            constraint: (100.0 - penalty).clamp(0.0, 100.0),
            fairness,
            preference,
            efficiency,
        },
    }
}

/// Fairness: 100 minus a multiple of the standard deviation of
/// per-staff workload ratios (working days / range length).
pub fn fairness_score(schedule: &Schedule, ctx: &EngineContext) -> f64 {
    if ctx.staff_ids.len() < 2 || ctx.dates.is_empty() {
        return 100.0;
    }
    let n = ctx.dates.len() as f64;
    let ratios: Vec<f64> = ctx
        .staff_ids
        .iter()
        .map(|s| {
            ctx.dates
                .iter()
                .filter(|d| schedule.get(s, **d).is_working())
                .count() as f64
                / n
        })
        .collect();
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let variance = ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / ratios.len() as f64;
    (100.0 - 250.0 * variance.sqrt()).clamp(0.0, 100.0)
}

/// Coverage vs. the minimum-staffing target, averaged over dates.
pub fn efficiency_score(schedule: &Schedule, ctx: &EngineContext) -> f64 {
    let target = ctx.config.min_staff_per_day;
    if target == 0 || ctx.dates.is_empty() {
        return 100.0;
    }
    let sum: f64 = ctx
        .dates
        .iter()
        .map(|&d| {
            let covered = schedule.working_count(&ctx.staff_ids, d) + ctx.config.backup_count(d);
            (covered as f64 / target as f64).min(1.0)
        })
        .sum();
    100.0 * sum / ctx.dates.len() as f64
}

/// Counts (satisfied, total) priority rules.
pub fn preference_satisfaction(schedule: &Schedule, ctx: &EngineContext) -> (usize, usize) {
    let rules = &ctx.config.priority_rules;
    let satisfied = rules
        .iter()
        .filter(|r| rule_satisfied(schedule, ctx, &r.condition))
        .count();
    (satisfied, rules.len())
}

pub(crate) fn rule_satisfied(
    schedule: &Schedule,
    ctx: &EngineContext,
    condition: &RuleCondition,
) -> bool {
    match condition {
        RuleCondition::FixedAssignment { staff, date, symbol } => {
            schedule.get(staff, *date) == *symbol
        }
        RuleCondition::WeekdaySymbol { staff, weekday, symbol } => {
            let days = ctx
                .dates
                .iter()
                .filter(|d| chrono::Datelike::weekday(*d) == *weekday);
            match staff {
                // Scoped: the member holds the symbol on every such
                // weekday. No such weekday in range = vacuously satisfied.
                Some(staff) => {
                    for d in days {
                        if schedule.get(staff, *d) != *symbol {
                            return false;
                        }
                    }
                    true
                }
                // Unscoped: someone holds the symbol on each such weekday.
                None => days
                    .map(|d| ctx.staff_ids.iter().any(|s| schedule.get(s, *d) == *symbol))
                    .all(|ok| ok),
            }
        }
        RuleCondition::GroupDailyLimit { members, symbol, max } => ctx.dates.iter().all(|&d| {
            members.iter().filter(|m| schedule.get(m, d) == *symbol).count() <= *max
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EarlyPermissions, EngineConfig, PriorityRule};
    use crate::models::{date_range, CalendarRule, CalendarRules, Staff};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn ctx() -> EngineContext {
        let dates = date_range(day(1), day(14));
        EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            EngineConfig::new(),
        )
    }

    fn clean_schedule(ctx: &EngineContext) -> Schedule {
        let mut s = Schedule::new();
        for (i, &d) in ctx.dates.iter().enumerate() {
            if i % 4 == 2 {
                s.set("alice", d, ShiftSymbol::Off);
            }
            if i % 4 == 0 {
                s.set("bob", d, ShiftSymbol::Off);
            }
        }
        s
    }

    #[test]
    fn test_deterministic() {
        let ctx = ctx();
        let s = clean_schedule(&ctx);
        assert_eq!(score(&s, &ctx), score(&s, &ctx));
    }

    #[test]
    fn test_clean_schedule_scores_high() {
        let ctx = ctx();
        let s = clean_schedule(&ctx);
        let report = score(&s, &ctx);
        assert_eq!(report.tier1_count, 0);
        assert!(report.total > 90.0, "total {}", report.total);
    }

    #[test]
    fn test_tier1_violation_lowers_score() {
        let ctx = ctx();
        let clean = clean_schedule(&ctx);
        let mut dirty = clean.clone();
        // EARLY without permission
        dirty.set("alice", day(6), ShiftSymbol::Early);
        assert!(score(&dirty, &ctx).total < score(&clean, &ctx).total);
    }

    #[test]
    fn test_monotone_in_tier1_removals() {
        let ctx = ctx();
        let mut dirty = clean_schedule(&ctx);
        dirty.set("alice", day(6), ShiftSymbol::Early); // No permission
        dirty.set("bob", day(10), ShiftSymbol::Early); // No permission
        let two = score(&dirty, &ctx);

        let mut one_fixed = dirty.clone();
        one_fixed.set("bob", day(10), ShiftSymbol::Normal);
        let one = score(&one_fixed, &ctx);

        assert!(one.total >= two.total);
        assert!(one.tier1_count < two.tier1_count);
    }

    #[test]
    fn test_fairness_deviation_penalized() {
        let ctx = ctx();
        let balanced = clean_schedule(&ctx);
        // bob rests far more than alice
        let mut skewed = Schedule::new();
        for (i, &d) in ctx.dates.iter().enumerate() {
            if i % 4 == 2 {
                skewed.set("alice", d, ShiftSymbol::Off);
            }
            if i % 2 == 0 {
                skewed.set("bob", d, ShiftSymbol::Off);
            }
        }
        assert!(fairness_score(&skewed, &ctx) < fairness_score(&balanced, &ctx));
    }

    #[test]
    fn test_preference_unsatisfied_counts() {
        let dates = date_range(day(1), day(7));
        let config = EngineConfig::new().with_priority_rule(PriorityRule {
            id: "r1".into(),
            priority: 1,
            condition: RuleCondition::FixedAssignment {
                staff: "alice".into(),
                date: day(3),
                symbol: ShiftSymbol::Late,
            },
        });
        let ctx = EngineContext::new(
            vec![Staff::new("alice")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            config,
        );
        let s = Schedule::new();
        assert_eq!(preference_satisfaction(&s, &ctx), (0, 1));

        let mut satisfied = Schedule::new();
        satisfied.set("alice", day(3), ShiftSymbol::Late);
        assert_eq!(preference_satisfaction(&satisfied, &ctx), (1, 1));
    }

    #[test]
    fn test_efficiency_full_coverage() {
        let ctx = ctx();
        let s = clean_schedule(&ctx);
        // min_staff_per_day = 1 and someone works every day
        assert!((efficiency_score(&s, &ctx) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_counts_backup_staff() {
        let dates = date_range(day(1), day(3));
        let config = EngineConfig::new()
            .with_min_staff(1)
            .with_backup_staff(day(2), vec!["temp".into()]);
        let ctx = EngineContext::new(
            vec![Staff::new("alice")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            config,
        );
        let mut s = Schedule::new();
        s.set("alice", day(2), ShiftSymbol::Off);
        // Backup keeps day 2 covered
        assert!((efficiency_score(&s, &ctx) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_calendar_breach_heavily_penalized() {
        let dates = date_range(day(1), day(14));
        let calendar = CalendarRules::new().with_rule(day(3), CalendarRule::MustWork);
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            calendar,
            EarlyPermissions::new(),
            EngineConfig::new(),
        );
        let mut s = clean_schedule(&ctx);
        // alice rests on day 3 in clean_schedule (i=2); that now breaches MustWork
        s.set("bob", day(3), ShiftSymbol::Normal);
        let report = score(&s, &ctx);
        assert!(report.tier1_count >= 1);
        assert!(report.penalty >= 100.0);
    }
}
