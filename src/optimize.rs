//! Soft-objective optimization of an already-legal roster.
//!
//! The optimizer takes a repaired schedule and hill-climbs a weighted
//! combination of the soft objectives (constraint margin, fairness,
//! preference satisfaction, coverage efficiency). Every candidate move
//! goes through the checked cell writer, so tier-1 legality and locked
//! cells are preserved by construction; the optimizer can only trade
//! between soft objectives, never break a hard rule.
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering" —
//! post-construction improvement by local search over soft penalties.

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

use crate::config::RuleCondition;
use crate::context::EngineContext;
use crate::generate::{perturb, CellWriter};
use crate::models::{LockedCells, Schedule, ShiftSymbol};
use crate::score::{self, ScoreBreakdown};

/// Named weighting of the four soft objectives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeightPreset {
    /// Equal weight on every objective.
    #[default]
    Balanced,
    /// Constraint margin above all else.
    ConstraintFocused,
    /// Fairness and preferences first.
    StaffFocused,
    /// Coverage efficiency first.
    BusinessFocused,
}

/// Objective weights, normalized when applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    pub constraint: f64,
    pub fairness: f64,
    pub preference: f64,
    pub efficiency: f64,
}

impl WeightPreset {
    /// The weight vector behind the preset.
    pub fn weights(self) -> ObjectiveWeights {
        match self {
            WeightPreset::Balanced => ObjectiveWeights {
                constraint: 1.0,
                fairness: 1.0,
                preference: 1.0,
                efficiency: 1.0,
            },
            WeightPreset::ConstraintFocused => ObjectiveWeights {
                constraint: 3.0,
                fairness: 0.5,
                preference: 0.5,
                efficiency: 1.0,
            },
            WeightPreset::StaffFocused => ObjectiveWeights {
                constraint: 1.0,
                fairness: 2.5,
                preference: 2.0,
                efficiency: 0.5,
            },
            WeightPreset::BusinessFocused => ObjectiveWeights {
                constraint: 1.0,
                fairness: 0.5,
                preference: 0.5,
                efficiency: 3.0,
            },
        }
    }
}

impl ObjectiveWeights {
    /// Weighted objective in 0..=100.
    pub fn apply(&self, breakdown: &ScoreBreakdown) -> f64 {
        let total = self.constraint + self.fairness + self.preference + self.efficiency;
        if total <= 0.0 {
            return 0.0;
        }
        (self.constraint * breakdown.constraint
            + self.fairness * breakdown.fairness
            + self.preference * breakdown.preference
            + self.efficiency * breakdown.efficiency)
            / total
    }
}

/// Optimization loop parameters.
#[derive(Debug, Clone)]
pub struct OptimizerParams {
    /// Maximum improvement rounds.
    pub rounds: usize,
    /// Rounds without an accepted move before giving up.
    pub patience: usize,
    /// Minimum objective gain for a move to be accepted.
    pub min_gain: f64,
    /// Apply a multi-cell shake every this many rounds.
    pub shake_every: usize,
    /// Cells flipped by a shake.
    pub shake_cells: usize,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            rounds: 40,
            patience: 8,
            min_gain: 0.01,
            shake_every: 10,
            shake_cells: 3,
        }
    }
}

/// One accepted improvement.
#[derive(Debug, Clone)]
pub struct ImprovementStep {
    /// Round in which the move was accepted.
    pub round: usize,
    /// Move kind.
    pub action: &'static str,
    /// Objective gain.
    pub gain: f64,
}

/// Result of one optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// The refined schedule.
    pub schedule: Schedule,
    /// Composite score before refinement.
    pub initial_score: f64,
    /// Composite score after refinement.
    pub final_score: f64,
    /// Weighted objective after refinement.
    pub objective: f64,
    /// Accepted moves, in order.
    pub improvements: Vec<ImprovementStep>,
    /// Advice for objectives still scoring poorly.
    pub recommendations: Vec<String>,
}

/// Subscore below which a recommendation is emitted.
const WEAK_OBJECTIVE: f64 = 60.0;

/// Soft-objective hill climber.
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    /// Objective weighting.
    pub preset: WeightPreset,
    /// Loop parameters.
    pub params: OptimizerParams,
}

impl Optimizer {
    pub fn new(preset: WeightPreset) -> Self {
        Self {
            preset,
            params: OptimizerParams::default(),
        }
    }

    /// Refines `schedule` under the preset's weighting.
    pub fn refine(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> OptimizationOutcome {
        let weights = self.preset.weights();
        let initial_report = score::score(schedule, ctx);
        let mut current = schedule.clone();
        let mut objective = weights.apply(&initial_report.breakdown);
        let mut improvements = Vec::new();
        let mut stale = 0usize;

        for round in 1..=self.params.rounds {
            if stale >= self.params.patience {
                break;
            }

            let shake = self.params.shake_every > 0 && round % self.params.shake_every == 0;
            let candidates: Vec<(&'static str, Schedule)> = if shake {
                vec![(
                    "shake",
                    perturb(&current, ctx, locked, self.params.shake_cells, rng),
                )]
            } else {
                [
                    swap_move(&current, ctx, locked, rng),
                    rebalance_move(&current, ctx, locked, rng),
                    preference_move(&current, ctx, locked),
                    coverage_move(&current, ctx, locked),
                ]
                .into_iter()
                .flatten()
                .collect()
            };

            let best = candidates
                .into_iter()
                .map(|(action, candidate)| {
                    let report = score::score(&candidate, ctx);
                    (action, weights.apply(&report.breakdown), candidate)
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));

            match best {
                Some((action, candidate_objective, candidate))
                    if candidate_objective > objective + self.params.min_gain =>
                {
                    let gain = candidate_objective - objective;
                    debug!(round, action, gain, "move accepted");
                    improvements.push(ImprovementStep { round, action, gain });
                    current = candidate;
                    objective = candidate_objective;
                    stale = 0;
                }
                _ => stale += 1,
            }
        }

        let final_report = score::score(&current, ctx);
        // A shake can end the loop on a downhill state; fall back to
        // the input when refinement lost ground overall.
        if final_report.total < initial_report.total {
            return OptimizationOutcome {
                schedule: schedule.clone(),
                initial_score: initial_report.total,
                final_score: initial_report.total,
                objective: weights.apply(&initial_report.breakdown),
                improvements: Vec::new(),
                recommendations: recommendations(&initial_report.breakdown),
            };
        }

        OptimizationOutcome {
            schedule: current,
            initial_score: initial_report.total,
            final_score: final_report.total,
            objective,
            improvements,
            recommendations: recommendations(&final_report.breakdown),
        }
    }
}

fn recommendations(breakdown: &ScoreBreakdown) -> Vec<String> {
    let mut advice = Vec::new();
    if breakdown.constraint < WEAK_OBJECTIVE {
        advice.push("constraint margin is low; review calendar rules and shift caps".to_owned());
    }
    if breakdown.fairness < WEAK_OBJECTIVE {
        advice.push("workload is uneven; consider widening the date range or adding staff".to_owned());
    }
    if breakdown.preference < WEAK_OBJECTIVE {
        advice.push("many priority rules are unsatisfied; lower-priority rules may conflict".to_owned());
    }
    if breakdown.efficiency < WEAK_OBJECTIVE {
        advice.push("coverage is below target on some dates; add backup staff".to_owned());
    }
    advice
}

/// Swaps the symbols of two cells in one staff row.
fn swap_move(
    schedule: &Schedule,
    ctx: &EngineContext,
    locked: &LockedCells,
    rng: &mut SmallRng,
) -> Option<(&'static str, Schedule)> {
    let staff = ctx.staff_ids.choose(rng)?;
    if ctx.dates.len() < 2 {
        return None;
    }
    let a = ctx.dates[rng.random_range(0..ctx.dates.len())];
    let b = ctx.dates[rng.random_range(0..ctx.dates.len())];
    if a == b {
        return None;
    }
    let va = schedule.get(staff, a);
    let vb = schedule.get(staff, b);
    if va == vb {
        return None;
    }
    let mut writer = CellWriter::new(schedule, ctx, locked);
    if writer.try_set(staff, a, vb, "objective swap")
        && writer.try_set(staff, b, va, "objective swap")
    {
        Some(("swap", writer.into_outcome().schedule))
    } else {
        None
    }
}

/// Moves one working day from the most-worked member to the least.
fn rebalance_move(
    schedule: &Schedule,
    ctx: &EngineContext,
    locked: &LockedCells,
    rng: &mut SmallRng,
) -> Option<(&'static str, Schedule)> {
    let working = |staff: &String| {
        ctx.dates
            .iter()
            .filter(|d| schedule.get(staff, **d).is_working())
            .count()
    };
    let busiest = ctx.staff_ids.iter().max_by_key(|s| working(s))?.clone();
    let lightest = ctx.staff_ids.iter().min_by_key(|s| working(s))?.clone();
    if busiest == lightest || working(&busiest) <= working(&lightest) + 1 {
        return None;
    }

    let mut writer = CellWriter::new(schedule, ctx, locked);
    let mut work_days: Vec<_> = ctx
        .dates
        .iter()
        .copied()
        .filter(|d| schedule.get(&busiest, *d).is_working())
        .collect();
    if work_days.is_empty() {
        return None;
    }
    let target = work_days.swap_remove(rng.random_range(0..work_days.len()));
    let preferred = if ctx.can_early(&busiest, target) {
        ShiftSymbol::Early
    } else {
        ShiftSymbol::Off
    };
    if writer
        .try_set_with_fallback(
            &busiest,
            target,
            preferred,
            &[ShiftSymbol::Off],
            "fairness rebalance",
        )
        .is_none()
    {
        return None;
    }
    // Hand the lightest member a working day in exchange, if they rest
    // anywhere the filters allow it.
    for &d in &ctx.dates {
        if writer.get(&lightest, d).is_rest()
            && writer.try_set(&lightest, d, ShiftSymbol::Normal, "fairness rebalance")
        {
            break;
        }
    }
    Some(("rebalance", writer.into_outcome().schedule))
}

/// Applies the highest-priority rule that is not currently satisfied.
fn preference_move(
    schedule: &Schedule,
    ctx: &EngineContext,
    locked: &LockedCells,
) -> Option<(&'static str, Schedule)> {
    for rule in ctx.config.sorted_priority_rules() {
        if score::rule_satisfied(schedule, ctx, &rule.condition) {
            continue;
        }
        let mut writer = CellWriter::new(schedule, ctx, locked);
        let applied = match &rule.condition {
            RuleCondition::FixedAssignment { staff, date, symbol } => {
                writer.try_set(staff, *date, *symbol, "preference")
            }
            RuleCondition::WeekdaySymbol { staff: Some(staff), weekday, symbol } => {
                let mut any = false;
                for &d in &ctx.dates {
                    if chrono::Datelike::weekday(&d) == *weekday
                        && writer.get(staff, d) != *symbol
                    {
                        any |= writer.try_set(staff, d, *symbol, "preference");
                    }
                }
                any
            }
            _ => false,
        };
        if applied {
            return Some(("preference", writer.into_outcome().schedule));
        }
    }
    None
}

/// Converts one rest day back to NORMAL on the worst-covered date.
fn coverage_move(
    schedule: &Schedule,
    ctx: &EngineContext,
    locked: &LockedCells,
) -> Option<(&'static str, Schedule)> {
    let target = ctx.config.min_staff_per_day;
    let worst = ctx
        .dates
        .iter()
        .copied()
        .map(|d| {
            (
                d,
                schedule.working_count(&ctx.staff_ids, d) + ctx.config.backup_count(d),
            )
        })
        .filter(|(_, covered)| *covered < target)
        .min_by_key(|(_, covered)| *covered)?;
    let mut writer = CellWriter::new(schedule, ctx, locked);
    for staff in &ctx.staff_ids {
        if writer.get(staff, worst.0).is_rest()
            && writer.try_set(staff, worst.0, ShiftSymbol::Normal, "coverage")
        {
            return Some(("coverage", writer.into_outcome().schedule));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EarlyPermissions, EngineConfig, PriorityRule};
    use crate::constraints::checks;
    use crate::models::{date_range, Staff};
    use crate::models::CalendarRules;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn ctx() -> EngineContext {
        let dates = date_range(day(1), day(14));
        let perms = EarlyPermissions::new().grant_all("alice", &dates);
        EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob"), Staff::new("cara")],
            dates,
            CalendarRules::new(),
            perms,
            EngineConfig::new(),
        )
    }

    /// A legal roster: staggered rest every 4th day.
    fn legal_schedule(ctx: &EngineContext) -> Schedule {
        let mut s = Schedule::new();
        for (k, staff) in ctx.staff_ids.iter().enumerate() {
            for (i, &date) in ctx.dates.iter().enumerate() {
                if (i + k) % 4 == 2 {
                    s.set(staff, date, ShiftSymbol::Off);
                }
            }
        }
        s
    }

    #[test]
    fn test_refine_never_lowers_the_score() {
        let ctx = ctx();
        let locked = LockedCells::new();
        let schedule = legal_schedule(&ctx);
        let mut rng = SmallRng::seed_from_u64(42);
        let out = Optimizer::new(WeightPreset::Balanced).refine(&schedule, &ctx, &locked, &mut rng);
        assert!(out.final_score >= out.initial_score);
    }

    #[test]
    fn test_refined_schedule_stays_legal() {
        let ctx = ctx();
        let locked = LockedCells::new();
        let schedule = legal_schedule(&ctx);
        let mut rng = SmallRng::seed_from_u64(42);
        let out = Optimizer::new(WeightPreset::StaffFocused).refine(&schedule, &ctx, &locked, &mut rng);
        let violations = checks::all_tier1(&out.schedule, &ctx, &locked);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_preference_move_applies_unsatisfied_rule() {
        let dates = date_range(day(1), day(14));
        let config = EngineConfig::new().with_priority_rule(PriorityRule {
            id: "late-3".into(),
            priority: 1,
            condition: RuleCondition::FixedAssignment {
                staff: "bob".into(),
                date: day(3),
                symbol: ShiftSymbol::Late,
            },
        });
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            config,
        );
        let schedule = Schedule::new();
        let moved = preference_move(&schedule, &ctx, &LockedCells::new());
        let (action, refined) = moved.expect("rule should be applicable");
        assert_eq!(action, "preference");
        assert_eq!(refined.get("bob", day(3)), ShiftSymbol::Late);
    }

    #[test]
    fn test_preset_weights_shift_the_objective() {
        let breakdown = ScoreBreakdown {
            constraint: 100.0,
            fairness: 40.0,
            preference: 40.0,
            efficiency: 100.0,
        };
        let balanced = WeightPreset::Balanced.weights().apply(&breakdown);
        let staff = WeightPreset::StaffFocused.weights().apply(&breakdown);
        let business = WeightPreset::BusinessFocused.weights().apply(&breakdown);
        assert!(staff < balanced);
        assert!(business > balanced);
    }

    #[test]
    fn test_recommendations_flag_weak_objectives() {
        let breakdown = ScoreBreakdown {
            constraint: 90.0,
            fairness: 30.0,
            preference: 90.0,
            efficiency: 90.0,
        };
        let advice = recommendations(&breakdown);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("uneven"));
    }

    #[test]
    fn test_locked_cells_survive_refinement() {
        use crate::locker::lock_calendar_cells;
        use crate::models::CalendarRule;
        let dates = date_range(day(1), day(14));
        let calendar = CalendarRules::new().with_rule(day(6), CalendarRule::MustWork);
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            calendar,
            EarlyPermissions::new(),
            EngineConfig::new(),
        );
        let locked_out = lock_calendar_cells(&Schedule::new(), &ctx);
        let mut rng = SmallRng::seed_from_u64(42);
        let out = Optimizer::new(WeightPreset::Balanced).refine(
            &locked_out.schedule,
            &ctx,
            &locked_out.locked,
            &mut rng,
        );
        for (staff, date) in locked_out.locked.iter() {
            assert_eq!(
                out.schedule.get(staff, date),
                locked_out.schedule.get(staff, date)
            );
        }
    }
}
