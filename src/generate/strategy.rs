//! Generation strategies.
//!
//! A strategy is a pure transformation: it takes a schedule (already
//! carrying the locker's pinned cells), works on its own copy, and
//! returns a candidate plus a change log. Strategies never write a
//! locked cell and never write a symbol that fails a tier-1 filter —
//! both are enforced centrally by [`CellWriter`].

use chrono::NaiveDate;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constraints::checks;
use crate::context::EngineContext;
use crate::models::{CellChange, LockedCells, Schedule, ShiftSymbol};

/// Per-run strategy counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyDiagnostics {
    /// Cells written.
    pub cells_written: usize,
    /// Writes refused by the lock set.
    pub cells_locked: usize,
    /// Writes refused by a tier-1 filter.
    pub cells_filtered: usize,
}

/// A candidate schedule produced by one strategy run.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// The candidate.
    pub schedule: Schedule,
    /// One entry per accepted write.
    pub changes: Vec<CellChange>,
    /// Run counters.
    pub diagnostics: StrategyDiagnostics,
}

/// A schedule transformation respecting locks and tier-1 filters.
pub trait Strategy: Send + Sync {
    /// Strategy name for diagnostics.
    fn name(&self) -> &'static str;

    /// Produces a candidate from the given schedule.
    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> StrategyOutcome;
}

/// Checked cell writer shared by all strategies.
///
/// Every write goes through [`CellWriter::try_set`], which refuses
/// locked cells and symbols that would breach a tier-1 constraint.
pub struct CellWriter<'a> {
    schedule: Schedule,
    ctx: &'a EngineContext,
    locked: &'a LockedCells,
    changes: Vec<CellChange>,
    diagnostics: StrategyDiagnostics,
}

impl<'a> CellWriter<'a> {
    /// Starts from a copy of `schedule`.
    pub fn new(schedule: &Schedule, ctx: &'a EngineContext, locked: &'a LockedCells) -> Self {
        Self {
            schedule: schedule.clone(),
            ctx,
            locked,
            changes: Vec::new(),
            diagnostics: StrategyDiagnostics::default(),
        }
    }

    /// Reads a cell.
    pub fn get(&self, staff: &str, date: NaiveDate) -> ShiftSymbol {
        self.schedule.get(staff, date)
    }

    /// Read-only view of the schedule under construction.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Attempts a checked write. Returns whether the write happened.
    pub fn try_set(
        &mut self,
        staff: &str,
        date: NaiveDate,
        symbol: ShiftSymbol,
        reason: &str,
    ) -> bool {
        if self.locked.is_locked(staff, date) {
            self.diagnostics.cells_locked += 1;
            return false;
        }
        let before = self.schedule.get(staff, date);
        if before == symbol {
            return false;
        }
        if checks::would_violate(&self.schedule, staff, date, symbol, self.ctx).is_some() {
            self.diagnostics.cells_filtered += 1;
            return false;
        }
        self.schedule.set(staff, date, symbol);
        self.diagnostics.cells_written += 1;
        self.changes
            .push(CellChange::new(staff, date, before, symbol, reason));
        true
    }

    /// Writes `symbol`, falling back through `alternatives` until one
    /// passes the filters. Returns the symbol written, if any.
    pub fn try_set_with_fallback(
        &mut self,
        staff: &str,
        date: NaiveDate,
        preferred: ShiftSymbol,
        alternatives: &[ShiftSymbol],
        reason: &str,
    ) -> Option<ShiftSymbol> {
        if self.try_set(staff, date, preferred, reason) {
            return Some(preferred);
        }
        for &alt in alternatives {
            if self.try_set(staff, date, alt, reason) {
                return Some(alt);
            }
        }
        None
    }

    /// Finishes the run.
    pub fn into_outcome(self) -> StrategyOutcome {
        StrategyOutcome {
            schedule: self.schedule,
            changes: self.changes,
            diagnostics: self.diagnostics,
        }
    }
}

/// Walks each staff row and breaks every working run before it can
/// starve a rest window or exceed the consecutive-work cap. EARLY is
/// preferred when the member is eligible and the write passes the
/// filters; when the current day is refused (locked, min staffing,
/// adjacency), earlier days of the same run are tried instead.
///
/// The filters only guard writes, so cells left at the default NORMAL
/// never pass through them; every strategy runs this after its own
/// moves to make the hard rest rules hold by construction.
pub(super) fn enforce_rest_cadence(writer: &mut CellWriter<'_>, ctx: &EngineContext, reason: &str) {
    let longest = ctx
        .config
        .rest_window_days
        .min(ctx.config.max_consecutive_work)
        .max(1);
    for staff in &ctx.staff_ids {
        let mut run = 0usize;
        for (i, &date) in ctx.dates.iter().enumerate() {
            if !writer.get(staff, date).is_working() {
                run = 0;
                continue;
            }
            run += 1;
            if run < longest {
                continue;
            }
            for back in 0..run.min(i + 1) {
                let d = ctx.dates[i - back];
                let preferred = if ctx.can_early(staff, d) {
                    ShiftSymbol::Early
                } else {
                    ShiftSymbol::Off
                };
                if writer
                    .try_set_with_fallback(staff, d, preferred, &[ShiftSymbol::Off], reason)
                    .is_some()
                {
                    // Days after the inserted rest day are still working.
                    run = back;
                    break;
                }
            }
        }
    }
}

/// Applies dynamic priority rules first, then enforces rest cadence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityFirst;

impl Strategy for PriorityFirst {
    fn name(&self) -> &'static str {
        "priority-first"
    }

    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        _rng: &mut SmallRng,
    ) -> StrategyOutcome {
        use crate::config::RuleCondition;
        let mut writer = CellWriter::new(schedule, ctx, locked);

        for rule in ctx.config.sorted_priority_rules() {
            match &rule.condition {
                RuleCondition::FixedAssignment { staff, date, symbol } => {
                    writer.try_set(staff, *date, *symbol, "priority rule");
                }
                RuleCondition::WeekdaySymbol { staff: Some(staff), weekday, symbol } => {
                    let days: Vec<NaiveDate> = ctx
                        .dates
                        .iter()
                        .copied()
                        .filter(|d| chrono::Datelike::weekday(d) == *weekday)
                        .collect();
                    for date in days {
                        writer.try_set(staff, date, *symbol, "priority rule");
                    }
                }
                // Unscoped weekday preferences and group limits constrain
                // rather than assign; the filters uphold them.
                _ => {}
            }
        }

        enforce_rest_cadence(&mut writer, ctx, "rest cadence");
        writer.into_outcome()
    }
}

/// Randomized workload balancing: repeatedly moves a rest day to the
/// most-worked member, then enforces rest cadence.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceFirst;

impl Strategy for BalanceFirst {
    fn name(&self) -> &'static str {
        "balance-first"
    }

    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> StrategyOutcome {
        let mut writer = CellWriter::new(schedule, ctx, locked);
        enforce_rest_cadence(&mut writer, ctx, "rest cadence");

        let attempts = ctx.staff_ids.len().max(1) * 2;
        for _ in 0..attempts {
            let Some(busiest) = ctx
                .staff_ids
                .iter()
                .max_by_key(|s| {
                    ctx.dates
                        .iter()
                        .filter(|d| writer.get(s, **d).is_working())
                        .count()
                })
            else {
                break;
            };
            let busiest = busiest.clone();
            let mut candidates: Vec<NaiveDate> = ctx
                .dates
                .iter()
                .copied()
                .filter(|d| writer.get(&busiest, *d).is_working())
                .collect();
            candidates.shuffle(rng);
            for date in candidates {
                let preferred = if ctx.can_early(&busiest, date) && rng.random_bool(0.5) {
                    ShiftSymbol::Early
                } else {
                    ShiftSymbol::Off
                };
                if writer
                    .try_set_with_fallback(
                        &busiest,
                        date,
                        preferred,
                        &[ShiftSymbol::Off],
                        "workload balancing",
                    )
                    .is_some()
                {
                    break;
                }
            }
        }

        writer.into_outcome()
    }
}

/// Staggered rotation template: rest days recur on a fixed period,
/// offset per staff member so they never cluster, with LATE shifts
/// rotated through the roster for evening coverage.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternBased;

impl Strategy for PatternBased {
    fn name(&self) -> &'static str {
        "pattern-based"
    }

    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> StrategyOutcome {
        let mut writer = CellWriter::new(schedule, ctx, locked);
        let period = ctx.config.max_consecutive_work.clamp(2, 7);
        let phase = rng.random_range(0..period);

        for (k, staff) in ctx.staff_ids.iter().enumerate() {
            for (i, &date) in ctx.dates.iter().enumerate() {
                if (i + phase + k * 2) % period == 0 {
                    let preferred = if ctx.can_early(staff, date) {
                        ShiftSymbol::Early
                    } else {
                        ShiftSymbol::Off
                    };
                    writer.try_set_with_fallback(
                        staff,
                        date,
                        preferred,
                        &[ShiftSymbol::Off],
                        "rotation pattern",
                    );
                } else if (i + k) % ctx.staff_ids.len().max(1) == 0 {
                    writer.try_set(staff, date, ShiftSymbol::Late, "late rotation");
                }
            }
        }

        enforce_rest_cadence(&mut writer, ctx, "rest cadence");
        writer.into_outcome()
    }
}

/// Applies `count` random legal cell flips to seed the next search
/// iteration. Used by the orchestrator between iterations.
pub fn perturb(
    schedule: &Schedule,
    ctx: &EngineContext,
    locked: &LockedCells,
    count: usize,
    rng: &mut SmallRng,
) -> Schedule {
    if ctx.staff_ids.is_empty() || ctx.dates.is_empty() {
        return schedule.clone();
    }
    let mut writer = CellWriter::new(schedule, ctx, locked);
    for _ in 0..count {
        let staff = &ctx.staff_ids[rng.random_range(0..ctx.staff_ids.len())];
        let date = ctx.dates[rng.random_range(0..ctx.dates.len())];
        let symbol = ShiftSymbol::ALL[rng.random_range(0..ShiftSymbol::ALL.len())];
        writer.try_set(staff, date, symbol, "perturbation");
    }
    writer.into_outcome().schedule
}
