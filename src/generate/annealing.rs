//! Simulated annealing over single-cell roster moves.
//!
//! Each step proposes one legal symbol change on an unlocked cell and
//! accepts it by the Metropolis criterion under an exponentially
//! cooling temperature, so early iterations explore freely and late
//! iterations only climb.
//!
//! # Reference
//! Kirkpatrick, Gelatt, Vecchi (1983), "Optimization by Simulated
//! Annealing"

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::debug;

use crate::context::EngineContext;
use crate::models::{LockedCells, Schedule, ShiftSymbol};
use crate::score;

use super::strategy::{CellWriter, Strategy, StrategyOutcome};

/// Annealing schedule parameters.
#[derive(Debug, Clone)]
pub struct SaParams {
    /// Starting temperature.
    pub initial_temperature: f64,
    /// Multiplicative cooling factor per step.
    pub cooling: f64,
    /// Number of proposal steps.
    pub steps: usize,
    /// Temperature floor below which the walk becomes strictly greedy.
    pub min_temperature: f64,
}

impl Default for SaParams {
    fn default() -> Self {
        Self {
            initial_temperature: 8.0,
            cooling: 0.97,
            steps: 250,
            min_temperature: 0.05,
        }
    }
}

/// Search strategy backed by simulated annealing.
#[derive(Debug, Clone, Default)]
pub struct Annealing {
    /// Cooling schedule; defaults are sized for month-scale rosters.
    pub params: SaParams,
}

impl Strategy for Annealing {
    fn name(&self) -> &'static str {
        "annealing"
    }

    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> StrategyOutcome {
        let mut writer = CellWriter::new(schedule, ctx, locked);
        if ctx.staff_ids.is_empty() || ctx.dates.is_empty() {
            return writer.into_outcome();
        }

        let mut current_score = score::score(writer.schedule(), ctx).total;
        let mut best = writer.schedule().clone();
        let mut best_score = current_score;
        let mut temperature = self.params.initial_temperature;
        let mut accepted = 0usize;

        for _ in 0..self.params.steps {
            let staff = &ctx.staff_ids[rng.random_range(0..ctx.staff_ids.len())];
            let date = ctx.dates[rng.random_range(0..ctx.dates.len())];
            let before = writer.get(staff, date);
            let proposal = ShiftSymbol::ALL[rng.random_range(0..ShiftSymbol::ALL.len())];
            if proposal == before {
                continue;
            }
            if !writer.try_set(staff, date, proposal, "annealing move") {
                continue;
            }

            let candidate_score = score::score(writer.schedule(), ctx).total;
            let delta = candidate_score - current_score;
            let accept = delta >= 0.0
                || (temperature > self.params.min_temperature
                    && rng.random_bool((delta / temperature).exp().clamp(0.0, 1.0)));
            if accept {
                current_score = candidate_score;
                accepted += 1;
                if candidate_score > best_score {
                    best_score = candidate_score;
                    best = writer.schedule().clone();
                }
            } else if !writer.try_set(staff, date, before, "annealing rollback") {
                // Rollback can fail when the input schedule was itself
                // illegal at this cell; keep the move instead.
                current_score = candidate_score;
            }

            temperature = (temperature * self.params.cooling).max(self.params.min_temperature);
        }

        debug!(accepted, best_score, "annealing finished");

        // Replay the best state through a fresh writer so the change
        // log reflects the returned schedule rather than the walk.
        let mut replay = CellWriter::new(schedule, ctx, locked);
        for staff in &ctx.staff_ids {
            for &date in &ctx.dates {
                let target = best.get(staff, date);
                if replay.get(staff, date) != target {
                    replay.try_set(staff, date, target, "annealing");
                }
            }
        }
        // The walk only guards writes; default-NORMAL stretches the walk
        // never touched still need the hard rest cadence.
        super::strategy::enforce_rest_cadence(&mut replay, ctx, "rest cadence");
        replay.into_outcome()
    }
}
