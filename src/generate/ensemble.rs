//! Ensemble generation: several strategies run independently and the
//! final roster is assembled by a per-cell weighted vote.
//!
//! Members run in parallel with seeds derived from the request seed,
//! so the ensemble stays deterministic for a fixed member list. Each
//! member's ballot carries `weight × confidence × normalized score`;
//! the winning symbol per cell is replayed through the checked cell
//! writer so the assembled roster still honors locks and tier-1
//! filters.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

use crate::context::EngineContext;
use crate::models::{LockedCells, Schedule, ShiftSymbol};
use crate::score;

use super::annealing::Annealing;
use super::genetic::Genetic;
use super::strategy::{
    BalanceFirst, CellWriter, PatternBased, PriorityFirst, Strategy, StrategyOutcome,
};

/// One voting member: a strategy and its configured weight.
pub struct EnsembleMember {
    /// The strategy to run.
    pub strategy: Box<dyn Strategy>,
    /// Configured vote weight, normally in `0.0..=1.0`.
    pub weight: f64,
}

impl EnsembleMember {
    pub fn new(strategy: Box<dyn Strategy>, weight: f64) -> Self {
        Self { strategy, weight }
    }
}

/// A completed member run entering the vote.
#[derive(Debug, Clone)]
pub struct MemberBallot {
    /// Strategy name, for diagnostics.
    pub name: &'static str,
    /// The member's candidate schedule.
    pub schedule: Schedule,
    /// Configured member weight.
    pub weight: f64,
    /// Member confidence in `0.0..=1.0`.
    pub confidence: f64,
    /// Score of the candidate.
    pub score: f64,
}

impl MemberBallot {
    /// Effective per-cell vote strength:
    /// `weight × confidence × (score / best score among members)`.
    fn strength(&self, max_score: f64) -> f64 {
        let normalized = if max_score > 0.0 {
            self.score / max_score
        } else {
            1.0
        };
        self.weight * self.confidence * normalized
    }
}

/// Per-cell weighted vote across ballots. Ties resolve toward the
/// symbol proposed by the strongest ballot, which keeps the outcome
/// deterministic.
pub fn vote(
    ballots: &[MemberBallot],
    ctx: &EngineContext,
    locked: &LockedCells,
    base: &Schedule,
) -> Schedule {
    let max_score = ballots.iter().map(|b| b.score).fold(0.0, f64::max);
    let mut writer = CellWriter::new(base, ctx, locked);
    for staff in &ctx.staff_ids {
        for &date in &ctx.dates {
            if locked.is_locked(staff, date) {
                continue;
            }
            let mut tally: BTreeMap<ShiftSymbol, f64> = BTreeMap::new();
            for ballot in ballots {
                *tally.entry(ballot.schedule.get(staff, date)).or_default() +=
                    ballot.strength(max_score);
            }
            let winner = tally
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(symbol, _)| symbol)
                .unwrap_or_default();
            writer.try_set_with_fallback(
                staff,
                date,
                winner,
                &[ShiftSymbol::Normal, ShiftSymbol::Off],
                "ensemble vote",
            );
        }
    }
    writer.into_outcome().schedule
}

/// Strategy that runs the full member slate and votes.
pub struct Ensemble {
    /// Voting members; defaults to all five concrete strategies.
    pub members: Vec<EnsembleMember>,
}

impl Default for Ensemble {
    fn default() -> Self {
        Self {
            members: vec![
                EnsembleMember::new(Box::new(PriorityFirst), 1.0),
                EnsembleMember::new(Box::new(BalanceFirst), 0.8),
                EnsembleMember::new(Box::new(PatternBased), 0.8),
                EnsembleMember::new(Box::new(Genetic::default()), 1.0),
                EnsembleMember::new(Box::new(Annealing::default()), 0.9),
            ],
        }
    }
}

impl Ensemble {
    /// Derives a distinct member seed from the run seed.
    fn member_seed(base: u64, index: usize) -> u64 {
        base ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

impl Strategy for Ensemble {
    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> StrategyOutcome {
        use rand::Rng;
        if self.members.is_empty() {
            return CellWriter::new(schedule, ctx, locked).into_outcome();
        }
        let run_seed: u64 = rng.random();

        let ballots: Vec<MemberBallot> = self
            .members
            .par_iter()
            .enumerate()
            .map(|(i, member)| {
                let mut member_rng = SmallRng::seed_from_u64(Self::member_seed(run_seed, i));
                let outcome = member.strategy.run(schedule, ctx, locked, &mut member_rng);
                let report = score::score(&outcome.schedule, ctx);
                MemberBallot {
                    name: member.strategy.name(),
                    schedule: outcome.schedule,
                    weight: member.weight,
                    confidence: (report.total / 100.0).clamp(0.0, 1.0),
                    score: report.total,
                }
            })
            .collect();

        for ballot in &ballots {
            debug!(member = ballot.name, score = ballot.score, "ensemble member done");
        }

        let combined = vote(&ballots, ctx, locked, schedule);
        let mut writer = CellWriter::new(schedule, ctx, locked);
        for staff in &ctx.staff_ids {
            for &date in &ctx.dates {
                let target = combined.get(staff, date);
                if writer.get(staff, date) != target {
                    writer.try_set(staff, date, target, "ensemble vote");
                }
            }
        }
        // Mixing rows cell-by-cell can vote every rest day away on a
        // row; restore the hard rest cadence on the assembled roster.
        super::strategy::enforce_rest_cadence(&mut writer, ctx, "rest cadence");
        writer.into_outcome()
    }
}
