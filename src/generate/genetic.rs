//! Genetic search over the unlocked cells of a roster.
//!
//! # Encoding
//!
//! A chromosome is a flat gene vector parallel to the list of unlocked
//! (staff, date) cells; each gene is one [`ShiftSymbol`]. Decoding
//! replays the genes onto the locked base schedule through the checked
//! cell writer, so an illegal gene degrades to the nearest legal
//! symbol instead of producing an infeasible roster.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization and
//! Machine Learning" — tournament selection, uniform crossover,
//! elitist replacement.

use chrono::NaiveDate;
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::debug;

use crate::context::EngineContext;
use crate::models::{LockedCells, Schedule, ShiftSymbol};
use crate::score;

use super::strategy::{CellWriter, Strategy, StrategyOutcome};

/// Genetic algorithm tuning knobs.
#[derive(Debug, Clone)]
pub struct GaParams {
    /// Population size.
    pub population: usize,
    /// Number of generations.
    pub generations: usize,
    /// Probability of crossover per pairing.
    pub crossover_rate: f64,
    /// Probability of mutating each gene.
    pub mutation_rate: f64,
    /// Tournament size for parent selection.
    pub tournament: usize,
    /// Individuals copied unchanged into the next generation.
    pub elite: usize,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population: 16,
            generations: 24,
            crossover_rate: 0.9,
            mutation_rate: 0.12,
            tournament: 3,
            elite: 2,
        }
    }
}

/// Gene vector over unlocked cells, fitness = schedule score.
#[derive(Debug, Clone)]
struct RosterChromosome {
    genes: Vec<ShiftSymbol>,
    fitness: f64,
}

impl RosterChromosome {
    fn random(len: usize, rng: &mut SmallRng) -> Self {
        let genes = (0..len)
            .map(|_| ShiftSymbol::ALL[rng.random_range(0..ShiftSymbol::ALL.len())])
            .collect();
        Self {
            genes,
            fitness: f64::NEG_INFINITY,
        }
    }

    fn from_schedule(schedule: &Schedule, cells: &[(String, NaiveDate)]) -> Self {
        let genes = cells
            .iter()
            .map(|(staff, date)| schedule.get(staff, *date))
            .collect();
        Self {
            genes,
            fitness: f64::NEG_INFINITY,
        }
    }
}

/// Search strategy backed by the genetic algorithm.
#[derive(Debug, Clone, Default)]
pub struct Genetic {
    /// Tuning knobs; defaults are sized for month-scale rosters.
    pub params: GaParams,
}

impl Genetic {
    /// Unlocked cells in deterministic row-major order.
    fn cell_list(ctx: &EngineContext, locked: &LockedCells) -> Vec<(String, NaiveDate)> {
        let mut cells = Vec::new();
        for staff in &ctx.staff_ids {
            for &date in &ctx.dates {
                if !locked.is_locked(staff, date) {
                    cells.push((staff.clone(), date));
                }
            }
        }
        cells
    }

    /// Replays genes onto the base schedule through the checked writer.
    fn decode(
        base: &Schedule,
        cells: &[(String, NaiveDate)],
        genes: &[ShiftSymbol],
        ctx: &EngineContext,
        locked: &LockedCells,
    ) -> StrategyOutcome {
        let mut writer = CellWriter::new(base, ctx, locked);
        for ((staff, date), &gene) in cells.iter().zip(genes) {
            writer.try_set_with_fallback(
                staff,
                *date,
                gene,
                &[ShiftSymbol::Normal, ShiftSymbol::Off],
                "gene decode",
            );
        }
        // Chromosomes with too few rest genes leave long default-NORMAL
        // runs behind; restore the hard rest cadence before scoring.
        super::strategy::enforce_rest_cadence(&mut writer, ctx, "rest cadence");
        writer.into_outcome()
    }

    fn evaluate(
        &self,
        chromosome: &mut RosterChromosome,
        base: &Schedule,
        cells: &[(String, NaiveDate)],
        ctx: &EngineContext,
        locked: &LockedCells,
    ) -> StrategyOutcome {
        let outcome = Self::decode(base, cells, &chromosome.genes, ctx, locked);
        chromosome.fitness = score::score(&outcome.schedule, ctx).total;
        outcome
    }

    fn tournament<'a>(
        &self,
        population: &'a [RosterChromosome],
        rng: &mut SmallRng,
    ) -> &'a RosterChromosome {
        let mut best = &population[rng.random_range(0..population.len())];
        for _ in 1..self.params.tournament {
            let contender = &population[rng.random_range(0..population.len())];
            if contender.fitness > best.fitness {
                best = contender;
            }
        }
        best
    }

    fn crossover(
        &self,
        a: &RosterChromosome,
        b: &RosterChromosome,
        rng: &mut SmallRng,
    ) -> RosterChromosome {
        let genes = if rng.random_bool(self.params.crossover_rate) {
            a.genes
                .iter()
                .zip(&b.genes)
                .map(|(&x, &y)| if rng.random_bool(0.5) { x } else { y })
                .collect()
        } else {
            a.genes.clone()
        };
        RosterChromosome {
            genes,
            fitness: f64::NEG_INFINITY,
        }
    }

    fn mutate(&self, chromosome: &mut RosterChromosome, rng: &mut SmallRng) {
        for gene in &mut chromosome.genes {
            if rng.random_bool(self.params.mutation_rate) {
                *gene = ShiftSymbol::ALL[rng.random_range(0..ShiftSymbol::ALL.len())];
            }
        }
    }
}

impl Strategy for Genetic {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn run(
        &self,
        schedule: &Schedule,
        ctx: &EngineContext,
        locked: &LockedCells,
        rng: &mut SmallRng,
    ) -> StrategyOutcome {
        let cells = Self::cell_list(ctx, locked);
        if cells.is_empty() {
            return CellWriter::new(schedule, ctx, locked).into_outcome();
        }

        // Seed one individual from the incoming schedule so the search
        // never regresses below it; the rest are random.
        let mut population: Vec<RosterChromosome> = Vec::with_capacity(self.params.population);
        population.push(RosterChromosome::from_schedule(schedule, &cells));
        while population.len() < self.params.population.max(2) {
            population.push(RosterChromosome::random(cells.len(), rng));
        }
        for individual in &mut population {
            self.evaluate(individual, schedule, &cells, ctx, locked);
        }

        for generation in 0..self.params.generations {
            population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
            let mut next: Vec<RosterChromosome> = population
                .iter()
                .take(self.params.elite.min(population.len()))
                .cloned()
                .collect();
            while next.len() < population.len() {
                let a = self.tournament(&population, rng);
                let b = self.tournament(&population, rng);
                let mut child = self.crossover(a, b, rng);
                self.mutate(&mut child, rng);
                self.evaluate(&mut child, schedule, &cells, ctx, locked);
                next.push(child);
            }
            population = next;
            if generation % 8 == 0 {
                let best = population
                    .iter()
                    .map(|c| c.fitness)
                    .fold(f64::NEG_INFINITY, f64::max);
                debug!(generation, best, "ga progress");
            }
        }

        population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        let mut best = population.swap_remove(0);
        self.evaluate(&mut best, schedule, &cells, ctx, locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EarlyPermissions, EngineConfig};
    use crate::constraints::checks;
    use crate::locker::lock_calendar_cells;
    use crate::models::{date_range, CalendarRule, CalendarRules, Staff};
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

    fn small_params() -> GaParams {
        GaParams {
            population: 6,
            generations: 6,
            ..GaParams::default()
        }
    }

    #[test]
    fn test_ga_output_has_no_tier1_violations() {
        let ctx = ctx();
        let locked = LockedCells::new();
        let ga = Genetic { params: small_params() };
        let mut rng = SmallRng::seed_from_u64(42);
        let out = ga.run(&Schedule::new(), &ctx, &locked, &mut rng);
        let violations = checks::all_tier1(&out.schedule, &ctx, &locked);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_ga_preserves_locked_cells() {
        let dates = date_range(day(1), day(14));
        let calendar = CalendarRules::new()
            .with_rule(day(4), CalendarRule::MustWork)
            .with_rule(day(9), CalendarRule::MustDayOff);
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            calendar,
            EarlyPermissions::new(),
            EngineConfig::new(),
        );
        let locked_out = lock_calendar_cells(&Schedule::new(), &ctx);
        let ga = Genetic { params: small_params() };
        let mut rng = SmallRng::seed_from_u64(42);
        let out = ga.run(&locked_out.schedule, &ctx, &locked_out.locked, &mut rng);
        for (staff, date) in locked_out.locked.iter() {
            assert_eq!(
                out.schedule.get(staff, date),
                locked_out.schedule.get(staff, date)
            );
        }
    }

    #[test]
    fn test_ga_never_regresses_below_seed_schedule() {
        let ctx = ctx();
        let locked = LockedCells::new();
        // An already decent schedule: rest every 4th day
        let mut seed = Schedule::new();
        for (k, staff) in ctx.staff_ids.iter().enumerate() {
            for (i, &date) in ctx.dates.iter().enumerate() {
                if (i + k) % 4 == 2 {
                    seed.set(staff, date, ShiftSymbol::Off);
                }
            }
        }
        let seed_score = score::score(&seed, &ctx).total;
        let ga = Genetic { params: small_params() };
        let mut rng = SmallRng::seed_from_u64(42);
        let out = ga.run(&seed, &ctx, &locked, &mut rng);
        assert!(score::score(&out.schedule, &ctx).total >= seed_score - 1e-9);
    }

    #[test]
    fn test_ga_deterministic_with_same_seed() {
        let ctx = ctx();
        let locked = LockedCells::new();
        let ga = Genetic { params: small_params() };
        let a = ga.run(
            &Schedule::new(),
            &ctx,
            &locked,
            &mut SmallRng::seed_from_u64(9),
        );
        let b = ga.run(
            &Schedule::new(),
            &ctx,
            &locked,
            &mut SmallRng::seed_from_u64(9),
        );
        assert_eq!(a.schedule, b.schedule);
    }
}
