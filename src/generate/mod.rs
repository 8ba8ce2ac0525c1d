//! Roster generation pipeline.
//!
//! One request flows through a fixed phase sequence: validate, lock
//! calendar cells, search (one strategy, iterated under a budget with
//! perturbation restarts), repair, optionally optimize, then verify
//! that no locked cell drifted. The pipeline never fails outright: a
//! broken strategy or an exhausted budget degrades to the best roster
//! found so far with `success = false` and an explanatory message.

mod annealing;
mod ensemble;
mod genetic;
mod strategy;

pub use annealing::{Annealing, SaParams};
pub use ensemble::{vote, Ensemble, EnsembleMember, MemberBallot};
pub use genetic::{GaParams, Genetic};
pub use strategy::{
    perturb, BalanceFirst, CellWriter, PatternBased, PriorityFirst, Strategy,
    StrategyDiagnostics, StrategyOutcome,
};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{EarlyPermissions, EngineConfig};
use crate::constraints::checks;
use crate::context::EngineContext;
use crate::locker::{self, LockSummary};
use crate::models::{CalendarRules, CellChange, LockedCells, Schedule, Staff, Violation};
use crate::repair::{self, RepairSummary};
use crate::score::{self, ScoreBreakdown};
use crate::validation;
use crate::optimize::{Optimizer, WeightPreset};

/// Cooperative cancellation handle shared with callers.
///
/// Cancellation is checked between search iterations; a cancelled run
/// finishes with the best roster found so far.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Selects the search strategy for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    PriorityFirst,
    BalanceFirst,
    PatternBased,
    Genetic,
    Annealing,
    #[default]
    Ensemble,
}

impl StrategyKind {
    fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::PriorityFirst => Box::new(PriorityFirst),
            StrategyKind::BalanceFirst => Box::new(BalanceFirst),
            StrategyKind::PatternBased => Box::new(PatternBased),
            StrategyKind::Genetic => Box::new(Genetic::default()),
            StrategyKind::Annealing => Box::new(Annealing::default()),
            StrategyKind::Ensemble => Box::new(Ensemble::default()),
        }
    }
}

/// Pipeline phase, reported in diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Locking,
    Searching,
    Scoring,
    Repairing,
    Optimizing,
    Done,
}

/// One roster generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Staff roster.
    pub roster: Vec<Staff>,
    /// Ordered, inclusive date range.
    pub dates: Vec<chrono::NaiveDate>,
    /// Calendar-mandated rules.
    pub calendar: CalendarRules,
    /// Early-shift permission grants.
    pub permissions: EarlyPermissions,
    /// Engine configuration.
    pub config: EngineConfig,
    /// Search strategy.
    pub strategy: StrategyKind,
    /// Existing roster to preserve and extend, for regeneration.
    pub seed_schedule: Option<Schedule>,
    /// Whether to run the soft-objective optimizer after repair.
    pub optimize: bool,
    /// Cooperative cancellation handle.
    pub cancel: CancelToken,
}

impl GenerationRequest {
    pub fn new(roster: Vec<Staff>, dates: Vec<chrono::NaiveDate>) -> Self {
        Self {
            roster,
            dates,
            calendar: CalendarRules::new(),
            permissions: EarlyPermissions::new(),
            config: EngineConfig::new(),
            strategy: StrategyKind::default(),
            seed_schedule: None,
            optimize: false,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_calendar(mut self, calendar: CalendarRules) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_permissions(mut self, permissions: EarlyPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Preserve mode: cells of `schedule` become the starting grid and
    /// the search only has to improve on it.
    pub fn with_seed_schedule(mut self, schedule: Schedule) -> Self {
        self.seed_schedule = Some(schedule);
        self
    }

    pub fn with_optimization(mut self) -> Self {
        self.optimize = true;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Run diagnostics attached to every result.
#[derive(Debug, Clone, Default)]
pub struct GenerationDiagnostics {
    /// Strategy that produced the roster.
    pub strategy: StrategyKind,
    /// Search iterations executed.
    pub iterations: usize,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
    /// Best score after each iteration.
    pub score_curve: Vec<f64>,
    /// Locking summary.
    pub lock_summary: LockSummary,
    /// Locked cells found altered after the run. Always zero unless a
    /// component breaks its lock contract.
    pub lock_breaches: usize,
    /// Messages from caught strategy failures.
    pub strategy_failures: Vec<String>,
    /// Current (and, after the run, final) pipeline phase.
    pub phase: Phase,
    /// Every phase the run entered, in order.
    pub phase_trace: Vec<Phase>,
}

impl GenerationDiagnostics {
    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_trace.push(phase);
    }
}

/// Outcome of one generation request. Always produced; inspect
/// `success` and `message` rather than a `Result`.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Whether the roster is fully legal and the run completed clean.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// The generated roster.
    pub schedule: Schedule,
    /// Composite quality score, 0..=100.
    pub score: f64,
    /// Per-objective subscores.
    pub breakdown: ScoreBreakdown,
    /// Engine confidence in the roster, 0..=1.
    pub confidence: f64,
    /// Cell changes applied by locking.
    pub lock_changes: Vec<CellChange>,
    /// Repair summary.
    pub repair: RepairSummary,
    /// Violations the repair engine could not fix.
    pub unresolved: Vec<Violation>,
    /// Run diagnostics.
    pub diagnostics: GenerationDiagnostics,
}

impl GenerationResult {
    fn rejected(message: String, schedule: Schedule, diagnostics: GenerationDiagnostics) -> Self {
        Self {
            success: false,
            message,
            schedule,
            score: 0.0,
            breakdown: ScoreBreakdown::default(),
            confidence: 0.0,
            lock_changes: Vec::new(),
            repair: RepairSummary::default(),
            unresolved: Vec::new(),
            diagnostics,
        }
    }
}

/// Extra perturbation flips applied between search iterations.
const PERTURB_CELLS: usize = 4;

/// Runs the full generation pipeline for one request.
pub fn generate(request: GenerationRequest) -> GenerationResult {
    let started = Instant::now();
    let mut diagnostics = GenerationDiagnostics {
        strategy: request.strategy,
        ..GenerationDiagnostics::default()
    };

    if let Err(errors) = validation::validate_input(
        &request.roster,
        &request.dates,
        &request.calendar,
        &request.permissions,
        &request.config,
    ) {
        let message = crate::error::EngineError::Validation(errors).to_string();
        warn!(%message, "request rejected");
        diagnostics.enter(Phase::Done);
        diagnostics.elapsed = started.elapsed();
        let fallback = request.seed_schedule.unwrap_or_default();
        return GenerationResult::rejected(message, fallback, diagnostics);
    }

    let ctx = EngineContext::new(
        request.roster,
        request.dates,
        request.calendar,
        request.permissions,
        request.config,
    );

    diagnostics.enter(Phase::Locking);
    let seed = request.seed_schedule.unwrap_or_default();
    let lock_outcome = locker::lock_calendar_cells(&seed, &ctx);
    diagnostics.lock_summary = lock_outcome.summary;
    let locked = lock_outcome.locked;
    let locked_schedule = lock_outcome.schedule;

    diagnostics.enter(Phase::Searching);
    let strategy = request.strategy.build();
    let mut rng = match ctx.config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let budget = ctx.config.budget;

    let mut best = locked_schedule.clone();
    let mut best_score = score::score(&best, &ctx).total;
    let mut stagnant = 0usize;

    for iteration in 0..budget.max_iterations {
        if request.cancel.is_cancelled() {
            info!(iteration, "generation cancelled");
            break;
        }
        if started.elapsed() >= budget.time_limit {
            info!(iteration, "time limit reached");
            break;
        }

        let start_point = if iteration == 0 {
            locked_schedule.clone()
        } else {
            perturb(&best, &ctx, &locked, PERTURB_CELLS, &mut rng)
        };

        diagnostics.iterations = iteration + 1;
        let attempt = catch_unwind(AssertUnwindSafe(|| {
            strategy.run(&start_point, &ctx, &locked, &mut rng)
        }));
        let candidate = match attempt {
            Ok(outcome) => outcome.schedule,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "strategy panicked".to_owned());
                warn!(strategy = strategy.name(), %message, "strategy failure caught");
                diagnostics
                    .strategy_failures
                    .push(format!("{}: {message}", strategy.name()));
                continue;
            }
        };

        let candidate_score = score::score(&candidate, &ctx).total;
        if candidate_score > best_score {
            best = candidate;
            best_score = candidate_score;
            stagnant = 0;
        } else {
            stagnant += 1;
        }
        diagnostics.score_curve.push(best_score);

        if best_score >= budget.target_score {
            info!(iteration, best_score, "target score reached");
            break;
        }
        if stagnant >= budget.stagnation_limit {
            info!(iteration, best_score, "search stagnated");
            break;
        }
    }

    diagnostics.enter(Phase::Repairing);
    let repair_outcome = repair::repair(&best, &ctx, &locked);
    let mut schedule = repair_outcome.schedule;
    let repair_summary = repair_outcome.summary;

    if request.optimize {
        diagnostics.enter(Phase::Optimizing);
        let refined = Optimizer::new(WeightPreset::Balanced).refine(&schedule, &ctx, &locked, &mut rng);
        if refined.final_score >= score::score(&schedule, &ctx).total {
            schedule = refined.schedule;
        }
    }

    diagnostics.enter(Phase::Scoring);
    let report = score::score(&schedule, &ctx);
    // Success is judged on the schedule actually returned, after every
    // downstream pass had its chance to alter it.
    let unresolved = checks::all_tier1(&schedule, &ctx, &locked);
    let breaches = locker::verify_locks(&locked_schedule, &locked, &schedule);
    diagnostics.lock_breaches = breaches.len();
    diagnostics.elapsed = started.elapsed();
    diagnostics.enter(Phase::Done);

    let clean = unresolved.is_empty() && breaches.is_empty();
    let confidence = ((report.total / 100.0) * if clean { 1.0 } else { 0.7 }).clamp(0.0, 1.0);
    let message = if clean {
        format!(
            "generated in {} iteration(s), score {:.1}",
            diagnostics.iterations, report.total
        )
    } else if !breaches.is_empty() {
        format!("{} locked cell(s) were altered during generation", breaches.len())
    } else {
        format!(
            "{} violation(s) remain after {} repair pass(es)",
            unresolved.len(),
            repair_summary.passes
        )
    };
    info!(
        score = report.total,
        success = clean,
        iterations = diagnostics.iterations,
        "generation finished"
    );

    GenerationResult {
        success: clean,
        message,
        schedule,
        score: report.total,
        breakdown: report.breakdown,
        confidence,
        lock_changes: lock_outcome.changes,
        repair: repair_summary,
        unresolved,
        diagnostics,
    }
}
