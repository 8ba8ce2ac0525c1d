//! Shift-roster generation engine.
//!
//! Builds monthly duty rosters over four shift symbols (NORMAL, EARLY,
//! LATE, OFF) under a tiered constraint system: calendar mandates and
//! safety rules are hard (tier 1), preference rules are soft (tier 2),
//! and distribution objectives are advisory (tier 3).
//!
//! # Modules
//!
//! - **`models`**: Domain types — `ShiftSymbol`, `Staff`, `CalendarRules`,
//!   `Schedule`, `LockedCells`, `Violation`
//! - **`config`**: Shift caps, conflict groups, priority rules, budgets
//! - **`constraints`**: Constraint registry, tier-1 filters and detectors
//! - **`validation`**: Input integrity checks (duplicate IDs, staff refs)
//! - **`locker`**: Pre-generation pinning of calendar-mandated cells
//! - **`generate`**: Search strategies, metaheuristics, and the pipeline
//! - **`score`**: Deterministic 0..=100 roster quality scoring
//! - **`repair`**: Bounded, idempotent violation repair
//! - **`optimize`**: Post-repair soft-objective refinement
//!
//! # Pipeline
//!
//! [`generate::generate`] runs validate → lock → search → repair →
//! (optimize) → verify and always returns a
//! [`generate::GenerationResult`]; failures degrade to the best roster
//! found with `success = false` rather than an error.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod constraints;
pub mod context;
pub mod error;
pub mod generate;
pub mod locker;
pub mod models;
pub mod optimize;
pub mod repair;
pub mod score;
pub mod validation;

pub use config::EngineConfig;
pub use context::EngineContext;
pub use error::EngineError;
pub use generate::{generate, CancelToken, GenerationRequest, GenerationResult, StrategyKind};
pub use models::{Schedule, ShiftSymbol, Staff};
pub use score::{score, ScoreReport};
