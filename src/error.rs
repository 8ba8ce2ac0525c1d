//! Engine error taxonomy.
//!
//! Only input validation surfaces as a hard error before search
//! begins. Everything downstream is absorbed: configuration problems
//! fall back to defaults, strategy failures fall back to the best
//! schedule found so far, and exhausted repair is reported in the
//! result. The top-level entry point never returns `Err` to its
//! caller.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or invalid rule configuration. Recoverable: the engine
    /// substitutes conservative defaults.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed roster or date-range input, rejected before search.
    #[error("input validation failed: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    /// An algorithm failed internally. Caught at the strategy boundary.
    #[error("generation failure in '{strategy}': {message}")]
    Generation { strategy: String, message: String },

    /// Violations remain after the maximum repair passes.
    #[error("{remaining} violation(s) remain after {passes} repair pass(es)")]
    RepairExhausted { remaining: usize, passes: usize },
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
