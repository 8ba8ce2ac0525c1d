//! Constraint catalog and tier-1 checks.
//!
//! - [`registry`]: the tiered, priority-ordered rule catalog (pure
//!   lookup table).
//! - [`checks`]: pure tier-1 predicates and violation detectors shared
//!   by search filtering, scoring, and repair.

pub mod checks;
mod registry;

pub use registry::{ConstraintDef, ConstraintId, ConstraintRegistry, ConstraintScope};
