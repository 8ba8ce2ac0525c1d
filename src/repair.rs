//! Automatic violation repair.
//!
//! Detects concrete tier-1 violations in a finished schedule and
//! applies minimal corrective edits in bounded passes until a fixed
//! point. Detection covers the repairable categories: calendar
//! must-work/must-day-off mismatches, early-permission breaches,
//! consecutive-workday breaches, and conflict-group clashes.
//!
//! Success is judged against the full tier-1 rule set, not just the
//! repairable subset: a corrective edit can land in a category repair
//! does not edit (an OFF written next to an EARLY, a rest day that
//! drops a date below minimum staffing), and those breaches must show
//! up in `unresolved` rather than pass silently.
//!
//! A pass rewrites each violation's cell to its expected value unless
//! the cell is locked. Locked violations are impossible by construction
//! (the locker wrote those cells to their expected values); hitting one
//! is logged as an invariant breach and skipped.
//!
//! Re-running repair on an already-repaired schedule with the same
//! context makes zero further changes: every corrective edit is a
//! deterministic function of the detection, and a cell at its expected
//! value is no longer detected.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::constraints::checks;
use crate::context::EngineContext;
use crate::models::{LockedCells, Schedule, Violation};

/// Maximum corrective passes per repair run.
const MAX_PASSES: usize = 3;

/// Summary of one repair run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSummary {
    /// Violations targeted across all passes.
    pub attempted: usize,
    /// Cells actually rewritten.
    pub repaired: usize,
    /// Violations still present after the final pass.
    pub remaining: usize,
    /// Passes executed.
    pub passes: usize,
    /// Whether the run ended with zero violations.
    pub success: bool,
}

/// Result of a repair run.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The repaired schedule.
    pub schedule: Schedule,
    /// Run summary.
    pub summary: RepairSummary,
    /// Violations that could not be repaired.
    pub unresolved: Vec<Violation>,
}

/// Enumerates repairable violations, sorted by registry order
/// (tier first, then intra-tier priority).
pub fn detect(schedule: &Schedule, ctx: &EngineContext, locked: &LockedCells) -> Vec<Violation> {
    let mut violations = Vec::new();
    violations.extend(checks::calendar_violations(schedule, ctx));
    violations.extend(checks::early_eligibility_violations(schedule, ctx));
    violations.extend(checks::consecutive_work_violations(schedule, ctx));
    violations.extend(checks::conflict_group_violations(schedule, ctx, locked));
    violations.sort_by(|a, b| ctx.registry.compare(a.constraint, b.constraint));
    violations
}

/// Runs bounded repair passes over the schedule.
pub fn repair(schedule: &Schedule, ctx: &EngineContext, locked: &LockedCells) -> RepairOutcome {
    let mut current = schedule.clone();
    let mut summary = RepairSummary::default();

    for pass in 1..=MAX_PASSES {
        let violations = detect(&current, ctx, locked);
        summary.passes = pass;
        if violations.is_empty() {
            debug!(pass, "repair reached a fixed point");
            break;
        }

        let mut repaired_this_pass = 0;
        for violation in &violations {
            let Some(expected) = violation.expected else {
                continue;
            };
            summary.attempted += 1;
            if locked.is_locked(&violation.staff, violation.date) {
                // The locker wrote locked cells to their expected values;
                // detecting one here means the lock contract was broken.
                error!(
                    staff = %violation.staff,
                    date = %violation.date,
                    constraint = %violation.constraint,
                    "repair hit a locked cell; lock contract broken upstream"
                );
                continue;
            }
            if current.get(&violation.staff, violation.date) == expected {
                // Already corrected by an earlier edit in this pass.
                continue;
            }
            current.set(&violation.staff, violation.date, expected);
            repaired_this_pass += 1;
        }
        summary.repaired += repaired_this_pass;

        if repaired_this_pass == 0 {
            // Stall: every remaining violation is unrepairable.
            warn!(
                pass,
                remaining = violations.len(),
                "repair stalled with violations remaining"
            );
            break;
        }
    }

    // Full tier-1 re-check: corrective edits may have breached a
    // category detect() does not enumerate.
    let unresolved = checks::all_tier1(&current, ctx, locked);
    summary.remaining = unresolved.len();
    summary.success = unresolved.is_empty();

    RepairOutcome {
        schedule: current,
        summary,
        unresolved,
    }
}
