//! Pre-generation cell locking.
//!
//! Calendar-mandated assignments are pinned before any search begins:
//! every staff cell on a MUST_WORK date becomes NORMAL, every staff
//! cell on a MUST_DAY_OFF date becomes EARLY (when the member holds
//! early-shift permission for that date) or OFF. Locked cells are
//! immutable for the remainder of the run; every downstream component
//! treats lock membership as a hard no-write invariant.
//!
//! [`verify_locks`] is an invariant check, not error recovery: a
//! changed locked cell means a downstream component broke the lock
//! contract, which is a programming defect.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::context::EngineContext;
use crate::models::{CalendarRule, CellChange, LockedCells, Schedule, ShiftSymbol};

/// Result of the pre-generation locking pass.
#[derive(Debug, Clone)]
pub struct LockOutcome {
    /// Schedule with calendar-mandated cells written.
    pub schedule: Schedule,
    /// The locked cell set.
    pub locked: LockedCells,
    /// One entry per locked cell, with reason.
    pub changes: Vec<CellChange>,
    /// Counts by lock category.
    pub summary: LockSummary,
}

/// Counts of locked cells by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSummary {
    /// Cells pinned to NORMAL by MUST_WORK dates.
    pub must_work: usize,
    /// Cells pinned to EARLY by MUST_DAY_OFF dates.
    pub must_day_off_early: usize,
    /// Cells pinned to OFF by MUST_DAY_OFF dates.
    pub must_day_off_off: usize,
}

impl LockSummary {
    /// Total locked cells.
    pub fn total(&self) -> usize {
        self.must_work + self.must_day_off_early + self.must_day_off_off
    }
}

/// A locked cell whose value changed despite the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockBreach {
    /// Staff identifier.
    pub staff: String,
    /// Affected date.
    pub date: chrono::NaiveDate,
    /// Value written at lock time.
    pub locked_value: ShiftSymbol,
    /// Value found afterwards.
    pub found: ShiftSymbol,
}

/// Pins every calendar-mandated cell of `seed` and locks it.
///
/// Cells not touched by a calendar rule pass through unchanged.
pub fn lock_calendar_cells(seed: &Schedule, ctx: &EngineContext) -> LockOutcome {
    let mut schedule = seed.clone();
    let mut locked = LockedCells::new();
    let mut changes = Vec::new();
    let mut summary = LockSummary::default();

    for (date, rule) in ctx.calendar.iter() {
        if !ctx.dates.contains(&date) {
            continue;
        }
        for staff in &ctx.staff_ids {
            let before = schedule.get(staff, date);
            let (after, reason) = match rule {
                CalendarRule::MustWork => {
                    summary.must_work += 1;
                    (ShiftSymbol::Normal, "calendar must-work")
                }
                CalendarRule::MustDayOff => {
                    if ctx.can_early(staff, date) {
                        summary.must_day_off_early += 1;
                        (ShiftSymbol::Early, "calendar must-day-off (early permitted)")
                    } else {
                        summary.must_day_off_off += 1;
                        (ShiftSymbol::Off, "calendar must-day-off")
                    }
                }
            };
            schedule.set(staff, date, after);
            locked.lock(staff, date);
            changes.push(CellChange::new(staff, date, before, after, reason));
        }
    }

    debug!(
        locked = locked.len(),
        must_work = summary.must_work,
        early = summary.must_day_off_early,
        off = summary.must_day_off_off,
        "calendar cells locked"
    );

    LockOutcome {
        schedule,
        locked,
        changes,
        summary,
    }
}

/// Compares a post-generation schedule against the schedule as it stood
/// immediately after locking and reports every locked cell whose value
/// changed.
///
/// Any breach is a lock-contract defect in a downstream component; it
/// is logged at error level and returned for diagnostics, never
/// silently repaired.
pub fn verify_locks(
    locked_schedule: &Schedule,
    locked: &LockedCells,
    final_schedule: &Schedule,
) -> Vec<LockBreach> {
    let mut breaches = Vec::new();
    for (staff, date) in locked.iter() {
        let locked_value = locked_schedule.get(staff, date);
        let found = final_schedule.get(staff, date);
        if locked_value != found {
            error!(
                staff,
                %date,
                %locked_value,
                %found,
                "locked cell was rewritten downstream"
            );
            breaches.push(LockBreach {
                staff: staff.to_string(),
                date,
                locked_value,
                found,
            });
        }
    }
    breaches
}
