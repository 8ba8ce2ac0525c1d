//! Schedule (roster grid) model.
//!
//! A schedule maps every (staff, date) cell in the requested range to a
//! [`ShiftSymbol`]. The type has plain value semantics: search
//! strategies clone it cheaply enough and mutate only their own copy,
//! so equality and diffing are explicit and testable.
//!
//! Absence convention: a cell that was never written reads as
//! [`ShiftSymbol::Normal`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::symbol::ShiftSymbol;

/// A complete roster: staff → date → symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    cells: BTreeMap<String, BTreeMap<NaiveDate, ShiftSymbol>>,
}

impl Schedule {
    /// Creates an empty schedule (every cell reads `Normal`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a cell. Unwritten cells are `Normal`.
    pub fn get(&self, staff: &str, date: NaiveDate) -> ShiftSymbol {
        self.cells
            .get(staff)
            .and_then(|row| row.get(&date))
            .copied()
            .unwrap_or_default()
    }

    /// Writes a cell.
    pub fn set(&mut self, staff: &str, date: NaiveDate, symbol: ShiftSymbol) {
        self.cells
            .entry(staff.to_string())
            .or_default()
            .insert(date, symbol);
    }

    /// Iterates every explicitly-written cell.
    pub fn cells(&self) -> impl Iterator<Item = (&str, NaiveDate, ShiftSymbol)> + '_ {
        self.cells.iter().flat_map(|(staff, row)| {
            row.iter().map(move |(date, sym)| (staff.as_str(), *date, *sym))
        })
    }

    /// Counts how many of the given dates carry `symbol` for `staff`.
    pub fn count_symbol(&self, staff: &str, dates: &[NaiveDate], symbol: ShiftSymbol) -> usize {
        dates.iter().filter(|d| self.get(staff, **d) == symbol).count()
    }

    /// Counts staff working (NORMAL or LATE) on a date.
    pub fn working_count(&self, roster: &[String], date: NaiveDate) -> usize {
        roster
            .iter()
            .filter(|s| self.get(s, date).is_working())
            .count()
    }

    /// Longest run of consecutive working days for `staff` over `dates`.
    ///
    /// `dates` must be ordered; a rest symbol (OFF or EARLY) breaks the run.
    pub fn max_consecutive_working(&self, staff: &str, dates: &[NaiveDate]) -> usize {
        let mut best = 0;
        let mut run = 0;
        for &d in dates {
            if self.get(staff, d).is_working() {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best
    }

    /// Whether every trailing window of `window` days within `dates`
    /// contains at least one rest day for `staff`.
    ///
    /// Windows shorter than `window` (at the start of the range) are
    /// not checked.
    pub fn has_rest_in_every_window(
        &self,
        staff: &str,
        dates: &[NaiveDate],
        window: usize,
    ) -> bool {
        if window == 0 || dates.len() < window {
            return true;
        }
        dates
            .windows(window)
            .all(|w| w.iter().any(|d| self.get(staff, *d).is_rest()))
    }

    /// Cells whose symbol differs between `self` and `other`,
    /// across the given roster and dates.
    pub fn diff(&self, other: &Schedule, roster: &[String], dates: &[NaiveDate]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for staff in roster {
            for &date in dates {
                let before = self.get(staff, date);
                let after = other.get(staff, date);
                if before != after {
                    changes.push(CellChange {
                        staff: staff.clone(),
                        date,
                        before,
                        after,
                        reason: String::new(),
                    });
                }
            }
        }
        changes
    }
}

/// One recorded cell mutation, with the reason it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    /// Staff identifier.
    pub staff: String,
    /// Affected date.
    pub date: NaiveDate,
    /// Symbol before the change.
    pub before: ShiftSymbol,
    /// Symbol after the change.
    pub after: ShiftSymbol,
    /// Why the change was made.
    pub reason: String,
}

impl CellChange {
    /// Creates a change record.
    pub fn new(
        staff: impl Into<String>,
        date: NaiveDate,
        before: ShiftSymbol,
        after: ShiftSymbol,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            staff: staff.into(),
            date,
            before,
            after,
            reason: reason.into(),
        }
    }
}

/// The set of cells pinned by the pre-generation locker.
///
/// Membership is a hard no-write invariant: once a cell is locked, no
/// downstream component may write it for the remainder of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedCells {
    cells: BTreeSet<(String, NaiveDate)>,
}

impl LockedCells {
    /// Creates an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks a cell.
    pub fn lock(&mut self, staff: &str, date: NaiveDate) {
        self.cells.insert((staff.to_string(), date));
    }

    /// Whether a cell is locked.
    pub fn is_locked(&self, staff: &str, date: NaiveDate) -> bool {
        self.cells.contains(&(staff.to_string(), date))
    }

    /// Iterates locked (staff, date) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> + '_ {
        self.cells.iter().map(|(s, d)| (s.as_str(), *d))
    }

    /// Number of locked cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cells are locked.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn week() -> Vec<NaiveDate> {
        (1..=7).map(day).collect()
    }

    #[test]
    fn test_unwritten_cell_is_normal() {
        let s = Schedule::new();
        assert_eq!(s.get("a", day(1)), ShiftSymbol::Normal);
    }

    #[test]
    fn test_set_get() {
        let mut s = Schedule::new();
        s.set("a", day(3), ShiftSymbol::Off);
        assert_eq!(s.get("a", day(3)), ShiftSymbol::Off);
        assert_eq!(s.get("a", day(4)), ShiftSymbol::Normal);
        assert_eq!(s.get("b", day(3)), ShiftSymbol::Normal);
    }

    #[test]
    fn test_count_symbol() {
        let mut s = Schedule::new();
        s.set("a", day(1), ShiftSymbol::Off);
        s.set("a", day(4), ShiftSymbol::Off);
        s.set("a", day(5), ShiftSymbol::Late);
        let dates = week();
        assert_eq!(s.count_symbol("a", &dates, ShiftSymbol::Off), 2);
        assert_eq!(s.count_symbol("a", &dates, ShiftSymbol::Late), 1);
        assert_eq!(s.count_symbol("a", &dates, ShiftSymbol::Normal), 4);
    }

    #[test]
    fn test_working_count() {
        let mut s = Schedule::new();
        let roster = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        s.set("a", day(1), ShiftSymbol::Off);
        s.set("b", day(1), ShiftSymbol::Late);
        // c unwritten → Normal → working
        assert_eq!(s.working_count(&roster, day(1)), 2);
    }

    #[test]
    fn test_max_consecutive_working() {
        let mut s = Schedule::new();
        let dates = week();
        // All Normal → 7 consecutive
        assert_eq!(s.max_consecutive_working("a", &dates), 7);

        s.set("a", day(4), ShiftSymbol::Off);
        assert_eq!(s.max_consecutive_working("a", &dates), 3);

        // EARLY also breaks the run
        s.set("a", day(4), ShiftSymbol::Early);
        assert_eq!(s.max_consecutive_working("a", &dates), 3);

        // LATE does not
        s.set("a", day(4), ShiftSymbol::Late);
        assert_eq!(s.max_consecutive_working("a", &dates), 7);
    }

    #[test]
    fn test_rest_window() {
        let mut s = Schedule::new();
        let dates = week();
        // No rest at all → fails a 5-day window
        assert!(!s.has_rest_in_every_window("a", &dates, 5));

        s.set("a", day(3), ShiftSymbol::Off);
        // Windows: 1-5 ok, 2-6 ok, 3-7 ok
        assert!(s.has_rest_in_every_window("a", &dates, 5));

        s.set("a", day(3), ShiftSymbol::Early);
        assert!(s.has_rest_in_every_window("a", &dates, 5));
    }

    #[test]
    fn test_rest_window_short_range() {
        let s = Schedule::new();
        let dates = vec![day(1), day(2)];
        // Range shorter than window → vacuously satisfied
        assert!(s.has_rest_in_every_window("a", &dates, 5));
    }

    #[test]
    fn test_diff() {
        let roster = vec!["a".to_string()];
        let dates = week();
        let mut before = Schedule::new();
        before.set("a", day(2), ShiftSymbol::Off);
        let mut after = before.clone();
        assert!(before.diff(&after, &roster, &dates).is_empty());

        after.set("a", day(2), ShiftSymbol::Early);
        after.set("a", day(6), ShiftSymbol::Late);
        let changes = before.diff(&after, &roster, &dates);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].before, ShiftSymbol::Off);
        assert_eq!(changes[0].after, ShiftSymbol::Early);
    }

    #[test]
    fn test_locked_cells() {
        let mut locks = LockedCells::new();
        assert!(locks.is_empty());
        locks.lock("a", day(1));
        locks.lock("a", day(1)); // Idempotent
        locks.lock("b", day(2));
        assert_eq!(locks.len(), 2);
        assert!(locks.is_locked("a", day(1)));
        assert!(!locks.is_locked("a", day(2)));
    }

    #[test]
    fn test_schedule_value_semantics() {
        let mut a = Schedule::new();
        a.set("x", day(1), ShiftSymbol::Off);
        let b = a.clone();
        a.set("x", day(1), ShiftSymbol::Late);
        assert_eq!(b.get("x", day(1)), ShiftSymbol::Off);
        assert_ne!(a, b);
    }
}
