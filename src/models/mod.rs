//! Roster domain models.
//!
//! Core data types for representing roster generation problems and
//! solutions: shift symbols, staff, calendar rules, the schedule grid,
//! locked cells, and constraint violations.

mod calendar;
mod schedule;
mod staff;
mod symbol;
mod violation;

pub use calendar::{date_range, CalendarRule, CalendarRules};
pub use schedule::{CellChange, LockedCells, Schedule};
pub use staff::{EmploymentClass, Staff};
pub use symbol::{ShiftSymbol, SymbolToken};
pub use violation::{Severity, Violation};
