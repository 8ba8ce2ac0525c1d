//! Calendar rule model.
//!
//! Calendar rules pin whole dates before generation: a `MustWork` date
//! forces every staff member to work, a `MustDayOff` date forces every
//! staff member onto a rest symbol. Rules are authoritative and
//! immutable for the duration of one generation run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A calendar-mandated rule for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarRule {
    /// Every staff member works this date.
    MustWork,
    /// Every staff member has a rest symbol this date
    /// (EARLY if permitted, otherwise OFF).
    MustDayOff,
}

/// Date-keyed calendar rules for a generation run.
///
/// Read-only snapshot: built once from the calendar provider and
/// passed by reference through every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarRules {
    rules: BTreeMap<NaiveDate, CalendarRule>,
}

impl CalendarRules {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for a date.
    pub fn with_rule(mut self, date: NaiveDate, rule: CalendarRule) -> Self {
        self.rules.insert(date, rule);
        self
    }

    /// Returns the rule for a date, if any.
    pub fn rule(&self, date: NaiveDate) -> Option<CalendarRule> {
        self.rules.get(&date).copied()
    }

    /// Whether the date is calendar-mandated work.
    pub fn is_must_work(&self, date: NaiveDate) -> bool {
        self.rule(date) == Some(CalendarRule::MustWork)
    }

    /// Whether the date is calendar-mandated rest.
    pub fn is_must_day_off(&self, date: NaiveDate) -> bool {
        self.rule(date) == Some(CalendarRule::MustDayOff)
    }

    /// Iterates over all (date, rule) pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, CalendarRule)> + '_ {
        self.rules.iter().map(|(d, r)| (*d, *r))
    }

    /// Number of ruled dates.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no dates are ruled.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builds an inclusive, ordered date range.
///
/// Returns an empty vector if `end < start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut d = start;
    while d <= end {
        dates.push(d);
        match d.succ_opt() {
            Some(next) => d = next,
            None => break,
        }
    }
    dates
}
