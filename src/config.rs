//! Engine configuration snapshot.
//!
//! All configuration is loaded once per request into an immutable
//! [`EngineConfig`] and passed by reference through every component.
//! Nothing in the engine mutates it and no configuration state is
//! shared across requests, so one request's settings can never leak
//! into another's.
//!
//! Dynamic priority rules arrive from providers in more than one raw
//! shape; they are normalized at this boundary into the single tagged
//! [`RuleCondition`] type. The engine never branches on raw shape.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::models::ShiftSymbol;

/// Rolling and calendar-month shift-count caps per staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftLimits {
    /// Max OFF days in any trailing 7-day window.
    pub weekly_off_max: usize,
    /// Max EARLY days in any trailing 7-day window.
    pub weekly_early_max: usize,
    /// Max LATE days in any trailing 7-day window.
    pub weekly_late_max: usize,
    /// Max OFF days per calendar month.
    pub monthly_off_max: usize,
    /// Max EARLY days per calendar month.
    pub monthly_early_max: usize,
    /// Max LATE days per calendar month.
    pub monthly_late_max: usize,
}

impl Default for ShiftLimits {
    fn default() -> Self {
        Self {
            weekly_off_max: 2,
            weekly_early_max: 2,
            weekly_late_max: 3,
            monthly_off_max: 9,
            monthly_early_max: 8,
            monthly_late_max: 12,
        }
    }
}

impl ShiftLimits {
    /// Weekly cap for a symbol. NORMAL is uncapped.
    pub fn weekly_cap(&self, symbol: ShiftSymbol) -> Option<usize> {
        match symbol {
            ShiftSymbol::Off => Some(self.weekly_off_max),
            ShiftSymbol::Early => Some(self.weekly_early_max),
            ShiftSymbol::Late => Some(self.weekly_late_max),
            ShiftSymbol::Normal => None,
        }
    }

    /// Monthly cap for a symbol. NORMAL is uncapped.
    pub fn monthly_cap(&self, symbol: ShiftSymbol) -> Option<usize> {
        match symbol {
            ShiftSymbol::Off => Some(self.monthly_off_max),
            ShiftSymbol::Early => Some(self.monthly_early_max),
            ShiftSymbol::Late => Some(self.monthly_late_max),
            ShiftSymbol::Normal => None,
        }
    }
}

/// A named group of staff of whom at most one may rest per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictGroup {
    /// Group name.
    pub name: String,
    /// Member staff ids.
    pub members: Vec<String>,
}

impl ConflictGroup {
    /// Creates a conflict group.
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// Normalized condition of a dynamic priority rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleCondition {
    /// A specific staff member gets a specific symbol on a specific date.
    FixedAssignment {
        staff: String,
        date: NaiveDate,
        symbol: ShiftSymbol,
    },
    /// A symbol preference for a weekday, optionally scoped to one member.
    WeekdaySymbol {
        staff: Option<String>,
        weekday: Weekday,
        symbol: ShiftSymbol,
    },
    /// At most `max` members of a set may hold `symbol` on any one date.
    GroupDailyLimit {
        members: Vec<String>,
        symbol: ShiftSymbol,
        max: usize,
    },
}

/// A dynamic priority rule, normalized at the provider boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRule {
    /// Rule identifier.
    pub id: String,
    /// Lower number = applied first.
    pub priority: u8,
    /// What the rule asks for.
    pub condition: RuleCondition,
}

/// Per-(staff, date) early-shift permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyPermissions {
    granted: BTreeSet<(String, NaiveDate)>,
}

impl EarlyPermissions {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants permission for one (staff, date).
    pub fn grant(mut self, staff: impl Into<String>, date: NaiveDate) -> Self {
        self.granted.insert((staff.into(), date));
        self
    }

    /// Grants permission for a staff member across all given dates.
    pub fn grant_all(mut self, staff: impl Into<String>, dates: &[NaiveDate]) -> Self {
        let staff = staff.into();
        for &d in dates {
            self.granted.insert((staff.clone(), d));
        }
        self
    }

    /// Whether the staff member holds permission for the date.
    pub fn allows(&self, staff: &str, date: NaiveDate) -> bool {
        self.granted.contains(&(staff.to_string(), date))
    }

    /// Staff with at least one grant, deduplicated, in order.
    pub fn staff_ids(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (staff, _) in &self.granted {
            if out.last() != Some(&staff.as_str()) {
                out.push(staff);
            }
        }
        out
    }
}

/// Resource budget for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationBudget {
    /// Hard cap on search iterations.
    pub max_iterations: usize,
    /// Wall-clock limit for the whole run.
    pub time_limit: Duration,
    /// Stop after this many iterations without improvement.
    pub stagnation_limit: usize,
    /// Stop once the score reaches this value.
    pub target_score: f64,
}

impl Default for GenerationBudget {
    fn default() -> Self {
        Self {
            max_iterations: 60,
            time_limit: Duration::from_secs(10),
            stagnation_limit: 12,
            target_score: 97.0,
        }
    }
}

/// Immutable per-request engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shift-count caps.
    pub limits: ShiftLimits,
    /// Longest permitted run of consecutive working days.
    pub max_consecutive_work: usize,
    /// Trailing window that must contain a rest day.
    pub rest_window_days: usize,
    /// Minimum staff working each date.
    pub min_staff_per_day: usize,
    /// Conflict groups (at most one member rests per date).
    pub conflict_groups: Vec<ConflictGroup>,
    /// Normalized dynamic priority rules.
    pub priority_rules: Vec<PriorityRule>,
    /// Backup staff counted toward a date's coverage.
    pub backup_staff: BTreeMap<NaiveDate, Vec<String>>,
    /// Search budget.
    pub budget: GenerationBudget,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ShiftLimits::default(),
            max_consecutive_work: 6,
            rest_window_days: 5,
            min_staff_per_day: 1,
            conflict_groups: Vec::new(),
            priority_rules: Vec::new(),
            backup_staff: BTreeMap::new(),
            budget: GenerationBudget::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with conservative defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets shift-count limits.
    pub fn with_limits(mut self, limits: ShiftLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the minimum working staff per date.
    pub fn with_min_staff(mut self, min: usize) -> Self {
        self.min_staff_per_day = min;
        self
    }

    /// Adds a conflict group.
    pub fn with_conflict_group(mut self, group: ConflictGroup) -> Self {
        self.conflict_groups.push(group);
        self
    }

    /// Adds a priority rule.
    pub fn with_priority_rule(mut self, rule: PriorityRule) -> Self {
        self.priority_rules.push(rule);
        self
    }

    /// Registers backup staff for a date.
    pub fn with_backup_staff(mut self, date: NaiveDate, staff: Vec<String>) -> Self {
        self.backup_staff.insert(date, staff);
        self
    }

    /// Sets the search budget.
    pub fn with_budget(mut self, budget: GenerationBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Priority rules sorted by ascending priority number.
    pub fn sorted_priority_rules(&self) -> Vec<&PriorityRule> {
        let mut rules: Vec<_> = self.priority_rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// Backup headcount configured for a date.
    pub fn backup_count(&self, date: NaiveDate) -> usize {
        self.backup_staff.get(&date).map(|v| v.len()).unwrap_or(0)
    }
}

/// Normalizes raw provider rule data into [`PriorityRule`]s.
///
/// Providers emit rules either as an array of rule objects or as one
/// nested object keyed by rule id. Both shapes collapse here; the rest
/// of the engine sees only the normalized form.
pub fn normalize_priority_rules(raw: RawPriorityRules) -> Vec<PriorityRule> {
    match raw {
        RawPriorityRules::List(rules) => rules,
        RawPriorityRules::Keyed(map) => {
            let mut rules: Vec<PriorityRule> = map
                .into_iter()
                .map(|(id, body)| PriorityRule {
                    id,
                    priority: body.priority,
                    condition: body.condition,
                })
                .collect();
            rules.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.id.cmp(&b.id)));
            rules
        }
    }
}

/// Raw priority-rule payload as received from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPriorityRules {
    /// Array-of-objects shape.
    List(Vec<PriorityRule>),
    /// Nested-object shape keyed by rule id.
    Keyed(BTreeMap<String, RawRuleBody>),
}

/// Body of one rule in the keyed shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRuleBody {
    /// Lower number = applied first.
    pub priority: u8,
    /// What the rule asks for.
    pub condition: RuleCondition,
}
