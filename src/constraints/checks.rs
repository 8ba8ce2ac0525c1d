//! Tier-1 constraint checks.
//!
//! Two complementary views of the same rules:
//!
//! - [`would_violate`] — incremental filter asked before a single cell
//!   write. Strategies call it to keep candidate schedules inside the
//!   tier-1 feasible region during search.
//! - `*_violations` enumerators — full-schedule detectors producing
//!   concrete [`Violation`]s for scoring and repair.
//!
//! All functions are pure: they read the schedule and context and
//! never mutate either.

use chrono::NaiveDate;

use super::registry::ConstraintId;
use crate::context::EngineContext;
use crate::models::{CalendarRule, LockedCells, Schedule, ShiftSymbol, Violation};

const WEEKLY_WINDOW: usize = 7;

/// Checks whether writing `symbol` at (staff, date) would breach a
/// tier-1 constraint, given the rest of the schedule as-is.
///
/// Returns the first breached constraint in tier order, or `None` if
/// the write is safe.
pub fn would_violate(
    schedule: &Schedule,
    staff: &str,
    date: NaiveDate,
    symbol: ShiftSymbol,
    ctx: &EngineContext,
) -> Option<ConstraintId> {
    // Calendar rules pin the whole date.
    match ctx.calendar.rule(date) {
        Some(CalendarRule::MustWork) if !symbol.is_working() => {
            return Some(ConstraintId::CalendarMustWork);
        }
        Some(CalendarRule::MustDayOff) if !symbol.is_rest() => {
            return Some(ConstraintId::CalendarMustDayOff);
        }
        _ => {}
    }

    if symbol == ShiftSymbol::Early && !ctx.can_early(staff, date) {
        return Some(ConstraintId::EarlyEligibility);
    }

    if breaks_early_adjacency(schedule, staff, date, symbol, ctx) {
        return Some(ConstraintId::EarlyAdjacency);
    }

    if symbol.is_working() {
        if run_length_with(schedule, staff, date, ctx) > ctx.config.max_consecutive_work {
            return Some(ConstraintId::MaxConsecutiveWork);
        }
        if starves_rest_window(schedule, staff, date, ctx) {
            return Some(ConstraintId::RestWindow);
        }
    }

    if let Some(cap) = ctx.config.limits.weekly_cap(symbol) {
        if exceeds_rolling_cap(schedule, staff, date, symbol, cap, ctx) {
            return Some(ConstraintId::WeeklyShiftCap);
        }
    }
    if let Some(cap) = ctx.config.limits.monthly_cap(symbol) {
        let others = ctx
            .month_dates(date)
            .iter()
            .filter(|d| **d != date && schedule.get(staff, **d) == symbol)
            .count();
        if others + 1 > cap {
            return Some(ConstraintId::MonthlyShiftCap);
        }
    }

    if symbol.is_rest() && conflict_partner_resting(schedule, staff, date, ctx) {
        return Some(ConstraintId::ConflictGroup);
    }

    // Must-day-off dates rest the whole roster; the calendar mandate
    // outranks minimum staffing there.
    if !symbol.is_working()
        && schedule.get(staff, date).is_working()
        && !ctx.calendar.is_must_day_off(date)
    {
        let working = schedule.working_count(&ctx.staff_ids, date);
        if working.saturating_sub(1) + ctx.config.backup_count(date) < ctx.config.min_staff_per_day
        {
            return Some(ConstraintId::MinStaffing);
        }
    }

    None
}

fn breaks_early_adjacency(
    schedule: &Schedule,
    staff: &str,
    date: NaiveDate,
    symbol: ShiftSymbol,
    ctx: &EngineContext,
) -> bool {
    let idx = match ctx.date_index(date) {
        Some(i) => i,
        None => return false,
    };
    let neighbor = |i: usize| schedule.get(staff, ctx.dates[i]);

    let adjacent_rest = |i: usize| matches!(neighbor(i), ShiftSymbol::Off | ShiftSymbol::Early);
    match symbol {
        ShiftSymbol::Early => {
            (idx > 0 && adjacent_rest(idx - 1))
                || (idx + 1 < ctx.dates.len() && adjacent_rest(idx + 1))
        }
        ShiftSymbol::Off => {
            (idx > 0 && neighbor(idx - 1) == ShiftSymbol::Early)
                || (idx + 1 < ctx.dates.len() && neighbor(idx + 1) == ShiftSymbol::Early)
        }
        _ => false,
    }
}

/// Working-run length through `date` if the cell were set to a working symbol.
fn run_length_with(
    schedule: &Schedule,
    staff: &str,
    date: NaiveDate,
    ctx: &EngineContext,
) -> usize {
    let idx = match ctx.date_index(date) {
        Some(i) => i,
        None => return 1,
    };
    let mut run = 1;
    let mut i = idx;
    while i > 0 && schedule.get(staff, ctx.dates[i - 1]).is_working() {
        run += 1;
        i -= 1;
    }
    let mut j = idx + 1;
    while j < ctx.dates.len() && schedule.get(staff, ctx.dates[j]).is_working() {
        run += 1;
        j += 1;
    }
    run
}

/// Whether making (staff, date) a working day leaves some trailing
/// rest window with no rest day at all.
fn starves_rest_window(
    schedule: &Schedule,
    staff: &str,
    date: NaiveDate,
    ctx: &EngineContext,
) -> bool {
    let window = ctx.config.rest_window_days;
    if window == 0 || ctx.dates.len() < window {
        return false;
    }
    ctx.dates.windows(window).any(|w| {
        w.contains(&date)
            && w.iter()
                .all(|d| *d == date || !schedule.get(staff, *d).is_rest())
    })
}

fn exceeds_rolling_cap(
    schedule: &Schedule,
    staff: &str,
    date: NaiveDate,
    symbol: ShiftSymbol,
    cap: usize,
    ctx: &EngineContext,
) -> bool {
    if ctx.dates.len() < WEEKLY_WINDOW {
        // Short ranges still honor the cap over the whole range.
        let others = ctx
            .dates
            .iter()
            .filter(|d| **d != date && schedule.get(staff, **d) == symbol)
            .count();
        return others + 1 > cap;
    }
    ctx.dates.windows(WEEKLY_WINDOW).any(|w| {
        w.contains(&date)
            && w.iter()
                .filter(|d| **d != date && schedule.get(staff, **d) == symbol)
                .count()
                + 1
                > cap
    })
}

fn conflict_partner_resting(
    schedule: &Schedule,
    staff: &str,
    date: NaiveDate,
    ctx: &EngineContext,
) -> bool {
    ctx.conflict_groups_of(staff).iter().any(|g| {
        g.members
            .iter()
            .any(|m| m != staff && schedule.get(m, date).is_rest())
    })
}

// ======================== Detectors ========================

/// Calendar-rule mismatches: MUST_WORK cells not working, MUST_DAY_OFF
/// cells not resting. Expected values are what the locker would write.
pub fn calendar_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for (date, rule) in ctx.calendar.iter() {
        if !ctx.dates.contains(&date) {
            continue;
        }
        for staff in &ctx.staff_ids {
            let found = schedule.get(staff, date);
            match rule {
                CalendarRule::MustWork if !found.is_working() => {
                    out.push(Violation::with_expected(
                        ConstraintId::CalendarMustWork,
                        staff,
                        date,
                        found,
                        ShiftSymbol::Normal,
                        ctx.registry.severity(ConstraintId::CalendarMustWork),
                        format!("{found} on must-work date {date}"),
                    ));
                }
                CalendarRule::MustDayOff if !found.is_rest() => {
                    let expected = if ctx.can_early(staff, date) {
                        ShiftSymbol::Early
                    } else {
                        ShiftSymbol::Off
                    };
                    out.push(Violation::with_expected(
                        ConstraintId::CalendarMustDayOff,
                        staff,
                        date,
                        found,
                        expected,
                        ctx.registry.severity(ConstraintId::CalendarMustDayOff),
                        format!("{found} on must-day-off date {date}"),
                    ));
                }
                _ => {}
            }
        }
    }
    out
}

/// EARLY cells held without permission. Expected correction: NORMAL.
pub fn early_eligibility_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for staff in &ctx.staff_ids {
        for &date in &ctx.dates {
            if schedule.get(staff, date) == ShiftSymbol::Early && !ctx.can_early(staff, date) {
                out.push(Violation::with_expected(
                    ConstraintId::EarlyEligibility,
                    staff,
                    date,
                    ShiftSymbol::Early,
                    ShiftSymbol::Normal,
                    ctx.registry.severity(ConstraintId::EarlyEligibility),
                    format!("EARLY without permission on {date}"),
                ));
            }
        }
    }
    out
}

/// EARLY cells directly adjacent to OFF or another EARLY.
pub fn early_adjacency_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for staff in &ctx.staff_ids {
        for pair in ctx.dates.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (sa, sb) = (schedule.get(staff, a), schedule.get(staff, b));
            let clash = (sa == ShiftSymbol::Early && sb.is_rest())
                || (sb == ShiftSymbol::Early && sa.is_rest());
            if clash {
                let (date, found) = if sa == ShiftSymbol::Early { (a, sa) } else { (b, sb) };
                out.push(Violation::observed(
                    ConstraintId::EarlyAdjacency,
                    staff,
                    date,
                    found,
                    ctx.registry.severity(ConstraintId::EarlyAdjacency),
                    format!("EARLY adjacent to a rest day around {date}"),
                ));
            }
        }
    }
    out
}

/// Working runs longer than the configured maximum.
///
/// The violation lands on the first day past the cap, with a rest
/// symbol as the expected correction. The scan then treats that day as
/// repaired, so one long run yields one violation per cap-length
/// segment rather than one per extra day.
pub fn consecutive_work_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let max = ctx.config.max_consecutive_work;
    let mut out = Vec::new();
    for staff in &ctx.staff_ids {
        let mut run = 0;
        for &date in &ctx.dates {
            if schedule.get(staff, date).is_working() {
                run += 1;
                if run > max {
                    let expected = if ctx.can_early(staff, date)
                        && !breaks_early_adjacency(schedule, staff, date, ShiftSymbol::Early, ctx)
                    {
                        ShiftSymbol::Early
                    } else {
                        ShiftSymbol::Off
                    };
                    out.push(Violation::with_expected(
                        ConstraintId::MaxConsecutiveWork,
                        staff,
                        date,
                        schedule.get(staff, date),
                        expected,
                        ctx.registry.severity(ConstraintId::MaxConsecutiveWork),
                        format!("working day {run} in a row on {date} (max {max})"),
                    ));
                    run = 0;
                }
            } else {
                run = 0;
            }
        }
    }
    out
}

/// Trailing rest windows containing no rest day, attributed to the
/// window's last date.
pub fn rest_window_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let window = ctx.config.rest_window_days;
    let mut out = Vec::new();
    if window == 0 || ctx.dates.len() < window {
        return out;
    }
    for staff in &ctx.staff_ids {
        for w in ctx.dates.windows(window) {
            if w.iter().all(|d| !schedule.get(staff, *d).is_rest()) {
                let date = w[window - 1];
                out.push(Violation::observed(
                    ConstraintId::RestWindow,
                    staff,
                    date,
                    schedule.get(staff, date),
                    ctx.registry.severity(ConstraintId::RestWindow),
                    format!("no rest day in the {window} days ending {date}"),
                ));
            }
        }
    }
    out
}

/// Rolling 7-day cap breaches, attributed to each window's last date.
pub fn weekly_cap_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let mut out = Vec::new();
    if ctx.dates.len() < WEEKLY_WINDOW {
        return out;
    }
    for staff in &ctx.staff_ids {
        for symbol in [ShiftSymbol::Off, ShiftSymbol::Early, ShiftSymbol::Late] {
            let cap = match ctx.config.limits.weekly_cap(symbol) {
                Some(c) => c,
                None => continue,
            };
            for w in ctx.dates.windows(WEEKLY_WINDOW) {
                let count = w.iter().filter(|d| schedule.get(staff, **d) == symbol).count();
                if count > cap {
                    let date = w[WEEKLY_WINDOW - 1];
                    out.push(Violation::observed(
                        ConstraintId::WeeklyShiftCap,
                        staff,
                        date,
                        schedule.get(staff, date),
                        ctx.registry.severity(ConstraintId::WeeklyShiftCap),
                        format!("{count} {symbol} in the 7 days ending {date} (cap {cap})"),
                    ));
                }
            }
        }
    }
    out
}

/// Calendar-month cap breaches.
pub fn monthly_cap_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut months: Vec<NaiveDate> = Vec::new();
    for &d in &ctx.dates {
        if !months
            .iter()
            .any(|m| chrono::Datelike::month(m) == chrono::Datelike::month(&d)
                && chrono::Datelike::year(m) == chrono::Datelike::year(&d))
        {
            months.push(d);
        }
    }
    for staff in &ctx.staff_ids {
        for &month_anchor in &months {
            let month = ctx.month_dates(month_anchor);
            for symbol in [ShiftSymbol::Off, ShiftSymbol::Early, ShiftSymbol::Late] {
                let cap = match ctx.config.limits.monthly_cap(symbol) {
                    Some(c) => c,
                    None => continue,
                };
                let count = schedule.count_symbol(staff, &month, symbol);
                if count > cap {
                    let date = *month.last().unwrap_or(&month_anchor);
                    out.push(Violation::observed(
                        ConstraintId::MonthlyShiftCap,
                        staff,
                        date,
                        schedule.get(staff, date),
                        ctx.registry.severity(ConstraintId::MonthlyShiftCap),
                        format!("{count} {symbol} in month of {month_anchor} (cap {cap})"),
                    ));
                }
            }
        }
    }
    out
}

/// Conflict-group breaches: more than one member resting on the same
/// date. One member keeps the rest day (a locked member if any,
/// otherwise the first in group order); every other resting member
/// gets an expected NORMAL correction.
pub fn conflict_group_violations(
    schedule: &Schedule,
    ctx: &EngineContext,
    locked: &LockedCells,
) -> Vec<Violation> {
    let mut out = Vec::new();
    for group in &ctx.config.conflict_groups {
        for &date in &ctx.dates {
            let resting: Vec<&String> = group
                .members
                .iter()
                .filter(|m| schedule.get(m, date).is_rest())
                .collect();
            if resting.len() <= 1 {
                continue;
            }
            let keeper = resting
                .iter()
                .find(|m| locked.is_locked(m, date))
                .copied()
                .unwrap_or(resting[0]);
            for member in &resting {
                if *member == keeper {
                    continue;
                }
                out.push(Violation::with_expected(
                    ConstraintId::ConflictGroup,
                    member.as_str(),
                    date,
                    schedule.get(member, date),
                    ShiftSymbol::Normal,
                    ctx.registry.severity(ConstraintId::ConflictGroup),
                    format!(
                        "{} members of '{}' resting on {date}",
                        resting.len(),
                        group.name
                    ),
                ));
            }
        }
    }
    out
}

/// Dates with fewer working staff (plus backups) than the minimum.
/// Must-day-off dates are exempt: the calendar mandate outranks
/// staffing.
pub fn min_staffing_violations(schedule: &Schedule, ctx: &EngineContext) -> Vec<Violation> {
    let mut out = Vec::new();
    for &date in &ctx.dates {
        if ctx.calendar.is_must_day_off(date) {
            continue;
        }
        let working = schedule.working_count(&ctx.staff_ids, date) + ctx.config.backup_count(date);
        if working < ctx.config.min_staff_per_day {
            out.push(Violation::observed(
                ConstraintId::MinStaffing,
                "*",
                date,
                ShiftSymbol::Off,
                ctx.registry.severity(ConstraintId::MinStaffing),
                format!(
                    "{working} staff working on {date} (min {})",
                    ctx.config.min_staff_per_day
                ),
            ));
        }
    }
    out
}

/// All tier-1 violations, sorted by registry order (tier, then priority).
pub fn all_tier1(schedule: &Schedule, ctx: &EngineContext, locked: &LockedCells) -> Vec<Violation> {
    let mut all = Vec::new();
    all.extend(calendar_violations(schedule, ctx));
    all.extend(early_eligibility_violations(schedule, ctx));
    all.extend(early_adjacency_violations(schedule, ctx));
    all.extend(consecutive_work_violations(schedule, ctx));
    all.extend(rest_window_violations(schedule, ctx));
    all.extend(weekly_cap_violations(schedule, ctx));
    all.extend(monthly_cap_violations(schedule, ctx));
    all.extend(conflict_group_violations(schedule, ctx, locked));
    all.extend(min_staffing_violations(schedule, ctx));
    all.sort_by(|a, b| ctx.registry.compare(a.constraint, b.constraint));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConflictGroup, EarlyPermissions, EngineConfig};
    use crate::models::{date_range, CalendarRules, Staff};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn ctx_two_staff() -> EngineContext {
        let dates = date_range(day(1), day(14));
        let perms = EarlyPermissions::new().grant_all("alice", &dates);
        EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            CalendarRules::new(),
            perms,
            EngineConfig::new(),
        )
    }

    #[test]
    fn test_early_requires_permission() {
        let ctx = ctx_two_staff();
        let s = Schedule::new();
        assert_eq!(
            would_violate(&s, "bob", day(3), ShiftSymbol::Early, &ctx),
            Some(ConstraintId::EarlyEligibility)
        );
        assert_eq!(would_violate(&s, "alice", day(3), ShiftSymbol::Early, &ctx), None);
    }

    #[test]
    fn test_early_adjacency_filter() {
        let ctx = ctx_two_staff();
        let mut s = Schedule::new();
        s.set("alice", day(4), ShiftSymbol::Off);
        assert_eq!(
            would_violate(&s, "alice", day(5), ShiftSymbol::Early, &ctx),
            Some(ConstraintId::EarlyAdjacency)
        );
        // OFF next to an existing EARLY is also blocked
        let mut s2 = Schedule::new();
        s2.set("alice", day(5), ShiftSymbol::Early);
        assert_eq!(
            would_violate(&s2, "alice", day(6), ShiftSymbol::Off, &ctx),
            Some(ConstraintId::EarlyAdjacency)
        );
    }

    #[test]
    fn test_consecutive_run_filter() {
        let ctx = ctx_two_staff();
        let mut s = Schedule::new();
        // bob rests on day 8; days 1-7 default to Normal
        s.set("bob", day(8), ShiftSymbol::Off);
        // Day 7 would be the 7th consecutive working day
        assert_eq!(
            would_violate(&s, "bob", day(7), ShiftSymbol::Normal, &ctx),
            Some(ConstraintId::MaxConsecutiveWork)
        );
    }

    #[test]
    fn test_weekly_cap_filter() {
        let ctx = ctx_two_staff();
        let mut s = Schedule::new();
        s.set("bob", day(2), ShiftSymbol::Off);
        s.set("bob", day(4), ShiftSymbol::Off);
        // Third OFF within days 1-7 exceeds the default weekly cap of 2
        assert_eq!(
            would_violate(&s, "bob", day(6), ShiftSymbol::Off, &ctx),
            Some(ConstraintId::WeeklyShiftCap)
        );
    }

    #[test]
    fn test_conflict_group_filter() {
        let dates = date_range(day(1), day(7));
        let config = EngineConfig::new()
            .with_conflict_group(ConflictGroup::new("g", vec!["alice".into(), "bob".into()]));
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            config,
        );
        let mut s = Schedule::new();
        s.set("alice", day(3), ShiftSymbol::Off);
        assert_eq!(
            would_violate(&s, "bob", day(3), ShiftSymbol::Off, &ctx),
            Some(ConstraintId::ConflictGroup)
        );
        assert_eq!(would_violate(&s, "bob", day(4), ShiftSymbol::Off, &ctx), None);
    }

    #[test]
    fn test_min_staffing_filter() {
        let dates = date_range(day(1), day(7));
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            EngineConfig::new().with_min_staff(2),
        );
        let s = Schedule::new(); // Both working everywhere
        assert_eq!(
            would_violate(&s, "alice", day(3), ShiftSymbol::Off, &ctx),
            Some(ConstraintId::MinStaffing)
        );
    }

    #[test]
    fn test_min_staffing_exempts_must_day_off_dates() {
        let dates = date_range(day(1), day(7));
        let calendar = CalendarRules::new().with_rule(day(3), CalendarRule::MustDayOff);
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            calendar,
            EarlyPermissions::new(),
            EngineConfig::new(),
        );
        let mut s = Schedule::new();
        s.set("alice", day(3), ShiftSymbol::Off);
        s.set("bob", day(3), ShiftSymbol::Off);
        assert!(min_staffing_violations(&s, &ctx).is_empty());
        // Resting the second member on the mandated date is not refused
        let mut partial = Schedule::new();
        partial.set("alice", day(3), ShiftSymbol::Off);
        assert_eq!(would_violate(&partial, "bob", day(3), ShiftSymbol::Off, &ctx), None);
    }

    #[test]
    fn test_calendar_detector_expected_values() {
        let dates = date_range(day(1), day(7));
        let calendar = CalendarRules::new().with_rule(day(3), CalendarRule::MustDayOff);
        let perms = EarlyPermissions::new().grant("alice", day(3));
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            calendar,
            perms,
            EngineConfig::new(),
        );
        let s = Schedule::new(); // Everyone Normal on the must-day-off date
        let violations = calendar_violations(&s, &ctx);
        assert_eq!(violations.len(), 2);
        let alice = violations.iter().find(|v| v.staff == "alice").unwrap();
        let bob = violations.iter().find(|v| v.staff == "bob").unwrap();
        assert_eq!(alice.expected, Some(ShiftSymbol::Early));
        assert_eq!(bob.expected, Some(ShiftSymbol::Off));
    }

    #[test]
    fn test_consecutive_detector_flags_once_per_segment() {
        let ctx = ctx_two_staff();
        let s = Schedule::new(); // 14 straight working days
        let violations = consecutive_work_violations(&s, &ctx);
        let bob: Vec<_> = violations.iter().filter(|v| v.staff == "bob").collect();
        // Days 7 and 14 (run resets after each flagged day)
        assert_eq!(bob.len(), 2);
        assert_eq!(bob[0].date, day(7));
        assert_eq!(bob[1].date, day(14));
        assert_eq!(bob[0].expected, Some(ShiftSymbol::Off));
    }

    #[test]
    fn test_conflict_group_detector_prefers_locked_keeper() {
        let dates = date_range(day(1), day(7));
        let config = EngineConfig::new()
            .with_conflict_group(ConflictGroup::new("g", vec!["alice".into(), "bob".into()]));
        let ctx = EngineContext::new(
            vec![Staff::new("alice"), Staff::new("bob")],
            dates,
            CalendarRules::new(),
            EarlyPermissions::new(),
            config,
        );
        let mut s = Schedule::new();
        s.set("alice", day(3), ShiftSymbol::Off);
        s.set("bob", day(3), ShiftSymbol::Off);

        let mut locked = LockedCells::new();
        locked.lock("bob", day(3));
        let violations = conflict_group_violations(&s, &ctx, &locked);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].staff, "alice");
        assert_eq!(violations[0].expected, Some(ShiftSymbol::Normal));
    }

    #[test]
    fn test_all_tier1_sorted_by_registry() {
        let ctx = ctx_two_staff();
        let mut s = Schedule::new();
        s.set("bob", day(2), ShiftSymbol::Early); // Eligibility breach
        let violations = all_tier1(&s, &ctx, &LockedCells::new());
        assert!(!violations.is_empty());
        // Sorted: no later entry outranks an earlier one
        for w in violations.windows(2) {
            assert_ne!(
                ctx.registry.compare(w[1].constraint, w[0].constraint),
                std::cmp::Ordering::Less
            );
        }
    }

    #[test]
    fn test_clean_schedule_has_no_tier1() {
        let ctx = ctx_two_staff();
        let mut s = Schedule::new();
        // Give both staff a legal rest cadence: OFF every 4th day,
        // spaced to satisfy rest windows and weekly caps.
        for (i, &d) in ctx.dates.iter().enumerate() {
            if i % 4 == 2 {
                s.set("alice", d, ShiftSymbol::Off);
            }
            if i % 4 == 0 {
                s.set("bob", d, ShiftSymbol::Off);
            }
        }
        let violations = all_tier1(&s, &ctx, &LockedCells::new());
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }
}
