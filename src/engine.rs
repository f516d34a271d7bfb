//! Alert eligibility — the pure decision over (now, schedule, lead).
//!
//! No I/O and no clock access here: the caller snapshots `now` once per
//! sweep and passes it in, which keeps the window arithmetic testable to
//! the second.

use chrono::{DateTime, Datelike, Duration};
use chrono_tz::Tz;

use crate::schedule::Schedule;

/// Why a schedule did not fire on this check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Schedule is toggled off.
    Disabled,
    /// Today's weekday is not in the schedule's day set.
    WrongWeekday,
    /// Already fired on today's calendar date (the dedup gate).
    AlreadyFiredToday,
    /// `now` is before the alert window opens or at/after the target.
    OutsideWindow,
    /// The target local time cannot be represented today (DST gap), or
    /// the stored time string is unparseable. Creation validation makes
    /// the latter unreachable in practice.
    UnrepresentableTarget,
}

/// Outcome of evaluating one schedule at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Present the alert now; `target` is the nominal due time shown to
    /// the user.
    Fire { target: DateTime<Tz> },
    Skip(SkipReason),
}

/// Decide whether a schedule's alert is due at `now`.
///
/// The alert window is `[target - (lead_base + poll_interval), target)`,
/// half-open: a check landing exactly on the window start fires, a check
/// landing exactly on the target does not — it has already missed its own
/// window, and a stale alert after the nominal time helps nobody. The
/// `+ poll_interval` term widens the window so that ticks spaced exactly
/// by the poll interval cannot step over it.
///
/// `target` is always combined with *today's* date; windows spanning
/// midnight are unsupported. If the interval is so large that no tick
/// lands inside the window, that day is silently skipped.
pub fn evaluate(
    now: DateTime<Tz>,
    schedule: &Schedule,
    lead_base: Duration,
    poll_interval: Duration,
) -> Decision {
    if !schedule.active {
        return Decision::Skip(SkipReason::Disabled);
    }
    if !schedule.is_active_on(now.weekday()) {
        return Decision::Skip(SkipReason::WrongWeekday);
    }
    let today = now.date_naive();
    if schedule.last_fired_date == Some(today) {
        return Decision::Skip(SkipReason::AlreadyFiredToday);
    }
    let Ok(time_of_day) = schedule.time_of_day() else {
        return Decision::Skip(SkipReason::UnrepresentableTarget);
    };
    let Some(target) = today
        .and_time(time_of_day)
        .and_local_timezone(now.timezone())
        .earliest()
    else {
        return Decision::Skip(SkipReason::UnrepresentableTarget);
    };

    let alert_start = target - (lead_base + poll_interval);
    if alert_start <= now && now < target {
        Decision::Fire { target }
    } else {
        Decision::Skip(SkipReason::OutsideWindow)
    }
}

/// Convenience wrapper for callers that only need the boolean.
pub fn should_fire(
    now: DateTime<Tz>,
    schedule: &Schedule,
    lead_base: Duration,
    poll_interval: Duration,
) -> bool {
    matches!(
        evaluate(now, schedule, lead_base, poll_interval),
        Decision::Fire { .. }
    )
}
