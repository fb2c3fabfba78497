//! crates/habit_tracker_core/src/streak.rs
//!
//! The streak state machine. Both functions are pure: the caller supplies `now`
//! and decides what, if anything, gets persisted.

use chrono::{DateTime, Utc};

use crate::domain::Habit;

/// True when both instants fall on the same UTC calendar day.
pub fn is_same_utc_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

/// True when `last` falls on the UTC calendar day before `now`.
pub fn was_completed_yesterday(last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.date_naive().pred_opt() == Some(last.date_naive())
}

/// Read-time correction of the derived fields.
///
/// Sets `is_completed_today` from `last_completed_at` and zeroes a stale
/// `current_streak`. Never touches `longest_streak` or `total_completions`.
pub fn recalculate(mut habit: Habit, now: DateTime<Utc>) -> Habit {
    let Some(last) = habit.last_completed_at else {
        habit.current_streak = 0;
        habit.is_completed_today = false;
        return habit;
    };

    habit.is_completed_today = is_same_utc_day(last, now);
    if !habit.is_completed_today && !was_completed_yesterday(last, now) {
        habit.current_streak = 0;
    }
    habit
}

/// Write-time transition for "mark done today" / "unmark today".
///
/// Requests for the state the habit is already in leave the counters alone.
/// Un-completing clears `last_completed_at` rather than restoring the previous
/// completion, and `longest_streak` is never decremented.
pub fn apply_toggle(habit: &mut Habit, completed: bool, now: DateTime<Utc>) {
    let completed_today = habit
        .last_completed_at
        .is_some_and(|last| is_same_utc_day(last, now));

    if completed && !completed_today {
        let continues = habit
            .last_completed_at
            .is_some_and(|last| was_completed_yesterday(last, now));

        habit.current_streak = if continues {
            habit.current_streak + 1
        } else {
            1
        };
        habit.longest_streak = habit.longest_streak.max(habit.current_streak);
        habit.total_completions += 1;
        habit.last_completed_at = Some(now);
    } else if !completed && completed_today {
        habit.total_completions = habit.total_completions.saturating_sub(1);
        habit.current_streak = habit.current_streak.saturating_sub(1);
        habit.last_completed_at = None;
    }

    habit.updated_date = now;
}
