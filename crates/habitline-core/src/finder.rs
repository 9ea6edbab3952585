//! Next-occurrence queries.
//!
//! Two-day lookahead: a day whose remaining occurrences are all in the past
//! (or completed) falls through to tomorrow's first occurrence. Every rule
//! variant fires at least once per day, so an active habit always has a
//! next occurrence within the window.

use chrono::{Days, NaiveDateTime};

use crate::error::Result;
use crate::occurrence::{generate, Occurrence};
use crate::store::HabitStore;

/// Days scanned per query: today and tomorrow.
const LOOKAHEAD_DAYS: u64 = 2;

/// The earliest not-yet-completed occurrence of `habit_id` strictly after
/// `now`, or `None` for a missing or inactive habit.
pub async fn next_for_habit(
    store: &dyn HabitStore,
    habit_id: &str,
    now: NaiveDateTime,
) -> Result<Option<Occurrence>> {
    let Some(habit) = store.habit(habit_id).await? else {
        return Ok(None);
    };
    if !habit.active {
        return Ok(None);
    }
    for offset in 0..LOOKAHEAD_DAYS {
        let Some(date) = now.date().checked_add_days(Days::new(offset)) else {
            continue;
        };
        let log = store.log(&habit.id, date).await?;
        for occ in generate(&habit, date, log.as_ref()) {
            if occ.fires_at() > now && !occ.completed {
                return Ok(Some(occ));
            }
        }
    }
    Ok(None)
}

/// The globally earliest next occurrence across all active habits.
///
/// Ties on `(date, time)` break by habit id, so the result is stable for a
/// fixed store state. `None` only when no active habit has a future
/// occurrence (in practice: an empty active set).
pub async fn next_global(store: &dyn HabitStore, now: NaiveDateTime) -> Result<Option<Occurrence>> {
    let mut best: Option<Occurrence> = None;
    for habit in store.active_habits().await? {
        let Some(candidate) = next_for_habit(store, &habit.id, now).await? else {
            continue;
        };
        best = Some(match best.take() {
            None => candidate,
            Some(current) => {
                if (candidate.fires_at(), &candidate.habit_id)
                    < (current.fires_at(), &current.habit_id)
                {
                    candidate
                } else {
                    current
                }
            }
        });
    }
    Ok(best)
}
