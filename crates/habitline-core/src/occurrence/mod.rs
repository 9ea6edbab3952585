//! Occurrence generation.
//!
//! Expands a habit's recurrence rule into the concrete times it fires on a
//! given calendar date. Occurrences are ephemeral values computed fresh per
//! query -- nothing here is persisted, which keeps memory bounded and
//! sidesteps any platform cap on pending reminders by construction.
//!
//! One `generate` call never returns times from two different calendar
//! dates: an interval sequence stops at the day's end rather than wrapping
//! past midnight. Midnight-crossing coverage comes from independent calls
//! per date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::habit::{Habit, HabitLog, RecurrenceRule};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One concrete scheduled instant derived from a habit's rule.
///
/// Carries denormalized display fields so callers can render a reminder
/// without a second store lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub habit_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub habit_name: String,
    pub habit_color: Option<String>,
    pub completed: bool,
}

impl Occurrence {
    /// The wall-clock instant this occurrence fires at.
    pub fn fires_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Expand a rule into its ordered time-of-day sequence for one date.
///
/// Pure and deterministic: the same rule always yields the same sequence.
/// Times are truncated to minute precision.
pub fn expand(rule: &RecurrenceRule) -> Vec<NaiveTime> {
    match rule {
        RecurrenceRule::OnceDaily { times } => {
            let mut times: Vec<NaiveTime> = times
                .iter()
                .filter_map(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0))
                .collect();
            times.sort();
            times.dedup();
            times
        }
        RecurrenceRule::Hourly {
            anchor,
            interval_minutes,
            end,
        }
        | RecurrenceRule::Interval {
            anchor,
            interval_minutes,
            end,
        } => expand_interval(*anchor, *interval_minutes, *end),
    }
}

fn expand_interval(anchor: NaiveTime, interval: u32, end: Option<NaiveTime>) -> Vec<NaiveTime> {
    if interval == 0 {
        return Vec::new();
    }
    let end_minutes = match end {
        Some(end) => end.hour() * 60 + end.minute(),
        None => MINUTES_PER_DAY - 1, // 23:59
    };
    let mut out = Vec::new();
    let mut minutes = anchor.hour() * 60 + anchor.minute();
    // end_minutes is at most 23:59, so this can never cross midnight.
    while minutes <= end_minutes {
        if let Some(time) = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0) {
            out.push(time);
        }
        minutes += interval;
    }
    out
}

/// Generate the habit's occurrences for `date`, joined with completion
/// state from the day's log entry (if any).
///
/// Once-daily occurrences share the day's single log row. Sub-daily rules
/// always report `completed = false`: the log grain is one row per habit
/// per day and cannot represent per-occurrence completion. That is a
/// documented limitation of the log schema, not something the generator
/// papers over.
pub fn generate(habit: &Habit, date: NaiveDate, log: Option<&HabitLog>) -> Vec<Occurrence> {
    let day_completed = match habit.rule {
        RecurrenceRule::OnceDaily { .. } => log.is_some_and(|l| l.completed),
        _ => false,
    };
    expand(&habit.rule)
        .into_iter()
        .map(|time| Occurrence {
            habit_id: habit.id.clone(),
            date,
            time,
            habit_name: habit.name.clone(),
            habit_color: habit.color.clone(),
            completed: day_completed,
        })
        .collect()
}
