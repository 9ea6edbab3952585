//! Habit model types.
//!
//! A [`Habit`] is a recurrence template: it never stores concrete future
//! occurrences, only the rule they are computed from. Completion history is
//! a [`HabitLog`] row per habit per calendar day.

mod recurrence;

pub use recurrence::{
    RecurrenceRule, RuleKind, FULL_DAY_MINUTES, INTERVAL_CEILING_MINUTES, is_legal, legal_set,
    nearest_legal,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A recurring habit.
///
/// Pausing a habit flips `active` to false rather than deleting it; deletion
/// cascades to its logs and cancels its pending reminder (handled by the
/// store and the scheduler respectively).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Display color as a hex string, e.g. "#7c4dff".
    pub color: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub rule: RecurrenceRule,
}

impl Habit {
    /// Create a new active habit with a fresh uuid.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the rule is illegal for its variant.
    pub fn new(name: impl Into<String>, rule: RecurrenceRule) -> Result<Self, ValidationError> {
        rule.validate()?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            color: None,
            active: true,
            created_at: Utc::now(),
            rule,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Persisted completion record, unique per `(habit_id, date)`.
///
/// Writes are upserts: completing an already-logged day replaces the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLog {
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed: bool,
}

impl HabitLog {
    pub fn completed(habit_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            habit_id: habit_id.into(),
            date,
            completed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn new_habit_is_active_with_uuid() {
        let habit = Habit::new("Drink water", RecurrenceRule::once_daily(vec![t(9, 0)])).unwrap();
        assert!(habit.active);
        assert_eq!(habit.id.len(), 36);
        assert!(habit.description.is_none());
    }

    #[test]
    fn new_habit_rejects_illegal_rule() {
        let rule = RecurrenceRule::Interval {
            anchor: t(9, 0),
            interval_minutes: 7,
            end: None,
        };
        assert!(Habit::new("Stretch", rule).is_err());
    }

    #[test]
    fn habit_serialization_roundtrip() {
        let habit = Habit::new(
            "Stand up",
            RecurrenceRule::Hourly {
                anchor: t(9, 0),
                interval_minutes: 120,
                end: Some(t(17, 0)),
            },
        )
        .unwrap()
        .with_description("Get off the chair")
        .with_color("#00c853");

        let json = serde_json::to_string(&habit).unwrap();
        let decoded: Habit = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.name, "Stand up");
        assert_eq!(decoded.color.as_deref(), Some("#00c853"));
        match decoded.rule {
            RecurrenceRule::Hourly {
                interval_minutes, ..
            } => assert_eq!(interval_minutes, 120),
            _ => panic!("expected hourly rule"),
        }
    }
}
