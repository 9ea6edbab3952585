//! Habit store contract.
//!
//! The engine never owns persistence; it reads habits and logs through this
//! trait and writes completion logs back through it. The bundled
//! [`crate::storage::Database`] is the default implementation.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::habit::{Habit, HabitLog};

/// Read/write access to habits and their completion logs.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Look up a habit by id.
    async fn habit(&self, id: &str) -> Result<Option<Habit>, StoreError>;

    /// All habits with the active flag set.
    async fn active_habits(&self) -> Result<Vec<Habit>, StoreError>;

    /// The completion log row for `(habit_id, date)`, if any.
    async fn log(&self, habit_id: &str, date: NaiveDate) -> Result<Option<HabitLog>, StoreError>;

    /// Upsert a log row, keyed by `(habit_id, date)`.
    async fn put_log(&self, log: HabitLog) -> Result<(), StoreError>;
}
