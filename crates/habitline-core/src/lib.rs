//! # Habitline Core Library
//!
//! This library provides the core business logic for Habitline, a recurring
//! habit reminder engine. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI shell
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Recurrence Model**: Habits carry exactly one `RecurrenceRule` variant
//!   (once-daily, hourly, or minute-interval); interval legality is enforced
//!   at construction, never silently corrected
//! - **Occurrence Generator**: Expands a rule + calendar date into the
//!   ordered time-of-day sequence for that date, on demand -- no queue of
//!   future occurrences is ever materialized
//! - **Notification Chain**: At most one armed platform wake-up per active
//!   habit; firing a reminder re-arms the next one (schedule-one, fire-one,
//!   schedule-next)
//! - **Permission Flow**: A state machine gating all scheduling behind the
//!   OS notification (and optional exact-alarm) authorization
//! - **Storage**: SQLite-based habit/log storage and TOML-based preferences
//!
//! ## Key Components
//!
//! - [`RecurrenceRule`]: Three-variant recurrence definition
//! - [`NotificationScheduler`]: The chain-maintenance state machine
//! - [`PermissionFlow`]: Permission-gated activation
//! - [`Database`]: Habit and completion-log persistence

pub mod error;
pub mod finder;
pub mod habit;
pub mod occurrence;
pub mod permission;
pub mod platform;
pub mod scheduler;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CoreError, PlatformError, PreferencesError, StoreError, ValidationError};
pub use finder::{next_for_habit, next_global};
pub use habit::{Habit, HabitLog, RecurrenceRule, RuleKind};
pub use occurrence::Occurrence;
pub use permission::{PermissionFlow, PermissionState, PromptHistory};
pub use platform::{ArmRequest, PlatformScheduler};
pub use scheduler::NotificationScheduler;
pub use storage::{Database, Preferences, PreferencesStore};
pub use store::HabitStore;
