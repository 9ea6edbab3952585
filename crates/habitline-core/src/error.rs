//! Core error types for habitline-core.
//!
//! This module defines the error hierarchy using thiserror. Permission
//! denial is deliberately not an error: scheduling operations report it as
//! a `false` return so callers can treat it as an ordinary outcome.

use std::path::PathBuf;
use thiserror::Error;

use crate::habit::RuleKind;

/// Core error type for habitline-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Habit store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Platform scheduler errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Preferences-file errors
    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors from the habit store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Referenced habit does not exist
    #[error("No habit with id {0}")]
    HabitNotFound(String),

    /// A stored row could not be decoded into a model value
    #[error("Corrupt row for habit {habit_id}: {message}")]
    CorruptRow { habit_id: String, message: String },
}

/// Errors from the platform notification layer.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Arming a wake-up failed
    #[error("Failed to arm wake-up for habit {habit_id}: {message}")]
    ArmFailed { habit_id: String, message: String },

    /// Cancelling pending/visible reminders failed
    #[error("Failed to cancel reminders: {0}")]
    CancelFailed(String),

    /// The OS authorization request itself failed (not a denial)
    #[error("Authorization request failed: {0}")]
    AuthorizationFailed(String),
}

/// Recurrence construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Interval outside the legal set for the rule variant
    #[error("interval of {interval} min is not legal for {kind} rules (legal: {legal})")]
    IllegalInterval {
        kind: RuleKind,
        interval: u32,
        legal: String,
    },

    /// A once-daily rule with no scheduled times can never fire
    #[error("a once-daily rule needs at least one scheduled time")]
    NoScheduledTimes,
}

/// Preferences-file errors.
#[derive(Error, Debug)]
pub enum PreferencesError {
    /// Failed to load preferences
    #[error("Failed to load preferences from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save preferences
    #[error("Failed to save preferences to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse preferences
    #[error("Failed to parse preferences: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
