//! Platform scheduler contract.
//!
//! The OS layer that actually arms one-shot wake-ups and shows reminders.
//! The engine treats deliveries as at-least-once callbacks with no ordering
//! guarantee across habits, and assumes every pending wake-up is lost on
//! device restart (hence [`crate::NotificationScheduler::reschedule_all`]).

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::occurrence::Occurrence;

/// Everything the platform needs to arm one wake-up and render its reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmRequest {
    pub habit_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub title: String,
    pub body: Option<String>,
}

impl From<&Occurrence> for ArmRequest {
    fn from(occ: &Occurrence) -> Self {
        Self {
            habit_id: occ.habit_id.clone(),
            date: occ.date,
            time: occ.time,
            title: occ.habit_name.clone(),
            body: None,
        }
    }
}

/// OS-level one-shot scheduling and notification authorization.
#[async_trait]
pub trait PlatformScheduler: Send + Sync {
    /// Arm a one-shot wake-up at the given absolute local time.
    async fn arm(&self, request: ArmRequest) -> Result<(), PlatformError>;

    /// Cancel one specific pending wake-up.
    async fn cancel(
        &self,
        habit_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), PlatformError>;

    /// Cancel every pending wake-up and visible reminder for one habit.
    async fn cancel_all_for_habit(&self, habit_id: &str) -> Result<(), PlatformError>;

    /// Cancel every pending wake-up and visible reminder.
    async fn cancel_all(&self) -> Result<(), PlatformError>;

    /// Whether notification authorization is currently granted.
    async fn is_authorized(&self) -> bool;

    /// Invoke the OS permission prompt. Returns whether the user granted it.
    async fn request_authorization(&self) -> Result<bool, PlatformError>;

    /// Whether the secondary exact-alarm capability is granted. Platforms
    /// without the concept report `true`.
    async fn is_exact_alarm_authorized(&self) -> bool {
        true
    }

    /// Request the exact-alarm capability. Returns whether it was granted.
    async fn request_exact_alarm_authorization(&self) -> Result<bool, PlatformError> {
        Ok(true)
    }
}
