//! Reminder chain maintenance.
//!
//! The CLI has no OS notification layer of its own, so these commands run
//! the real scheduler against a dry-run platform that prints what it would
//! arm. Useful for checking what a restart resync would do before wiring
//! in a desktop shell.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;

use habitline_core::{
    ArmRequest, Database, NotificationScheduler, PlatformError, PlatformScheduler,
    PreferencesStore,
};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Simulate the cold-start resync: one reminder per active habit
    Resync,
    /// Simulate a full teardown
    CancelAll,
}

/// Prints platform calls instead of performing them. Authorization follows
/// the notifications_enabled preference.
struct DryRunPlatform {
    enabled: bool,
}

#[async_trait]
impl PlatformScheduler for DryRunPlatform {
    async fn arm(&self, request: ArmRequest) -> Result<(), PlatformError> {
        println!(
            "would arm: {} {}  {}",
            request.date,
            request.time.format("%H:%M"),
            request.title
        );
        Ok(())
    }

    async fn cancel(
        &self,
        habit_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), PlatformError> {
        println!("would cancel: {habit_id} at {date} {}", time.format("%H:%M"));
        Ok(())
    }

    async fn cancel_all_for_habit(&self, habit_id: &str) -> Result<(), PlatformError> {
        println!("would cancel all reminders for {habit_id}");
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), PlatformError> {
        println!("would cancel all pending reminders");
        Ok(())
    }

    async fn is_authorized(&self) -> bool {
        self.enabled
    }

    async fn request_authorization(&self) -> Result<bool, PlatformError> {
        Ok(self.enabled)
    }
}

pub async fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let prefs = PreferencesStore::load()?;
    let platform = Arc::new(DryRunPlatform {
        enabled: prefs.get().notifications_enabled,
    });
    let scheduler = NotificationScheduler::new(db, platform);

    match action {
        NotifyAction::Resync => {
            let armed = scheduler.reschedule_all().await?;
            println!("{armed} reminder(s) would be armed.");
        }
        NotifyAction::CancelAll => {
            scheduler.cancel_all().await?;
        }
    }
    Ok(())
}
