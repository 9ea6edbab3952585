//! Sequential notification scheduling.
//!
//! OS notification layers cap how many reminders may be pending at once and
//! drop every scheduled wake-up on device restart. Instead of enqueueing
//! future occurrences, the scheduler maintains one invariant: at any
//! instant the platform holds **at most one armed wake-up per active
//! habit**, and it is that habit's earliest not-yet-completed future
//! occurrence. Delivering a reminder re-arms the next one, so the queue
//! refills itself one link at a time.
//!
//! ## Per-habit chain states
//!
//! ```text
//! Unarmed -> Armed        (schedule_next success)
//! Armed   -> Armed        (on_delivered re-arms)
//! Armed   -> Unarmed      (no next occurrence, or cancel)
//! ```
//!
//! ## Concurrency
//!
//! Same-habit operations serialize on a lazily created per-habit mutex;
//! different habits proceed independently. A resync barrier (`RwLock`)
//! makes `reschedule_all`/`cancel_all` exclusive against every per-habit
//! operation, so a stale delivery callback can never resurrect a reminder
//! mid-sweep.
//!
//! Chain-advance failures are logged and swallowed: a transient store error
//! must not break a habit's chain permanently, and the next resync repairs
//! whatever stalled.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::finder;
use crate::habit::HabitLog;
use crate::platform::{ArmRequest, PlatformScheduler};
use crate::store::HabitStore;

/// Chain-maintenance state machine over a habit store and a platform
/// scheduler.
pub struct NotificationScheduler {
    store: Arc<dyn HabitStore>,
    platform: Arc<dyn PlatformScheduler>,
    /// Per-habit serialization, created lazily. Never dropped: the map is
    /// bounded by the number of habits ever scheduled in this process.
    chains: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Resync barrier: per-habit operations hold the read half, full sweeps
    /// hold the write half.
    resync: RwLock<()>,
}

impl NotificationScheduler {
    pub fn new(store: Arc<dyn HabitStore>, platform: Arc<dyn PlatformScheduler>) -> Self {
        Self {
            store,
            platform,
            chains: Mutex::new(HashMap::new()),
            resync: RwLock::new(()),
        }
    }

    /// Arm the wake-up for the habit's next occurrence.
    ///
    /// Returns `false` without touching the platform when notification
    /// authorization is missing or the habit has no future occurrence
    /// (inactive, deleted, or nothing within the lookahead window).
    /// No other habit's wake-up is affected.
    pub async fn schedule_next(&self, habit_id: &str) -> Result<bool> {
        self.schedule_next_at(habit_id, wall_clock_now()).await
    }

    /// [`schedule_next`](Self::schedule_next) with an explicit clock.
    pub async fn schedule_next_at(&self, habit_id: &str, now: NaiveDateTime) -> Result<bool> {
        let _resync = self.resync.read().await;
        let chain = self.chain_lock(habit_id).await;
        let _guard = chain.lock().await;
        self.arm_next(habit_id, now).await
    }

    /// Platform callback: a reminder for `habit_id` just fired.
    ///
    /// Unconditionally advances the chain. Returns whether a new wake-up
    /// was armed; failures are logged and swallowed so the delivery already
    /// shown to the user is never rolled back.
    pub async fn on_delivered(&self, habit_id: &str) -> bool {
        self.on_delivered_at(habit_id, wall_clock_now()).await
    }

    /// [`on_delivered`](Self::on_delivered) with an explicit clock.
    pub async fn on_delivered_at(&self, habit_id: &str, now: NaiveDateTime) -> bool {
        let _resync = self.resync.read().await;
        let chain = self.chain_lock(habit_id).await;
        let _guard = chain.lock().await;
        match self.arm_next(habit_id, now).await {
            Ok(armed) => armed,
            Err(err) => {
                warn!("failed to advance reminder chain for habit {habit_id}: {err}");
                false
            }
        }
    }

    /// Platform callback: the user completed the habit from the reminder.
    ///
    /// Records the completion log first, then advances the chain. A failed
    /// chain advance does not roll back the recorded completion; it is
    /// logged and swallowed, and the next resync self-heals the chain.
    ///
    /// # Errors
    /// Only the completion write itself can fail the call.
    pub async fn on_completed_from_notification(
        &self,
        habit_id: &str,
        date: NaiveDate,
    ) -> Result<bool> {
        self.on_completed_at(habit_id, date, wall_clock_now()).await
    }

    /// [`on_completed_from_notification`](Self::on_completed_from_notification)
    /// with an explicit clock.
    pub async fn on_completed_at(
        &self,
        habit_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<bool> {
        let _resync = self.resync.read().await;
        let chain = self.chain_lock(habit_id).await;
        let _guard = chain.lock().await;

        self.store
            .put_log(HabitLog::completed(habit_id, date))
            .await?;

        match self.arm_next(habit_id, now).await {
            Ok(armed) => Ok(armed),
            Err(err) => {
                warn!("completion recorded, but re-arming habit {habit_id} failed: {err}");
                Ok(false)
            }
        }
    }

    /// Remove the pending wake-up and any visible reminder for one habit.
    ///
    /// Used on deactivation, deletion, or an edit that deactivates.
    pub async fn cancel(&self, habit_id: &str) -> Result<()> {
        let _resync = self.resync.read().await;
        let chain = self.chain_lock(habit_id).await;
        let _guard = chain.lock().await;
        self.platform.cancel_all_for_habit(habit_id).await?;
        Ok(())
    }

    /// Full resynchronization after device restart or cold app start.
    ///
    /// A restart destroys every platform wake-up regardless of habit, so
    /// this clears whatever is left and re-arms one wake-up per active
    /// habit. Returns how many were armed. Per-habit failures are logged
    /// and skipped; the sweep always visits every active habit.
    pub async fn reschedule_all(&self) -> Result<usize> {
        self.reschedule_all_at(wall_clock_now()).await
    }

    /// [`reschedule_all`](Self::reschedule_all) with an explicit clock.
    pub async fn reschedule_all_at(&self, now: NaiveDateTime) -> Result<usize> {
        // Write half: no per-habit operation may interleave with the sweep.
        let _resync = self.resync.write().await;
        self.platform.cancel_all().await?;

        let mut armed = 0;
        for habit in self.store.active_habits().await? {
            match self.arm_next(&habit.id, now).await {
                Ok(true) => armed += 1,
                Ok(false) => {}
                Err(err) => warn!("resync could not arm habit {}: {err}", habit.id),
            }
        }
        debug!("resynchronized reminder chains, {armed} armed");
        Ok(armed)
    }

    /// Clear every pending wake-up and visible reminder with no
    /// rescheduling. Full teardown.
    pub async fn cancel_all(&self) -> Result<()> {
        let _resync = self.resync.write().await;
        self.platform.cancel_all().await?;
        Ok(())
    }

    /// The chain-advance step. Caller must hold the appropriate locks; this
    /// must run to completion once started or the habit would be left
    /// permanently unarmed.
    async fn arm_next(&self, habit_id: &str, now: NaiveDateTime) -> Result<bool> {
        if !self.platform.is_authorized().await {
            debug!("notifications unauthorized, not arming habit {habit_id}");
            return Ok(false);
        }
        match finder::next_for_habit(self.store.as_ref(), habit_id, now).await? {
            Some(occ) => {
                self.platform.arm(ArmRequest::from(&occ)).await?;
                debug!(
                    "armed habit {habit_id} for {} {}",
                    occ.date,
                    occ.time.format("%H:%M")
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn chain_lock(&self, habit_id: &str) -> Arc<Mutex<()>> {
        self.chains
            .lock()
            .await
            .entry(habit_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn wall_clock_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{Habit, RecurrenceRule};
    use crate::testing::{MemoryStore, MockPlatform};
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::atomic::Ordering;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture() -> (Arc<MemoryStore>, Arc<MockPlatform>, NotificationScheduler) {
        let store = Arc::new(MemoryStore::default());
        let platform = Arc::new(MockPlatform::default());
        let scheduler = NotificationScheduler::new(store.clone(), platform.clone());
        (store, platform, scheduler)
    }

    fn meds_habit() -> Habit {
        Habit::new(
            "Meds",
            RecurrenceRule::once_daily(vec![t(9, 0), t(14, 0), t(18, 0)]),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn schedule_next_arms_the_next_occurrence() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);

        let now = d(2026, 3, 10).and_time(t(10, 30));
        assert!(scheduler.schedule_next_at(&id, now).await.unwrap());

        let armed = platform.armed_for(&id).unwrap();
        assert_eq!(armed.date, d(2026, 3, 10));
        assert_eq!(armed.time, t(14, 0));
        assert_eq!(armed.title, "Meds");
    }

    #[tokio::test]
    async fn schedule_next_is_gated_by_authorization() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);
        platform.set_authorized(false);

        let now = d(2026, 3, 10).and_time(t(10, 30));
        assert!(!scheduler.schedule_next_at(&id, now).await.unwrap());
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn repeated_scheduling_keeps_one_wakeup_per_habit() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);

        let now = d(2026, 3, 10).and_time(t(10, 30));
        for _ in 0..5 {
            scheduler.schedule_next_at(&id, now).await.unwrap();
        }
        assert_eq!(platform.armed_count(), 1);
    }

    #[tokio::test]
    async fn delivery_advances_the_chain() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);

        let morning = d(2026, 3, 10).and_time(t(8, 0));
        scheduler.schedule_next_at(&id, morning).await.unwrap();
        assert_eq!(platform.armed_for(&id).unwrap().time, t(9, 0));

        // The 09:00 reminder fires; the chain moves to 14:00.
        let after_delivery = d(2026, 3, 10).and_time(t(9, 0));
        assert!(scheduler.on_delivered_at(&id, after_delivery).await);
        assert_eq!(platform.armed_for(&id).unwrap().time, t(14, 0));
        assert_eq!(platform.armed_count(), 1);
    }

    #[tokio::test]
    async fn delivery_for_vanished_habit_ends_the_chain() {
        let (_store, platform, scheduler) = fixture();
        let now = d(2026, 3, 10).and_time(t(9, 0));
        assert!(!scheduler.on_delivered_at("gone", now).await);
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn delivery_for_deactivated_habit_ends_the_chain() {
        let (store, platform, scheduler) = fixture();
        let mut habit = meds_habit();
        habit.active = false;
        let id = habit.id.clone();
        store.add_habit(habit);

        let now = d(2026, 3, 10).and_time(t(9, 0));
        assert!(!scheduler.on_delivered_at(&id, now).await);
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn delivery_swallows_store_failures() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);
        store.fail_reads.store(true, Ordering::SeqCst);

        let now = d(2026, 3, 10).and_time(t(9, 0));
        assert!(!scheduler.on_delivered_at(&id, now).await);
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn completion_records_log_then_rearms() {
        let (store, platform, scheduler) = fixture();
        let habit = Habit::new("Journal", RecurrenceRule::once_daily(vec![t(9, 0)])).unwrap();
        let id = habit.id.clone();
        store.add_habit(habit);

        let today = d(2026, 3, 10);
        let now = today.and_time(t(9, 5));
        assert!(scheduler.on_completed_at(&id, today, now).await.unwrap());

        let log = store.log_for(&id, today).unwrap();
        assert!(log.completed);
        // Today is done, so the chain points at tomorrow.
        let armed = platform.armed_for(&id).unwrap();
        assert_eq!(armed.date, d(2026, 3, 11));
        assert_eq!(armed.time, t(9, 0));
    }

    #[tokio::test]
    async fn completion_survives_rearm_failure() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);
        store.fail_reads.store(true, Ordering::SeqCst);

        let today = d(2026, 3, 10);
        let now = today.and_time(t(9, 5));
        // Re-arm fails, but the call succeeds and the log is recorded.
        let armed = scheduler.on_completed_at(&id, today, now).await.unwrap();
        assert!(!armed);
        assert!(store.log_for(&id, today).unwrap().completed);
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn cancel_removes_the_pending_wakeup() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);

        let now = d(2026, 3, 10).and_time(t(8, 0));
        scheduler.schedule_next_at(&id, now).await.unwrap();
        assert_eq!(platform.armed_count(), 1);

        scheduler.cancel(&id).await.unwrap();
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn reschedule_all_arms_one_wakeup_per_active_habit() {
        let (store, platform, scheduler) = fixture();
        let a = Habit::new("Walk", RecurrenceRule::once_daily(vec![t(16, 0)])).unwrap();
        let b = Habit::new(
            "Hydrate",
            RecurrenceRule::interval(t(9, 0), 30, None).unwrap(),
        )
        .unwrap();
        let mut paused = Habit::new("Old", RecurrenceRule::once_daily(vec![t(7, 0)])).unwrap();
        paused.active = false;
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        store.add_habit(a);
        store.add_habit(b);
        store.add_habit(paused);

        // A stale wake-up from before the restart.
        platform
            .arm(ArmRequest {
                habit_id: "stale".to_string(),
                date: d(2026, 3, 9),
                time: t(9, 0),
                title: "Stale".to_string(),
                body: None,
            })
            .await
            .unwrap();

        let now = d(2026, 3, 10).and_time(t(10, 0));
        let armed = scheduler.reschedule_all_at(now).await.unwrap();

        assert_eq!(armed, 2);
        assert_eq!(platform.armed_count(), 2);
        assert!(platform.armed_for("stale").is_none());
        assert_eq!(platform.armed_for(&a_id).unwrap().time, t(16, 0));
        assert_eq!(platform.armed_for(&b_id).unwrap().time, t(10, 30));
    }

    #[tokio::test]
    async fn cancel_all_clears_without_rescheduling() {
        let (store, platform, scheduler) = fixture();
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);

        let now = d(2026, 3, 10).and_time(t(8, 0));
        scheduler.schedule_next_at(&id, now).await.unwrap();
        scheduler.cancel_all().await.unwrap();
        assert_eq!(platform.armed_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_scheduling_upholds_the_chain_invariant() {
        let (store, platform, scheduler) = fixture();
        let scheduler = Arc::new(scheduler);
        let habit = meds_habit();
        let id = habit.id.clone();
        store.add_habit(habit);

        let now = d(2026, 3, 10).and_time(t(10, 30));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let scheduler = scheduler.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                scheduler.schedule_next_at(&id, now).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(platform.armed_count(), 1);
        assert_eq!(platform.armed_for(&id).unwrap().time, t(14, 0));
    }
}
