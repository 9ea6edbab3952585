//! In-memory collaborator fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::error::{PlatformError, StoreError};
use crate::habit::{Habit, HabitLog};
use crate::platform::{ArmRequest, PlatformScheduler};
use crate::store::HabitStore;

/// HashMap-backed habit store.
#[derive(Default)]
pub struct MemoryStore {
    habits: Mutex<HashMap<String, Habit>>,
    logs: Mutex<HashMap<(String, NaiveDate), HabitLog>>,
    /// When set, every read fails (writes still land). Used to exercise the
    /// swallow-and-log path of the scheduler.
    pub fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn add_habit(&self, habit: Habit) {
        self.habits
            .lock()
            .expect("habit map poisoned")
            .insert(habit.id.clone(), habit);
    }

    pub fn put_log_sync(&self, log: HabitLog) {
        self.logs
            .lock()
            .expect("log map poisoned")
            .insert((log.habit_id.clone(), log.date), log);
    }

    pub fn log_for(&self, habit_id: &str, date: NaiveDate) -> Option<HabitLog> {
        self.logs
            .lock()
            .expect("log map poisoned")
            .get(&(habit_id.to_string(), date))
            .cloned()
    }

    fn check_fail(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::QueryFailed("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HabitStore for MemoryStore {
    async fn habit(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        self.check_fail()?;
        Ok(self
            .habits
            .lock()
            .expect("habit map poisoned")
            .get(id)
            .cloned())
    }

    async fn active_habits(&self) -> Result<Vec<Habit>, StoreError> {
        self.check_fail()?;
        let mut habits: Vec<Habit> = self
            .habits
            .lock()
            .expect("habit map poisoned")
            .values()
            .filter(|h| h.active)
            .cloned()
            .collect();
        habits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(habits)
    }

    async fn log(&self, habit_id: &str, date: NaiveDate) -> Result<Option<HabitLog>, StoreError> {
        self.check_fail()?;
        Ok(self.log_for(habit_id, date))
    }

    async fn put_log(&self, log: HabitLog) -> Result<(), StoreError> {
        self.put_log_sync(log);
        Ok(())
    }
}

/// Platform fake that records armed wake-ups, keyed by habit id so the
/// at-most-one-per-habit invariant is directly observable.
pub struct MockPlatform {
    pub armed: Mutex<HashMap<String, ArmRequest>>,
    pub arm_calls: AtomicUsize,
    pub authorized: AtomicBool,
    pub exact_alarm_authorized: AtomicBool,
    pub grant_on_request: AtomicBool,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            armed: Mutex::new(HashMap::new()),
            arm_calls: AtomicUsize::new(0),
            authorized: AtomicBool::new(true),
            exact_alarm_authorized: AtomicBool::new(true),
            grant_on_request: AtomicBool::new(true),
        }
    }
}

impl MockPlatform {
    pub fn armed_for(&self, habit_id: &str) -> Option<ArmRequest> {
        self.armed
            .lock()
            .expect("armed map poisoned")
            .get(habit_id)
            .cloned()
    }

    pub fn armed_count(&self) -> usize {
        self.armed.lock().expect("armed map poisoned").len()
    }

    pub fn set_authorized(&self, value: bool) {
        self.authorized.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlatformScheduler for MockPlatform {
    async fn arm(&self, request: ArmRequest) -> Result<(), PlatformError> {
        self.arm_calls.fetch_add(1, Ordering::SeqCst);
        self.armed
            .lock()
            .expect("armed map poisoned")
            .insert(request.habit_id.clone(), request);
        Ok(())
    }

    async fn cancel(
        &self,
        habit_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), PlatformError> {
        let mut armed = self.armed.lock().expect("armed map poisoned");
        if armed
            .get(habit_id)
            .is_some_and(|req| req.date == date && req.time == time)
        {
            armed.remove(habit_id);
        }
        Ok(())
    }

    async fn cancel_all_for_habit(&self, habit_id: &str) -> Result<(), PlatformError> {
        self.armed
            .lock()
            .expect("armed map poisoned")
            .remove(habit_id);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), PlatformError> {
        self.armed.lock().expect("armed map poisoned").clear();
        Ok(())
    }

    async fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    async fn request_authorization(&self) -> Result<bool, PlatformError> {
        let granted = self.grant_on_request.load(Ordering::SeqCst);
        self.authorized.store(granted, Ordering::SeqCst);
        Ok(granted)
    }

    async fn is_exact_alarm_authorized(&self) -> bool {
        self.exact_alarm_authorized.load(Ordering::SeqCst)
    }

    async fn request_exact_alarm_authorization(&self) -> Result<bool, PlatformError> {
        self.exact_alarm_authorized.store(true, Ordering::SeqCst);
        Ok(true)
    }
}
