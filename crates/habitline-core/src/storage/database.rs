//! SQLite-based habit and completion-log storage.
//!
//! Rules are stored as a JSON column: the tagged-union shape of
//! [`RecurrenceRule`] does not flatten into nullable columns without
//! reintroducing exactly the invalid field combinations the enum exists to
//! rule out. Log rows are keyed `(habit_id, date)` with upsert writes, and
//! deleting a habit cascades to its logs.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::StoreError;
use crate::habit::{Habit, HabitLog, RecurrenceRule};
use crate::store::HabitStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database for habits and logs.
///
/// The connection sits behind a mutex so the store can be shared across
/// async tasks; queries themselves are short and synchronous.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/habitline/habitline.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|err| StoreError::MigrationFailed(err.to_string()))?;
        Self::open_at(dir.join("habitline.db"))
    }

    /// Open (and migrate) the database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and dry runs).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: Path::new(":memory:").to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.lock()?
            .execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS habits (
                    id          TEXT PRIMARY KEY,
                    name        TEXT NOT NULL,
                    description TEXT,
                    color       TEXT,
                    active      INTEGER NOT NULL DEFAULT 1,
                    created_at  TEXT NOT NULL,
                    rule        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS habit_logs (
                    habit_id  TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                    date      TEXT NOT NULL,
                    completed INTEGER NOT NULL,
                    PRIMARY KEY (habit_id, date)
                );

                CREATE INDEX IF NOT EXISTS idx_habit_logs_date ON habit_logs(date);",
            )
            .map_err(|err| StoreError::MigrationFailed(err.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Locked)
    }

    /// Insert a new habit.
    pub fn insert_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let rule = encode_rule(&habit.rule)?;
        self.lock()?.execute(
            "INSERT INTO habits (id, name, description, color, active, created_at, rule)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                habit.id,
                habit.name,
                habit.description,
                habit.color,
                habit.active,
                habit.created_at.to_rfc3339(),
                rule,
            ],
        )?;
        Ok(())
    }

    /// Replace a habit's editable fields.
    pub fn update_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let rule = encode_rule(&habit.rule)?;
        let changed = self.lock()?.execute(
            "UPDATE habits SET name = ?2, description = ?3, color = ?4, active = ?5, rule = ?6
             WHERE id = ?1",
            params![
                habit.id,
                habit.name,
                habit.description,
                habit.color,
                habit.active,
                rule,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::HabitNotFound(habit.id.clone()));
        }
        Ok(())
    }

    /// Flip the active flag (pause/resume without losing history).
    pub fn set_active(&self, id: &str, active: bool) -> Result<(), StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE habits SET active = ?2 WHERE id = ?1",
            params![id, active],
        )?;
        if changed == 0 {
            return Err(StoreError::HabitNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a habit; its log rows go with it (FK cascade). The caller is
    /// responsible for cancelling the habit's pending reminder.
    pub fn delete_habit(&self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .lock()?
            .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::HabitNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Every habit, active or not, ordered by creation time.
    pub fn all_habits(&self) -> Result<Vec<Habit>, StoreError> {
        self.query_habits("SELECT id, name, description, color, active, created_at, rule
             FROM habits ORDER BY created_at, id")
    }

    fn query_habits(&self, sql: &str) -> Result<Vec<Habit>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(RawHabit {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                color: row.get(3)?,
                active: row.get(4)?,
                created_at: row.get(5)?,
                rule: row.get(6)?,
            })
        })?;
        let mut habits = Vec::new();
        for row in rows {
            habits.push(row?.decode()?);
        }
        Ok(habits)
    }

    fn habit_sync(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT id, name, description, color, active, created_at, rule
                 FROM habits WHERE id = ?1",
                params![id],
                |row| {
                    Ok(RawHabit {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        color: row.get(3)?,
                        active: row.get(4)?,
                        created_at: row.get(5)?,
                        rule: row.get(6)?,
                    })
                },
            )
            .optional()?;
        raw.map(RawHabit::decode).transpose()
    }

    fn log_sync(&self, habit_id: &str, date: NaiveDate) -> Result<Option<HabitLog>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT habit_id, date, completed FROM habit_logs
                 WHERE habit_id = ?1 AND date = ?2",
                params![habit_id, date.format(DATE_FORMAT).to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((habit_id, date, completed)) => {
                let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|err| {
                    StoreError::CorruptRow {
                        habit_id: habit_id.clone(),
                        message: format!("bad log date: {err}"),
                    }
                })?;
                Ok(Some(HabitLog {
                    habit_id,
                    date,
                    completed,
                }))
            }
            None => Ok(None),
        }
    }

    fn put_log_sync(&self, log: &HabitLog) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO habit_logs (habit_id, date, completed) VALUES (?1, ?2, ?3)
             ON CONFLICT(habit_id, date) DO UPDATE SET completed = excluded.completed",
            params![
                log.habit_id,
                log.date.format(DATE_FORMAT).to_string(),
                log.completed,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl HabitStore for Database {
    async fn habit(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        self.habit_sync(id)
    }

    async fn active_habits(&self) -> Result<Vec<Habit>, StoreError> {
        self.query_habits(
            "SELECT id, name, description, color, active, created_at, rule
             FROM habits WHERE active = 1 ORDER BY created_at, id",
        )
    }

    async fn log(&self, habit_id: &str, date: NaiveDate) -> Result<Option<HabitLog>, StoreError> {
        self.log_sync(habit_id, date)
    }

    async fn put_log(&self, log: HabitLog) -> Result<(), StoreError> {
        self.put_log_sync(&log)
    }
}

/// A habits row before the JSON/timestamp columns are decoded.
struct RawHabit {
    id: String,
    name: String,
    description: Option<String>,
    color: Option<String>,
    active: bool,
    created_at: String,
    rule: String,
}

impl RawHabit {
    fn decode(self) -> Result<Habit, StoreError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|err| StoreError::CorruptRow {
                habit_id: self.id.clone(),
                message: format!("bad created_at: {err}"),
            })?
            .with_timezone(&Utc);
        let rule: RecurrenceRule =
            serde_json::from_str(&self.rule).map_err(|err| StoreError::CorruptRow {
                habit_id: self.id.clone(),
                message: format!("bad rule: {err}"),
            })?;
        Ok(Habit {
            id: self.id,
            name: self.name,
            description: self.description,
            color: self.color,
            active: self.active,
            created_at,
            rule,
        })
    }
}

fn encode_rule(rule: &RecurrenceRule) -> Result<String, StoreError> {
    serde_json::to_string(rule).map_err(|err| StoreError::QueryFailed(err.to_string()))
}
