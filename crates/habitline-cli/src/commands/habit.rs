//! Habit management commands.

use clap::Subcommand;
use habitline_core::habit::nearest_legal;
use habitline_core::{Database, Habit, HabitLog, HabitStore, RecurrenceRule, ValidationError};

use super::{parse_date_or_today, parse_time};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a new habit
    Add {
        /// Habit name
        name: String,
        /// Rule variant: daily, hourly, or interval
        #[arg(long, default_value = "daily")]
        kind: String,
        /// Time of day for daily rules, HH:MM (repeatable)
        #[arg(long = "at")]
        times: Vec<String>,
        /// Anchor time for hourly/interval rules
        #[arg(long, default_value = "09:00")]
        anchor: String,
        /// Interval in minutes
        #[arg(long)]
        every: Option<u32>,
        /// Stop repeating after this time, HH:MM
        #[arg(long)]
        until: Option<String>,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
        /// Display color, e.g. "#7c4dff"
        #[arg(long)]
        color: Option<String>,
    },
    /// List habits
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pause reminders without losing history
    Pause {
        /// Habit ID
        id: String,
    },
    /// Resume reminders
    Resume {
        /// Habit ID
        id: String,
    },
    /// Delete a habit and its completion history
    Remove {
        /// Habit ID
        id: String,
    },
    /// Mark a habit completed for a date
    Done {
        /// Habit ID
        id: String,
        /// Date (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<String>,
    },
}

pub async fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HabitAction::Add {
            name,
            kind,
            times,
            anchor,
            every,
            until,
            description,
            color,
        } => {
            let rule = build_rule(&kind, &times, &anchor, every, until.as_deref())?;
            let mut habit = Habit::new(name, rule)?;
            habit.description = description;
            habit.color = color;
            db.insert_habit(&habit)?;
            println!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { json } => {
            let habits = db.all_habits()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else if habits.is_empty() {
                println!("No habits yet.");
            } else {
                for habit in habits {
                    let status = if habit.active { "active" } else { "paused" };
                    println!("{}  [{status}]  {}", habit.id, habit.name);
                }
            }
        }
        HabitAction::Pause { id } => {
            db.set_active(&id, false)?;
            println!("Paused {id}. Run `notify resync` to drop its reminder.");
        }
        HabitAction::Resume { id } => {
            db.set_active(&id, true)?;
            println!("Resumed {id}. Run `notify resync` to re-arm its reminder.");
        }
        HabitAction::Remove { id } => {
            db.delete_habit(&id)?;
            println!("Removed {id} and its history.");
        }
        HabitAction::Done { id, date } => {
            let date = parse_date_or_today(date.as_deref())?;
            db.put_log(HabitLog::completed(id.clone(), date)).await?;
            println!("Logged {id} as completed for {date}.");
        }
    }

    Ok(())
}

fn build_rule(
    kind: &str,
    times: &[String],
    anchor: &str,
    every: Option<u32>,
    until: Option<&str>,
) -> Result<RecurrenceRule, Box<dyn std::error::Error>> {
    let end = until.map(parse_time).transpose()?;
    let rule = match kind {
        "daily" => {
            let times = times
                .iter()
                .map(|t| parse_time(t))
                .collect::<Result<Vec<_>, _>>()?;
            let rule = RecurrenceRule::once_daily(times);
            rule.validate()?;
            Ok(rule)
        }
        "hourly" => RecurrenceRule::hourly(
            parse_time(anchor)?,
            every.unwrap_or(60),
            end,
        ),
        "interval" => RecurrenceRule::interval(
            parse_time(anchor)?,
            every.ok_or("interval rules need --every <minutes>")?,
            end,
        ),
        other => return Err(format!("unknown rule kind '{other}'").into()),
    };
    rule.map_err(|err| -> Box<dyn std::error::Error> {
        match err {
            ValidationError::IllegalInterval { kind, interval, .. } => {
                let suggestion = nearest_legal(kind, interval);
                format!("{err}; closest legal value is {suggestion}").into()
            }
            other => other.to_string().into(),
        }
    })
}
