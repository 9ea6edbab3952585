//! Next-occurrence and agenda queries.

use habitline_core::occurrence::generate;
use habitline_core::{next_for_habit, next_global, Database, HabitStore, Occurrence};

use super::parse_date_or_today;

pub async fn run_next(
    habit: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = chrono::Local::now().naive_local();

    let next = match habit {
        Some(id) => next_for_habit(&db, &id, now).await?,
        None => next_global(&db, now).await?,
    };

    match next {
        Some(occ) if json => println!("{}", serde_json::to_string_pretty(&occ)?),
        Some(occ) => print_occurrence(&occ),
        None => println!("Nothing upcoming."),
    }
    Ok(())
}

pub async fn run_agenda(
    date: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let date = parse_date_or_today(date.as_deref())?;

    let mut agenda: Vec<Occurrence> = Vec::new();
    for habit in db.active_habits().await? {
        let log = db.log(&habit.id, date).await?;
        agenda.extend(generate(&habit, date, log.as_ref()));
    }
    agenda.sort_by(|a, b| (a.time, &a.habit_id).cmp(&(b.time, &b.habit_id)));

    if json {
        println!("{}", serde_json::to_string_pretty(&agenda)?);
    } else if agenda.is_empty() {
        println!("Nothing scheduled for {date}.");
    } else {
        for occ in &agenda {
            print_occurrence(occ);
        }
    }
    Ok(())
}

fn print_occurrence(occ: &Occurrence) {
    let mark = if occ.completed { "x" } else { " " };
    println!(
        "[{mark}] {} {}  {}",
        occ.date,
        occ.time.format("%H:%M"),
        occ.habit_name
    );
}
