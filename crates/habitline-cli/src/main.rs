use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "habitline-cli", version, about = "Habitline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Next-occurrence queries
    Next {
        /// Restrict to one habit
        #[arg(long)]
        habit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// All occurrences for a date
    Agenda {
        /// Date (YYYY-MM-DD), today by default
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reminder chain maintenance
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action).await,
        Commands::Next { habit, json } => commands::next::run_next(habit, json).await,
        Commands::Agenda { date, json } => commands::next::run_agenda(date, json).await,
        Commands::Notify { action } => commands::notify::run(action).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
