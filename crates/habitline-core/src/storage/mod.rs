pub mod database;
mod prefs;

pub use database::Database;
pub use prefs::{Preferences, PreferencesStore};

use std::path::PathBuf;

/// Returns `~/.config/habitline[-dev]/` based on HABITLINE_ENV.
///
/// Set HABITLINE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABITLINE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("habitline-dev")
    } else {
        base_dir.join("habitline")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
