//! TOML-based user preferences.
//!
//! Stores the small amount of state the engine needs across restarts but
//! outside the habit database:
//! - Whether reminders are enabled at all
//! - Whether the one-shot OS permission prompt was already shown
//!
//! Preferences are stored at `~/.config/habitline/prefs.toml`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::PreferencesError;
use crate::permission::PromptHistory;

fn default_true() -> bool {
    true
}

/// User preferences, serialized as TOML with per-field defaults so old
/// files keep parsing as fields are added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Set the moment the OS permission prompt is first shown or skipped;
    /// never cleared, so the flow runs at most once per install.
    #[serde(default)]
    pub notification_prompt_shown: bool,
    /// Path to a custom reminder sound file (optional).
    #[serde(default)]
    pub reminder_sound: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            notification_prompt_shown: false,
            reminder_sound: None,
        }
    }
}

/// File-backed preferences handle, shareable across tasks.
pub struct PreferencesStore {
    path: PathBuf,
    prefs: Mutex<Preferences>,
}

impl PreferencesStore {
    /// Load from the default location, writing defaults when no file
    /// exists yet.
    pub fn load() -> Result<Self, PreferencesError> {
        let path = data_dir()
            .map_err(|err| PreferencesError::LoadFailed {
                path: PathBuf::from("~/.config/habitline"),
                message: err.to_string(),
            })?
            .join("prefs.toml");
        Self::load_at(path)
    }

    /// Load from an explicit path.
    pub fn load_at(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|err| PreferencesError::ParseFailed(err.to_string()))?,
            Err(_) => {
                let prefs = Preferences::default();
                save(&path, &prefs)?;
                prefs
            }
        };
        Ok(Self {
            path,
            prefs: Mutex::new(prefs),
        })
    }

    /// A snapshot of the current preferences.
    pub fn get(&self) -> Preferences {
        self.prefs
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Mutate and persist.
    pub fn update(
        &self,
        apply: impl FnOnce(&mut Preferences),
    ) -> Result<(), PreferencesError> {
        let mut prefs = self.prefs.lock().map_err(|_| {
            PreferencesError::SaveFailed {
                path: self.path.clone(),
                message: "preferences lock poisoned".to_string(),
            }
        })?;
        apply(&mut prefs);
        save(&self.path, &prefs)
    }
}

impl PromptHistory for PreferencesStore {
    fn prompt_shown(&self) -> bool {
        self.get().notification_prompt_shown
    }

    fn mark_prompt_shown(&self) -> Result<(), PreferencesError> {
        self.update(|p| p.notification_prompt_shown = true)
    }
}

fn save(path: &Path, prefs: &Preferences) -> Result<(), PreferencesError> {
    let content = toml::to_string_pretty(prefs).map_err(|err| PreferencesError::SaveFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    std::fs::write(path, content).map_err(|err| PreferencesError::SaveFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
