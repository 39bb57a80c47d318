//! Persisted application settings.
//!
//! A small JSON file in the user configuration directory keeps what the
//! registry cannot: which store file was last open and whether autostart
//! is on. Missing or unreadable settings fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::errors::{EzTextError, Result};

pub const APP_DIR_NAME: &str = "ezText";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_store: Option<PathBuf>,
    pub autostart: bool,
}

impl Settings {
    pub fn default_path() -> Result<PathBuf> {
        Ok(app_config_dir()?.join(SETTINGS_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), "settings file unreadable, using defaults: {e}");
                Settings::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                warn!(path = %path.display(), "could not read settings, using defaults: {e}");
                Settings::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn app_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(EzTextError::ConfigDir)?
        .join(APP_DIR_NAME))
}

/// Where the shortcut store lives unless the settings point elsewhere.
pub fn default_store_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join(crate::STORE_FILE_NAME))
}
