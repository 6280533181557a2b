//! Persisted settings
//!
//! Stored as JSON in `<config dir>/m4a2mp3/settings.json`. Command-line
//! flags override whatever is loaded here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::conversion::{EncoderSettings, FailurePolicy};

/// Defaults applied to every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// CBR bitrate in kbps; `None` keeps the encoder default
    #[serde(default)]
    pub bitrate: Option<u32>,
    /// Continue with the next file after a failure
    #[serde(default)]
    pub keep_going: bool,
    /// Also append log output to the log file
    #[serde(default)]
    pub log_to_file: bool,
}

impl AppSettings {
    const SETTINGS_FILE: &'static str = "settings.json";

    /// Directory holding the settings file
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("m4a2mp3"))
    }

    /// Full path of the settings file
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join(Self::SETTINGS_FILE))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            log::debug!("No config directory, using default settings");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::debug!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings: {}", e))?;
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse settings: {}", e))
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::settings_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn encoder_settings(&self) -> EncoderSettings {
        EncoderSettings {
            bitrate: self.bitrate,
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::FailFast
        }
    }
}
