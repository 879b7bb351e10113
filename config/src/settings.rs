//! Client settings stored in settings.toml

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How much prior conversation accompanies each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ContextWindowSetting {
    LastMessages { size: usize },
    LastUserInputs { size: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClientSettings {
    /// Backend base URL; overrides MATH_BUDDY_API_URL when set
    pub api_url: Option<String>,
    pub context_window: Option<ContextWindowSetting>,
    pub request_timeout_secs: Option<u64>,
}

impl ClientSettings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        match PathManager::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };

        toml::from_str(&content).unwrap_or_default()
    }
}
