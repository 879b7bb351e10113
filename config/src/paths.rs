use directories::BaseDirs;
use std::path::PathBuf;

const APP_DIR: &str = "math-buddy";

pub struct PathManager;

impl PathManager {
    pub fn data_dir() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.data_dir().join(APP_DIR))
    }

    pub fn config_dir() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.config_dir().join(APP_DIR))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn log_file_path() -> Option<PathBuf> {
        Self::logs_dir().map(|d| d.join("math-buddy.log"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    /// Where the (encrypted) bearer token survives restarts
    pub fn session_token_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("session_token"))
    }
}
