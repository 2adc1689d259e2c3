use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellSettings {
    /// Path to the adb executable; empty means "resolve from PATH".
    pub adb_path: String,
    /// Target device serial; `None` lets adb pick the only device.
    pub serial: Option<String>,
    pub command_timeout_secs: u64,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            adb_path: String::new(),
            serial: None,
            command_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSettings {
    pub max_read_size_mb: u64,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            max_read_size_mb: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub shell: ShellSettings,
    #[serde(default)]
    pub files: FileSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn max_read_size_bytes(&self) -> u64 {
        self.files.max_read_size_mb * 1024 * 1024
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("DROIDFS_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("droidfs").join("config.json");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".droidfs_config.json")
}

pub fn backup_config_path() -> PathBuf {
    config_path().with_extension("backup.json")
}

pub fn load_config() -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path())
}

pub fn save_config(config: &AppConfig) -> Result<(), AppError> {
    save_config_to_path(config, &config_path(), &backup_config_path())
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), ""))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::system(format!("Failed to parse config: {err}"), ""))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    backup_path: &Path,
) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_path);
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), ""))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), ""))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    if !(1..=600).contains(&config.shell.command_timeout_secs) {
        config.shell.command_timeout_secs = 10;
    }
    if config.files.max_read_size_mb == 0 {
        config.files.max_read_size_mb = 10;
    }
    if config
        .shell
        .serial
        .as_ref()
        .is_some_and(|serial| serial.trim().is_empty())
    {
        config.shell.serial = None;
    }
    config
}
