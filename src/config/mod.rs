//! Configuration loading.
//!
//! Reads a small JSON file:
//!
//! ```json
//! { "workDurationMinutes": 20, "breakDurationSeconds": 20, "warningTimeSeconds": 30 }
//! ```
//!
//! Loading never fails. A missing, unreadable or invalid file yields the
//! built-in defaults (20 minutes of work, 20 second breaks, 30 second warning).

mod error;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::SchedulerConfig;

pub use error::ConfigError;

/// Directory name under the user's config directory
const CONFIG_DIR_NAME: &str = "eyebreak";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.json";

// ============================================================================
// AppConfig
// ============================================================================

/// On-disk configuration.
///
/// Keys left out of the file take their default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Work period length in minutes
    pub work_duration_minutes: u32,
    /// Break length in seconds
    pub break_duration_seconds: u32,
    /// Warning lead time in seconds
    pub warning_time_seconds: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::fallback()
    }
}

impl AppConfig {
    /// Values used whenever the config file cannot be used.
    pub const fn fallback() -> Self {
        Self {
            work_duration_minutes: 20,
            break_duration_seconds: 20,
            warning_time_seconds: 30,
        }
    }

    /// Converts to the scheduler's durations.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(
            self.work_duration_minutes.saturating_mul(60),
            self.break_duration_seconds,
            self.warning_time_seconds,
        )
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if any duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler_config()
            .validate()
            .map_err(ConfigError::InvalidValue)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Returns `<config dir>/eyebreak/config.json`.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the platform has no config directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns a [`ConfigError`] describing why the file cannot be used.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.display().to_string())
        } else {
            ConfigError::ReadError(format!("{}: {}", path.display(), e))
        }
    })?;

    let config: AppConfig =
        serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;

    Ok(config)
}

/// Loads the config from `path`, or from the default location when `None`.
///
/// Falls back to [`AppConfig::fallback`] on any error.
pub fn load_config(path: Option<&Path>) -> AppConfig {
    let result = match path {
        Some(path) => load_config_from(path),
        None => default_config_path().and_then(|path| load_config_from(&path)),
    };

    match result {
        Ok(config) => {
            tracing::info!(
                "loaded config: work={}min, break={}s, warning={}s",
                config.work_duration_minutes,
                config.break_duration_seconds,
                config.warning_time_seconds
            );
            config
        }
        Err(e) if e.is_missing() => {
            tracing::info!("{}; using defaults", e);
            AppConfig::fallback()
        }
        Err(e) => {
            tracing::warn!("{}; using defaults", e);
            AppConfig::fallback()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
