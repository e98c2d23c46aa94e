//! Configuration for pulse-sentinel.
//!
//! All flag thresholds are static configuration: there is no adaptive or
//! learned tuning anywhere in the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Trailing window for HRV / resting-heart-rate baselines, in days
    pub baseline_window_days: i64,

    /// Numeric policy for the flag rules
    pub thresholds: FlagThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baseline_window_days: 30,
            thresholds: FlagThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pulse-sentinel")
            .join("config.json")
    }
}

/// Thresholds for the five flag rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagThresholds {
    /// Fractional HRV drop below baseline that counts as suppressed (0.15 = 15%)
    pub hrv_drop_pct: f64,
    /// Consecutive suppressed-HRV days required to fire
    pub hrv_drop_consecutive_days: usize,
    /// Recovery score below which a day is "red zone"
    pub low_recovery_threshold: i64,
    /// Consecutive red-zone days required to fire
    pub low_recovery_consecutive_days: usize,
    /// Sleep debt in hours above which the latest sample fires
    pub sleep_debt_threshold_hours: f64,
    /// Trailing window searched for the latest sleep-debt sample, in days
    pub sleep_debt_window_days: i64,
    /// Skin-temperature rise above recent baseline that counts as a spike, in degrees C
    pub skin_temp_spike_celsius: f64,
    /// Trailing window for the skin-temperature baseline, in days
    pub skin_temp_window_days: i64,
    /// Minimum skin-temperature samples required before the spike rule runs
    pub skin_temp_min_samples: usize,
    /// Consecutive overloaded days (and trailing window) for strain overload
    pub strain_overload_days: usize,
    /// Day strain at or above which a day counts as high strain
    pub strain_high_threshold: f64,
    /// Recovery score below which a high-strain day counts as overloaded
    pub strain_recovery_threshold: i64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            hrv_drop_pct: 0.15,
            hrv_drop_consecutive_days: 3,
            low_recovery_threshold: 33,
            low_recovery_consecutive_days: 3,
            sleep_debt_threshold_hours: 2.0,
            sleep_debt_window_days: 5,
            skin_temp_spike_celsius: 0.5,
            skin_temp_window_days: 14,
            skin_temp_min_samples: 5,
            strain_overload_days: 5,
            strain_high_threshold: 14.0,
            strain_recovery_threshold: 67,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
