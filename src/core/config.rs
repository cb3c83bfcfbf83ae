// Monitor configuration - tunables for the windowing and classification pipeline

use crate::models::state::{MonitorError, MonitorResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Frames per classification window
    pub window_size: usize,
    /// Minimum joint confidence; detections at or below are discarded
    pub confidence_threshold: f32,
    /// Head drop below the shoulder line that classifies as drowsy
    pub drowsy_tilt_threshold: f32,
    /// Observation channel capacity between ingestion and the worker
    pub channel_capacity: usize,
    /// Sequence model file; None runs heuristic-only
    pub model_path: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            confidence_threshold: 0.3,
            drowsy_tilt_threshold: 0.1,
            channel_capacity: 100,
            model_path: None,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from file, creating with defaults if it doesn't exist
    pub fn load() -> MonitorResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;
            let config: MonitorConfig = serde_json::from_str(&contents)
                .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Create default config and save it
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> MonitorResult<()> {
        self.validate()?;

        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;
        std::fs::write(&config_path, contents)
            .map_err(|e| MonitorError::InvalidConfig(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> MonitorResult<()> {
        if self.window_size == 0 || self.window_size > 300 {
            return Err(MonitorError::InvalidConfig(format!(
                "Invalid window size: {}. Must be between 1 and 300",
                self.window_size
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(MonitorError::InvalidConfig(format!(
                "Invalid confidence threshold: {}. Must be between 0.0 and 1.0",
                self.confidence_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.drowsy_tilt_threshold) {
            return Err(MonitorError::InvalidConfig(format!(
                "Invalid drowsy tilt threshold: {}. Must be between 0.0 and 1.0",
                self.drowsy_tilt_threshold
            )));
        }

        if self.channel_capacity == 0 {
            return Err(MonitorError::InvalidConfig(
                "Channel capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Reset to default configuration
    pub fn reset() -> MonitorResult<Self> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    fn config_path() -> MonitorResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| {
                MonitorError::InvalidConfig("Could not determine home directory".to_string())
            })?;

        let mut path = PathBuf::from(home);
        path.push(".vigil");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}
