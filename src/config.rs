use crate::settings::PhysicsSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration for export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// All physics tunables
    pub settings: PhysicsSettings,
    /// Seconds between feed reveals
    pub drip: f32,
    /// Stepper increments per redraw frame (app-level)
    pub steps_per_frame: usize,
    /// Attention scheduler cadence (seconds between emphasis attempts)
    pub attention_interval: f32,
    /// Attention emphasis duration in seconds
    pub attention_hold: f32,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Import config from a JSON file; settings are clamped back into their
    /// documented ranges so a hand-edited file cannot break the simulation.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        config.settings.clamp_all();
        config.steps_per_frame = config.steps_per_frame.clamp(1, 10);
        config.drip = config.drip.clamp(0.0, 30.0);
        config.attention_interval = config.attention_interval.clamp(1.0, 60.0);
        config.attention_hold = config.attention_hold.clamp(0.5, 10.0);
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: PhysicsSettings::default(),
            drip: 1.5,
            steps_per_frame: 1,
            attention_interval: 6.0,
            attention_hold: 2.0,
        }
    }
}
