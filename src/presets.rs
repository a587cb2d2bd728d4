use crate::settings::PhysicsSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A named physics tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: PhysicsSettings,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        settings: PhysicsSettings,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    pub fn new() -> Self {
        let mut manager = Self {
            builtin: Vec::new(),
            user: Vec::new(),
        };
        manager.load_builtin_presets();
        manager.load_user_presets();
        manager
    }

    /// Load the built-in presets
    fn load_builtin_presets(&mut self) {
        self.builtin = vec![
            // Soft Pile - default tuning
            Preset::new(
                "Soft Pile",
                "Gentle fall into a quiet, non-bouncy heap",
                PhysicsSettings::default(),
            ),
            // Bouncy - lively landings
            Preset::new(
                "Bouncy",
                "Springy walls and floor, entries jostle before resting",
                PhysicsSettings {
                    floor_restitution: 0.65,
                    wall_restitution: 0.7,
                    collision_restitution: 0.9,
                    impact_softening: 0.04,
                    squash_factor: 0.09,
                    ..PhysicsSettings::default()
                },
            ),
            // Syrup - slow, heavily damped descent
            Preset::new(
                "Syrup",
                "Slow descent, everything oozes into place",
                PhysicsSettings {
                    gravity: 0.08,
                    damping: 0.96,
                    floor_restitution: 0.1,
                    collision_restitution: 0.3,
                    ..PhysicsSettings::default()
                },
            ),
            // Marbles - heavy, hard spheres
            Preset::new(
                "Marbles",
                "Heavy fall, small squash, clicky collisions",
                PhysicsSettings {
                    gravity: 0.34,
                    floor_friction: 0.92,
                    squash_factor: 0.015,
                    collision_restitution: 0.85,
                    blob_radius_min: 5.0,
                    blob_radius_max: 6.5,
                    ..PhysicsSettings::default()
                },
            ),
        ];
    }

    /// Get the presets directory path
    fn presets_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pile-simulation").join("presets"))
    }

    /// Load user presets from disk
    fn load_user_presets(&mut self) {
        if let Some(dir) = Self::presets_dir() {
            if dir.exists() {
                if let Ok(entries) = fs::read_dir(&dir) {
                    for entry in entries.flatten() {
                        if entry.path().extension().is_some_and(|e| e == "json") {
                            if let Ok(content) = fs::read_to_string(entry.path()) {
                                if let Ok(mut preset) = serde_json::from_str::<Preset>(&content) {
                                    preset.settings.clamp_all();
                                    self.user.push(preset);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Save a preset to disk
    pub fn save_preset(&mut self, preset: Preset) -> Result<(), String> {
        let dir = Self::presets_dir().ok_or("Could not determine config directory")?;

        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create presets directory: {}", e))?;

        // Sanitize filename
        let filename = preset
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();

        let path = dir.join(format!("{}.json", filename));

        let json = serde_json::to_string_pretty(&preset)
            .map_err(|e| format!("Failed to serialize preset: {}", e))?;

        fs::write(&path, json).map_err(|e| format!("Failed to write preset file: {}", e))?;

        if !self.user.iter().any(|p| p.name == preset.name) {
            self.user.push(preset);
        }

        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Index of the preset whose settings match exactly, if any
    pub fn index_of_settings(&self, settings: &PhysicsSettings) -> Option<usize> {
        self.all_presets().position(|p| &p.settings == settings)
    }

    /// The preset after `settings` in the cycle, wrapping; starts from the
    /// first builtin when the current settings match no preset.
    pub fn next_after(&self, settings: &PhysicsSettings) -> Option<&Preset> {
        let all: Vec<&Preset> = self.all_presets().collect();
        if all.is_empty() {
            return None;
        }
        let next = match self.index_of_settings(settings) {
            Some(i) => (i + 1) % all.len(),
            None => 0,
        };
        Some(all[next])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_exist() {
        let manager = PresetManager {
            builtin: Vec::new(),
            user: Vec::new(),
        };
        let mut manager = manager;
        manager.load_builtin_presets();

        assert!(manager.find("Soft Pile").is_some());
        assert!(manager.find("bouncy").is_some(), "lookup is case-insensitive");
        assert!(manager.find("nope").is_none());
    }

    #[test]
    fn test_builtin_settings_are_in_range() {
        let mut manager = PresetManager {
            builtin: Vec::new(),
            user: Vec::new(),
        };
        manager.load_builtin_presets();
        for preset in &manager.builtin {
            let mut clamped = preset.settings.clone();
            clamped.clamp_all();
            assert_eq!(clamped, preset.settings, "preset {} out of range", preset.name);
        }
    }

    #[test]
    fn test_next_after_cycles() {
        let mut manager = PresetManager {
            builtin: Vec::new(),
            user: Vec::new(),
        };
        manager.load_builtin_presets();

        let first = manager.builtin[0].settings.clone();
        let second = manager.next_after(&first).unwrap();
        assert_eq!(second.name, manager.builtin[1].name);

        let last = manager.builtin.last().unwrap().settings.clone();
        let wrapped = manager.next_after(&last).unwrap();
        assert_eq!(wrapped.name, manager.builtin[0].name);

        // Unknown settings restart the cycle.
        let mut custom = first.clone();
        custom.gravity = 0.41;
        assert_eq!(manager.next_after(&custom).unwrap().name, manager.builtin[0].name);
    }
}
