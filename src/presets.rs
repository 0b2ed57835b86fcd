use crate::error::{Result, SimError};
use crate::settings::{FieldView, SimulationParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A named parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub params: SimulationParams,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, params: SimulationParams) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params,
        }
    }
}

/// Built-in presets plus user presets stored as JSON files on disk
pub struct PresetManager {
    /// Presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Load built-ins and whatever lives in the user config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Use `dir` for user presets instead of the config directory
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slime-simulation").join("presets"))
    }

    fn load_user_presets(&mut self) {
        let Some(dir) = self.dir.as_deref() else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match load_preset(&path) {
                Ok(preset) => self.user.push(preset),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable preset"),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn preset_path(dir: &Path, name: &str) -> PathBuf {
        let filename: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        dir.join(format!("{}.json", filename))
    }

    /// Write a preset to disk and register it, replacing one with the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<()> {
        let dir = self.dir.as_deref().ok_or(SimError::NoConfigDir)?;
        fs::create_dir_all(dir).map_err(|e| SimError::io(dir, e))?;

        let path = Self::preset_path(dir, &preset.name);
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json).map_err(|e| SimError::io(&path, e))?;

        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);
        Ok(())
    }

    /// Delete a user preset; built-ins cannot be deleted
    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        let dir = self.dir.as_deref().ok_or(SimError::NoConfigDir)?;
        self.user.retain(|p| p.name != name);

        let path = Self::preset_path(dir, name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| SimError::io(&path, e))?;
        }
        Ok(())
    }

    /// All presets, built-ins first
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by case-insensitive name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }

    /// Preset at position `index`, wrapping around the full list
    pub fn cycle(&self, index: usize) -> Option<&Preset> {
        let total = self.builtin.len() + self.user.len();
        if total == 0 {
            return None;
        }
        self.all_presets().nth(index % total)
    }
}

fn load_preset(path: &Path) -> Result<Preset> {
    let content = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
    let mut preset: Preset = serde_json::from_str(&content).map_err(|source| SimError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    preset.params = preset.params.sanitized();
    Ok(preset)
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        // Physarum - pure trail following
        Preset::new(
            "Physarum",
            "Slime-mold trail networks, no flocking",
            SimulationParams {
                alignment_force: 0.0,
                cohesion_force: 0.0,
                separation_force: 0.0,
                ..Default::default()
            },
        ),
        // Flocking - boids dominate, weak trails
        Preset::new(
            "Flocking",
            "Strong alignment and cohesion, trails fade fast",
            SimulationParams {
                alignment_force: 2.0,
                cohesion_force: 1.2,
                separation_force: 1.5,
                perception_radius: 20.0,
                decay_rate: 0.15,
                ..Default::default()
            },
        ),
        // Coral - permanent aggregation
        Preset::new(
            "Coral",
            "Particles stick on contact and never let go",
            SimulationParams {
                sticking_probability: 0.8,
                release_probability: 0.0,
                particle_count: 3000,
                field_view: FieldView::Particles,
                ..Default::default()
            },
        ),
        // Dendrites - rare sticking gives thin branches
        Preset::new(
            "Dendrites",
            "Low sticking chance for sparse, branching clusters",
            SimulationParams {
                sticking_probability: 0.1,
                release_probability: 0.0,
                separation_force: 0.2,
                field_view: FieldView::Particles,
                ..Default::default()
            },
        ),
        // Breathing - clusters form and dissolve
        Preset::new(
            "Breathing",
            "Sticking balanced by release, clusters churn",
            SimulationParams {
                sticking_probability: 0.5,
                release_probability: 0.02,
                ..Default::default()
            },
        ),
        // Swarm - fast, wide sensing
        Preset::new(
            "Swarm",
            "Fast movers with long sensors and sharp turns",
            SimulationParams {
                move_speed: 2.0,
                sensor_distance: 15.0,
                sensor_angle: 0.8,
                turn_speed: 0.8,
                diffusion_rate: 0.5,
                ..Default::default()
            },
        ),
    ]
}
