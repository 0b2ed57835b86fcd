use crate::error::{Result, SimError};
use crate::settings::SimulationParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// All simulation parameters, cosmetic ones included
    pub params: SimulationParams,
    /// Random seed; None picks a fresh one per run
    pub seed: Option<u64>,
    /// Ticks per rendered frame (app-level)
    pub steps_per_frame: usize,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| SimError::io(path, e))
    }

    /// Import config from a JSON file. Parameters are brought back into range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let mut config: AppConfig =
            serde_json::from_str(&content).map_err(|source| SimError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.params = config.params.sanitized();
        config.steps_per_frame = config.steps_per_frame.clamp(1, 20);
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            params: SimulationParams::default(),
            seed: None,
            steps_per_frame: 1,
        }
    }
}
