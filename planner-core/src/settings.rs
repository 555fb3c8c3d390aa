use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlannerError, Result};
use crate::models::RequirementMode;
use crate::store::RequirementStore;

/// Environment variable overriding the settings file location
pub const CONFIG_ENV_VAR: &str = "PLANNER_CONFIG";

const SETTINGS_FILE_NAME: &str = ".equipment_planner.yaml";

/// User settings shared by the CLI and the GUI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Mode a fresh store starts in
    #[serde(default)]
    pub default_mode: RequirementMode,
    /// Scroll offset (in points) past which the app bar shows its border
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f32,
    /// Only list pieces that are still missing in shortfall summaries
    #[serde(default)]
    pub show_shortfall_only: bool,
}

fn default_scroll_threshold() -> f32 {
    4.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: RequirementMode::default(),
            scroll_threshold: default_scroll_threshold(),
            show_shortfall_only: false,
        }
    }
}

impl Settings {
    /// Location of the settings file: `PLANNER_CONFIG` if set, otherwise
    /// `~/.equipment_planner.yaml`
    pub fn settings_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }

        let home_dir = dirs::home_dir().ok_or(PlannerError::NoHomeDir)?;
        Ok(home_dir.join(SETTINGS_FILE_NAME))
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| PlannerError::io(path, e))?;
        let settings = serde_yaml::from_str(&content)?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Loads settings from the default location, falling back to defaults on
    /// any error
    pub fn load_or_default() -> Self {
        let loaded = Self::settings_path().and_then(Self::load_from);
        match loaded {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Writes settings as YAML, creating parent directories as needed
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PlannerError::io(parent, e))?;
            }
        }

        fs::write(path, content).map_err(|e| PlannerError::io(path, e))?;
        Ok(())
    }

    /// Creates an empty store honouring these settings
    pub fn new_store(&self) -> RequirementStore {
        RequirementStore::with_mode(self.default_mode)
    }
}
