//! Configuration file management.
//!
//! Handles loading and saving user preferences to `~/.neon-viz.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use neon_viz_core::{AnalysisConfig, ConfigError, ControlConfig, Preset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 3;

const CONFIG_FILE_NAME: &str = ".neon-viz.toml";

const CONFIG_TEMPLATE: &str = r#"# neon-viz configuration file
#
# Edits to [controls] and preset are picked up while the app is running.

# Active preset: "Neon Spectrum", "Aurora Ribbons" or "Cyber Rosette"
# preset = "Neon Spectrum"

# Timeout in seconds when switching audio devices (default: 3)
# device_timeout_secs = 3

# Last selected audio device (auto-saved)
# last_device = "Device Name"
# last_device_is_input = true

# =============================================================================
# Controls (0.0 - 1.0 unless noted)
# =============================================================================

[controls]
# sensitivity = 0.65
# smoothing = 0.4           # 0 = raw features, 1 = heaviest smoothing
# bloom = 0.75
# trail_length = 0.5
# particle_density = 0.6
# onset_rings = true
# pitch_to_color = true     # tint bars by spectral centroid

# =============================================================================
# Analysis tuning (read at startup)
# =============================================================================

[analysis]
# flux_threshold = 50.0     # flux jump that counts as an onset

# [analysis.cutoffs]
# low_hz = 60.0
# mid_hz = 2000.0
# high_hz = 8000.0

# [analysis.bars]
# bar_count = 64
# amplitude_scale = 5.0
# min_height = 0.1
# hue_spread = 60.0
# max_centroid_norm = 10000.0

# [analysis.rings]
# initial_radius = 0.5
# initial_opacity = 0.8
# speed = 0.05
# decay = 0.02
# max_radius = 3.0
"#;

/// Errors reading or writing the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub preset: Option<String>,
    pub last_device: Option<String>,
    pub last_device_is_input: Option<bool>,
    pub device_timeout_secs: Option<u64>,

    #[serde(default)]
    pub controls: ControlConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
    }

    /// Load from the home directory, writing the template on first run.
    /// Any problem falls back to defaults.
    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            match fs::write(&path, CONFIG_TEMPLATE) {
                Ok(()) => info!("Created config template at {:?}", path),
                Err(e) => warn!("Could not create config template at {:?}: {}", path, e),
            }
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.analysis.validate()?;
        Ok(config)
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            match self.save_to(&path) {
                Ok(()) => info!("Config saved to {:?}", path),
                Err(e) => warn!("Failed to save config: {}", e),
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = toml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn set_device(&mut self, name: &str, is_input: bool) {
        self.last_device = Some(name.to_string());
        self.last_device_is_input = Some(is_input);
        self.save();
    }

    pub fn device_timeout_secs(&self) -> u64 {
        self.device_timeout_secs
            .unwrap_or(DEFAULT_DEVICE_TIMEOUT_SECS)
    }

    /// Controls with every value clamped into range.
    pub fn controls(&self) -> ControlConfig {
        self.controls.clamped()
    }

    /// Configured preset; unknown or missing names give Neon Spectrum.
    pub fn preset(&self) -> Preset {
        self.preset
            .as_deref()
            .map(Preset::by_name)
            .unwrap_or_default()
    }
}
