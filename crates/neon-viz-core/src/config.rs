//! Internal tuning constants for analysis and mapping.
//!
//! None of these are exposed as live controls; they are read from the
//! `[analysis]` table of the config file for calibration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::features::BandCutoffs;
use crate::onset::DEFAULT_FLUX_THRESHOLD;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Flux jump that triggers an onset
    pub flux_threshold: f32,
    pub cutoffs: BandCutoffs,
    pub bars: BarsConfig,
    pub rings: RingsConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            flux_threshold: DEFAULT_FLUX_THRESHOLD,
            cutoffs: BandCutoffs::default(),
            bars: BarsConfig::default(),
            rings: RingsConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.flux_threshold.is_finite() || self.flux_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.flux_threshold));
        }
        self.bars.validate()?;
        self.rings.validate()
    }
}

/// Spectrum-bars mapping constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarsConfig {
    pub bar_count: usize,
    /// Scale constant K in `rms * sensitivity * K`
    pub amplitude_scale: f32,
    /// Floor for bar height
    pub min_height: f32,
    /// Degrees of hue swept by centroid or bar index
    pub hue_spread: f32,
    /// Centroid (Hz) that maps to a full hue sweep
    pub max_centroid_norm: f32,
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            bar_count: 64,
            amplitude_scale: 5.0,
            min_height: 0.1,
            hue_spread: 60.0,
            max_centroid_norm: 10000.0,
        }
    }
}

impl BarsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bar_count == 0 {
            return Err(ConfigError::ZeroBars);
        }
        Ok(())
    }
}

/// Onset-ring dynamics, per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingsConfig {
    pub initial_radius: f32,
    pub initial_opacity: f32,
    pub speed: f32,
    pub decay: f32,
    pub max_radius: f32,
}

impl Default for RingsConfig {
    fn default() -> Self {
        Self {
            initial_radius: 0.5,
            initial_opacity: 0.8,
            speed: 0.05,
            decay: 0.02,
            max_radius: 3.0,
        }
    }
}

impl RingsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            self.initial_radius,
            self.initial_opacity,
            self.speed,
            self.decay,
            self.max_radius,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidRings("values must be finite".into()));
        }
        if self.speed <= 0.0 && self.decay <= 0.0 {
            return Err(ConfigError::InvalidRings(
                "rings need a positive speed or decay to expire".into(),
            ));
        }
        Ok(())
    }
}
