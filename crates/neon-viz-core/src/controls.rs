//! User-facing control values, read by the pipeline at tick boundaries.

use serde::{Deserialize, Serialize};

/// Controls owned by the UI layer. The pipeline reads them and never
/// writes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Bar amplitude gain (0.0 - 1.0)
    pub sensitivity: f32,
    /// Feature smoothing (0 = raw, 1 = heaviest)
    pub smoothing: f32,
    /// Bloom intensity, passed straight to the renderer
    pub bloom: f32,
    /// Trail persistence (0 = none, 1 = longest)
    pub trail_length: f32,
    /// Ambient particle density
    pub particle_density: f32,
    /// Spawn rings on detected onsets
    pub onset_rings: bool,
    /// Tint all bars by spectral centroid instead of bar index
    pub pitch_to_color: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.65,
            smoothing: 0.4,
            bloom: 0.75,
            trail_length: 0.5,
            particle_density: 0.6,
            onset_rings: true,
            pitch_to_color: true,
        }
    }
}

impl ControlConfig {
    /// Copy with every scalar forced into [0, 1]. NaN becomes 0.
    pub fn clamped(&self) -> Self {
        Self {
            sensitivity: unit(self.sensitivity),
            smoothing: unit(self.smoothing),
            bloom: unit(self.bloom),
            trail_length: unit(self.trail_length),
            particle_density: unit(self.particle_density),
            ..*self
        }
    }

    /// Apply one update, clamping the result.
    pub fn apply(&mut self, update: ControlUpdate) {
        match update {
            ControlUpdate::Sensitivity(v) => self.sensitivity = unit(v),
            ControlUpdate::Smoothing(v) => self.smoothing = unit(v),
            ControlUpdate::Bloom(v) => self.bloom = unit(v),
            ControlUpdate::TrailLength(v) => self.trail_length = unit(v),
            ControlUpdate::ParticleDensity(v) => self.particle_density = unit(v),
            ControlUpdate::OnsetRings(on) => self.onset_rings = on,
            ControlUpdate::PitchToColor(on) => self.pitch_to_color = on,
        }
    }

    pub fn get(&self, control: Control) -> f32 {
        match control {
            Control::Sensitivity => self.sensitivity,
            Control::Smoothing => self.smoothing,
            Control::Bloom => self.bloom,
            Control::TrailLength => self.trail_length,
            Control::ParticleDensity => self.particle_density,
        }
    }
}

/// The adjustable scalar controls, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Sensitivity,
    Smoothing,
    Bloom,
    TrailLength,
    ParticleDensity,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Sensitivity,
        Control::Smoothing,
        Control::Bloom,
        Control::TrailLength,
        Control::ParticleDensity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::Sensitivity => "Sensitivity",
            Control::Smoothing => "Smoothing",
            Control::Bloom => "Bloom",
            Control::TrailLength => "Trail Length",
            Control::ParticleDensity => "Particle Density",
        }
    }

    /// Update that sets this control to `value`.
    pub fn set(self, value: f32) -> ControlUpdate {
        match self {
            Control::Sensitivity => ControlUpdate::Sensitivity(value),
            Control::Smoothing => ControlUpdate::Smoothing(value),
            Control::Bloom => ControlUpdate::Bloom(value),
            Control::TrailLength => ControlUpdate::TrailLength(value),
            Control::ParticleDensity => ControlUpdate::ParticleDensity(value),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&c| c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// A single control change sent from the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlUpdate {
    Sensitivity(f32),
    Smoothing(f32),
    Bloom(f32),
    TrailLength(f32),
    ParticleDensity(f32),
    OnsetRings(bool),
    PitchToColor(bool),
}

fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
