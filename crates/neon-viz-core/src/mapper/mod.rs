//! Feature-to-visual parameter mapping.
//!
//! The mapper turns one tick's features into the numbers a renderer draws
//! from. Each visual element is a [`MappingPolicy`]; all policies run every
//! tick regardless of the active preset, and the renderer decides which
//! ones to show.

mod bars;
mod rings;

pub use bars::{BarParams, BarsPolicy};
pub use rings::{RingInstance, RingsPolicy};

use crate::config::AnalysisConfig;
use crate::controls::ControlConfig;
use crate::features::FeatureSet;
use crate::onset::OnsetEvent;
use crate::preset::Preset;

/// Smoothed copies of the features that drive continuous motion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Smoothed {
    pub rms: f32,
    pub centroid: f32,
}

/// Everything a policy may read for one tick.
#[derive(Debug, Clone, Copy)]
pub struct MapInput<'a> {
    pub features: FeatureSet,
    pub smoothed: Smoothed,
    pub onset: Option<OnsetEvent>,
    /// This tick's magnitude spectrum (dB)
    pub spectrum: &'a [f32],
    pub preset: &'a Preset,
    pub controls: &'a ControlConfig,
}

/// Per-tick output handed to the renderer.
///
/// Buffers are sized at construction and rewritten in place, so mapping
/// into an existing value does not allocate.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualParameters {
    /// One entry per bar, in bar order
    pub bars: Vec<BarParams>,
    /// Active rings, unordered
    pub rings: Vec<RingInstance>,
    /// Global bloom intensity (0-1)
    pub bloom: f32,
    pub features: FeatureSet,
    pub smoothed: Smoothed,
    pub preset: Preset,
    pub controls: ControlConfig,
    /// Tick that produced these parameters
    pub tick: u64,
}

impl VisualParameters {
    pub fn new(bar_count: usize, ring_capacity: usize) -> Self {
        Self {
            bars: vec![BarParams::default(); bar_count],
            rings: Vec::with_capacity(ring_capacity),
            bloom: 0.0,
            features: FeatureSet::default(),
            smoothed: Smoothed::default(),
            preset: Preset::default(),
            controls: ControlConfig::default(),
            tick: 0,
        }
    }
}

/// One visual element's mapping rule.
pub trait MappingPolicy {
    /// Write this policy's share of `out` for the current tick.
    fn map(&mut self, input: &MapInput<'_>, out: &mut VisualParameters);

    /// Drop any per-session state.
    fn reset(&mut self) {}
}

/// Runs every mapping policy and fills the shared fields.
pub struct ParameterMapper {
    bars: BarsPolicy,
    rings: RingsPolicy,
}

impl ParameterMapper {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            bars: BarsPolicy::new(config.bars),
            rings: RingsPolicy::new(config.rings),
        }
    }

    /// A parameter value sized for this mapper.
    pub fn blank_params(&self) -> VisualParameters {
        VisualParameters::new(self.bars.bar_count(), self.rings.capacity())
    }

    /// Map one tick. Never fails; non-finite features read as 0 and
    /// out-of-range controls are clamped.
    pub fn map(&mut self, input: &MapInput<'_>, out: &mut VisualParameters) {
        let controls = input.controls.clamped();
        let input = MapInput {
            features: sanitize_features(input.features),
            smoothed: Smoothed {
                rms: finite_or_zero(input.smoothed.rms),
                centroid: finite_or_zero(input.smoothed.centroid),
            },
            onset: input.onset,
            spectrum: input.spectrum,
            preset: input.preset,
            controls: &controls,
        };

        self.bars.map(&input, out);
        self.rings.map(&input, out);

        // Pass-through: bloom responds instantly, no smoothing.
        out.bloom = controls.bloom;
        out.features = input.features;
        out.smoothed = input.smoothed;
        out.preset = *input.preset;
        out.controls = controls;
    }

    /// Bring the control-driven fields of `out` up to date for a tick with
    /// no new frame. Bars, features and ring motion stay as they were.
    pub fn refresh_controls(
        &mut self,
        preset: &Preset,
        controls: &ControlConfig,
        out: &mut VisualParameters,
    ) {
        let controls = controls.clamped();
        self.rings.sync(controls.onset_rings, out);
        out.bloom = controls.bloom;
        out.preset = *preset;
        out.controls = controls;
    }

    pub fn active_rings(&self) -> &[RingInstance] {
        self.rings.active()
    }

    pub fn reset(&mut self) {
        self.bars.reset();
        self.rings.reset();
    }
}

pub(crate) fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn sanitize_features(f: FeatureSet) -> FeatureSet {
    FeatureSet {
        rms: finite_or_zero(f.rms),
        centroid: finite_or_zero(f.centroid),
        flux: finite_or_zero(f.flux),
        band_energy: crate::features::BandEnergy {
            low: finite_or_zero(f.band_energy.low),
            mid: finite_or_zero(f.band_energy.mid),
            high: finite_or_zero(f.band_energy.high),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::NEON_SPECTRUM;

    fn input<'a>(spectrum: &'a [f32], controls: &'a ControlConfig, onset: bool) -> MapInput<'a> {
        MapInput {
            features: FeatureSet::default(),
            smoothed: Smoothed {
                rms: 0.3,
                centroid: 2000.0,
            },
            onset: onset.then_some(OnsetEvent { tick: 0 }),
            spectrum,
            preset: &NEON_SPECTRUM,
            controls,
        }
    }

    #[test]
    fn test_bloom_passes_through() {
        let mut mapper = ParameterMapper::new(&AnalysisConfig::default());
        let mut out = mapper.blank_params();
        let spectrum = vec![-40.0; 1024];
        let controls = ControlConfig {
            bloom: 0.33,
            ..Default::default()
        };
        mapper.map(&input(&spectrum, &controls, false), &mut out);
        assert_eq!(out.bloom, 0.33);

        let controls = ControlConfig {
            bloom: 4.0,
            ..Default::default()
        };
        mapper.map(&input(&spectrum, &controls, false), &mut out);
        assert_eq!(out.bloom, 1.0);
    }

    #[test]
    fn test_nan_features_read_as_zero() {
        let mut mapper = ParameterMapper::new(&AnalysisConfig::default());
        let mut out = mapper.blank_params();
        let spectrum = vec![-40.0; 1024];
        let controls = ControlConfig::default();
        let mut map_input = input(&spectrum, &controls, false);
        map_input.smoothed = Smoothed {
            rms: f32::NAN,
            centroid: f32::INFINITY,
        };
        map_input.features.flux = f32::NAN;
        mapper.map(&map_input, &mut out);

        assert_eq!(out.smoothed, Smoothed::default());
        assert_eq!(out.features.flux, 0.0);
        assert!(out
            .bars
            .iter()
            .all(|b| b.height.is_finite() && b.hue.is_finite() && b.opacity.is_finite()));
    }

    #[test]
    fn test_refresh_controls_clears_rings_without_advancing() {
        let mut mapper = ParameterMapper::new(&AnalysisConfig::default());
        let mut out = mapper.blank_params();
        let spectrum = vec![-40.0; 1024];
        let controls = ControlConfig::default();
        mapper.map(&input(&spectrum, &controls, true), &mut out);
        let ring = out.rings[0];

        mapper.refresh_controls(&NEON_SPECTRUM, &controls, &mut out);
        assert_eq!(out.rings, vec![ring]);

        let off = ControlConfig {
            onset_rings: false,
            bloom: 0.2,
            ..Default::default()
        };
        mapper.refresh_controls(&NEON_SPECTRUM, &off, &mut out);
        assert!(out.rings.is_empty());
        assert!(mapper.active_rings().is_empty());
        assert_eq!(out.bloom, 0.2);
        assert!(!out.controls.onset_rings);
    }

    #[test]
    fn test_mapping_does_not_grow_buffers() {
        let mut mapper = ParameterMapper::new(&AnalysisConfig::default());
        let mut out = mapper.blank_params();
        let bars_ptr = out.bars.as_ptr();
        let rings_cap = out.rings.capacity();
        let spectrum = vec![-20.0; 1024];
        let controls = ControlConfig::default();

        for tick in 0..500 {
            mapper.map(&input(&spectrum, &controls, tick % 2 == 0), &mut out);
        }
        assert_eq!(out.bars.as_ptr(), bars_ptr);
        assert_eq!(out.rings.capacity(), rings_cap);
    }
}
