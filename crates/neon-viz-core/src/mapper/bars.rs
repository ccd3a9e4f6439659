//! Spectrum-bars policy: one bar per group of bins.

use super::{MapInput, MappingPolicy, VisualParameters};
use crate::config::BarsConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BarParams {
    /// Approximate linear level of the bar's representative bin (>= 0)
    pub magnitude: f32,
    /// Drawn height, never below the configured minimum
    pub height: f32,
    /// Hue in degrees, wrapped to [0, 360)
    pub hue: f32,
    /// Opacity in [0, 1]
    pub opacity: f32,
}

pub struct BarsPolicy {
    config: BarsConfig,
}

impl BarsPolicy {
    pub fn new(config: BarsConfig) -> Self {
        Self {
            config: BarsConfig {
                bar_count: config.bar_count.max(1),
                ..config
            },
        }
    }

    pub fn bar_count(&self) -> usize {
        self.config.bar_count
    }

    /// Gain applied to every bar this tick.
    pub fn amplitude_scale(&self, smoothed_rms: f32, sensitivity: f32) -> f32 {
        smoothed_rms.max(0.0) * sensitivity * self.config.amplitude_scale
    }
}

/// `(dB + 100) / 100`, floored at 0. Non-finite readings give 0.
pub fn normalize_db(db: f32) -> f32 {
    if db.is_finite() {
        ((db + 100.0) / 100.0).max(0.0)
    } else {
        0.0
    }
}

impl MappingPolicy for BarsPolicy {
    fn map(&mut self, input: &MapInput<'_>, out: &mut VisualParameters) {
        let cfg = &self.config;
        let bar_count = cfg.bar_count;
        // Only reallocates if the renderer handed in a foreign value.
        out.bars.resize(bar_count, BarParams::default());

        let scale = self.amplitude_scale(input.smoothed.rms, input.controls.sensitivity);
        let bins = input.spectrum.len();
        let stride = (bins / bar_count).max(1);
        let base_hue = input.preset.base_hue;

        let centroid_hue = if cfg.max_centroid_norm > 0.0 {
            (input.smoothed.centroid.max(0.0) / cfg.max_centroid_norm) * cfg.hue_spread + base_hue
        } else {
            base_hue
        };

        for (i, bar) in out.bars.iter_mut().enumerate() {
            let magnitude = if bins == 0 {
                0.0
            } else {
                normalize_db(input.spectrum[(i * stride).min(bins - 1)])
            };

            let hue = if input.controls.pitch_to_color {
                centroid_hue
            } else {
                (i as f32 / bar_count as f32) * cfg.hue_spread + base_hue
            };

            *bar = BarParams {
                magnitude,
                height: (magnitude * scale * 2.0).max(cfg.min_height),
                hue: wrap_hue(hue),
                opacity: (magnitude * 0.8 + 0.2).clamp(0.0, 1.0),
            };
        }
    }
}

fn wrap_hue(hue: f32) -> f32 {
    if !hue.is_finite() {
        return 0.0;
    }
    let wrapped = hue.rem_euclid(360.0);
    // Tiny negative inputs round up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlConfig;
    use crate::features::FeatureSet;
    use crate::mapper::Smoothed;
    use crate::preset::{CYBER_ROSETTE, NEON_SPECTRUM};

    fn run(spectrum: &[f32], controls: ControlConfig, smoothed: Smoothed) -> VisualParameters {
        let mut policy = BarsPolicy::new(BarsConfig::default());
        let mut out = VisualParameters::new(64, 0);
        let input = MapInput {
            features: FeatureSet::default(),
            smoothed,
            onset: None,
            spectrum,
            preset: &NEON_SPECTRUM,
            controls: &controls,
        };
        policy.map(&input, &mut out);
        out
    }

    #[test]
    fn test_wrap_hue_stays_below_360() {
        assert_eq!(wrap_hue(-1e-6), 0.0);
        assert_eq!(wrap_hue(360.0), 0.0);
        assert!((wrap_hue(-90.0) - 270.0).abs() < 1e-4);
        assert!((wrap_hue(450.0) - 90.0).abs() < 1e-4);
        assert_eq!(wrap_hue(f32::NAN), 0.0);
    }

    #[test]
    fn test_silence_sits_at_min_height() {
        let out = run(&[-160.0; 1024], ControlConfig::default(), Smoothed::default());
        assert_eq!(out.bars.len(), 64);
        for bar in &out.bars {
            assert_eq!(bar.magnitude, 0.0);
            assert_eq!(bar.height, 0.1);
            assert!((bar.opacity - 0.2).abs() < 1e-6);
        }
    }

    #[test]
    fn test_height_formula() {
        let controls = ControlConfig {
            sensitivity: 0.5,
            ..Default::default()
        };
        let out = run(&[-50.0; 1024], controls, Smoothed { rms: 0.4, centroid: 0.0 });
        // magnitude 0.5, scale 0.4 * 0.5 * 5 = 1.0, height 0.5 * 1.0 * 2
        let bar = out.bars[10];
        assert!((bar.magnitude - 0.5).abs() < 1e-6);
        assert!((bar.height - 1.0).abs() < 1e-5);
        assert!((bar.opacity - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_representative_bin_uses_stride() {
        let mut spectrum = vec![-100.0; 1024];
        spectrum[16 * 3] = 0.0;
        let out = run(&spectrum, ControlConfig::default(), Smoothed::default());
        assert_eq!(out.bars[3].magnitude, 1.0);
        assert_eq!(out.bars[2].magnitude, 0.0);
        assert_eq!(out.bars[4].magnitude, 0.0);
    }

    #[test]
    fn test_short_spectrum_never_reads_past_end() {
        let spectrum: Vec<f32> = (0..10).map(|i| -100.0 + i as f32 * 10.0).collect();
        let out = run(&spectrum, ControlConfig::default(), Smoothed::default());
        // stride clamps to 1; bars past the end reuse the last bin
        assert!((out.bars[9].magnitude - 0.9).abs() < 1e-6);
        assert!((out.bars[63].magnitude - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_to_color_hue_is_uniform() {
        let out = run(&[-30.0; 1024], ControlConfig::default(), Smoothed { rms: 0.1, centroid: 5000.0 });
        // 5000 / 10000 * 60 + 270
        assert!(out.bars.iter().all(|b| (b.hue - 300.0).abs() < 1e-4));
    }

    #[test]
    fn test_index_hue_and_wrap() {
        let controls = ControlConfig {
            pitch_to_color: false,
            ..Default::default()
        };
        let out = run(&[-30.0; 1024], controls, Smoothed::default());
        assert!((out.bars[0].hue - 270.0).abs() < 1e-4);
        assert!((out.bars[32].hue - 300.0).abs() < 1e-4);

        let mut policy = BarsPolicy::new(BarsConfig::default());
        let mut wrapped = VisualParameters::new(64, 0);
        let input = MapInput {
            features: FeatureSet::default(),
            smoothed: Smoothed { rms: 0.0, centroid: 100_000.0 },
            onset: None,
            spectrum: &[-30.0; 16],
            preset: &CYBER_ROSETTE,
            controls: &ControlConfig::default(),
        };
        policy.map(&input, &mut wrapped);
        // 100000 / 10000 * 60 + 30 = 630 -> 270
        assert!((wrapped.bars[0].hue - 270.0).abs() < 1e-3);
    }

    #[test]
    fn test_normalize_db() {
        assert_eq!(normalize_db(-100.0), 0.0);
        assert_eq!(normalize_db(-140.0), 0.0);
        assert_eq!(normalize_db(0.0), 1.0);
        assert_eq!(normalize_db(f32::NAN), 0.0);
    }
}
