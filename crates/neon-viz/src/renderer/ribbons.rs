//! Aurora ribbons: bar heights drawn as layered waves.
//!
//! The ripple frequency follows the smoothed spectral centroid, so brighter
//! sounds make tighter waves.

use nannou::prelude::*;
use neon_viz_core::VisualParameters;

use super::bars::bar_rgb;
use super::bloom::halo_layers;
use super::color::{brightness, rgb_to_rgba};
use super::layout::Layout;

const RIBBONS: usize = 3;

/// Centroid that gives the tightest ripple
const CENTROID_NORM: f32 = 10000.0;

/// Vertical gap between ribbons in scene units
const RIBBON_GAP: f32 = 0.6;

const PHASE_PER_TICK: f32 = 0.04;

/// Ripple frequency in radians per bar.
pub fn ripple_frequency(smoothed_centroid: f32) -> f32 {
    0.1 + 0.3 * (smoothed_centroid / CENTROID_NORM).clamp(0.0, 1.0)
}

/// Points of ribbon `index` across the window.
pub fn ribbon_points(layout: &Layout, params: &VisualParameters, index: usize) -> Vec<Vec2> {
    let bounds = layout.bounds;
    let count = params.bars.len();
    let span = bounds.w() * 0.9;
    let left = bounds.x() - span / 2.0;
    let step = span / count.saturating_sub(1).max(1) as f32;

    let freq = ripple_frequency(params.smoothed.centroid);
    let offset = (index as f32 - 1.0) * layout.px(RIBBON_GAP);
    let shift = params.tick as f32 * PHASE_PER_TICK + index as f32 * 2.1;

    params
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let amplitude = layout.px(bar.height) * 0.5;
            let wave = (i as f32 * freq + shift).sin();
            pt2(left + i as f32 * step, bounds.y() + offset + amplitude * wave)
        })
        .collect()
}

pub fn draw(draw: &Draw, layout: &Layout, params: &VisualParameters) {
    if params.bars.is_empty() {
        return;
    }

    let colors = params.preset.colors;
    let mean_opacity =
        params.bars.iter().map(|b| b.opacity).sum::<f32>() / params.bars.len() as f32;
    let alpha = 0.5 + 0.5 * mean_opacity.clamp(0.0, 1.0);
    let weight = 2.0 + params.smoothed.rms.clamp(0.0, 1.0) * 8.0;

    for index in 0..RIBBONS {
        let rgb = match index {
            // The lead ribbon follows pitch when tinting is on
            0 if params.controls.pitch_to_color => bar_rgb(&params.bars[params.bars.len() / 2]),
            0 => colors.primary.to_f32(),
            1 => colors.secondary.to_f32(),
            _ => colors.accent.to_f32(),
        };
        let points = ribbon_points(layout, params, index);

        for (scale, halo) in halo_layers(params.bloom, brightness(rgb)) {
            draw.polyline()
                .weight(weight * (1.0 + scale * 2.0))
                .points(points.clone())
                .color(rgb_to_rgba(rgb, halo * alpha));
        }

        draw.polyline()
            .weight(weight)
            .points(points)
            .color(rgb_to_rgba(rgb, alpha));
    }
}
