//! Cyber rosette: one spoke per bar around the centre, slowly turning.

use std::f32::consts::TAU;

use nannou::prelude::*;
use neon_viz_core::VisualParameters;

use super::bars::bar_rgb;
use super::bloom::halo_layers;
use super::color::{brightness, preset_rgba, rgb_to_rgba};
use super::layout::Layout;

/// Hub radius in scene units
const INNER_RADIUS: f32 = 0.6;

const ROTATION_PER_TICK: f32 = 0.002;

/// Direction of spoke `i` of `count` at `tick`.
pub fn spoke_direction(i: usize, count: usize, tick: u64) -> Vec2 {
    let angle = i as f32 / count.max(1) as f32 * TAU + tick as f32 * ROTATION_PER_TICK;
    vec2(angle.cos(), angle.sin())
}

pub fn draw(draw: &Draw, layout: &Layout, params: &VisualParameters) {
    let center = layout.bounds.xy();
    let count = params.bars.len();
    let inner = layout.px(INNER_RADIUS);
    let max_len = (layout.bounds.w().min(layout.bounds.h()) / 2.0 - inner).max(1.0);
    let weight = (TAU * inner / count.max(1) as f32 * 0.6).max(1.0);

    for (i, bar) in params.bars.iter().enumerate() {
        let dir = spoke_direction(i, count, params.tick);
        let start = center + dir * inner;
        let end = center + dir * (inner + layout.px(bar.height).min(max_len));
        let rgb = bar_rgb(bar);

        for (scale, alpha) in halo_layers(params.bloom, brightness(rgb)) {
            draw.line()
                .start(start)
                .end(end)
                .weight(weight * (1.0 + scale * 2.0))
                .color(rgb_to_rgba(rgb, alpha * bar.opacity));
        }

        draw.line()
            .start(start)
            .end(end)
            .weight(weight)
            .color(rgb_to_rgba(rgb, bar.opacity));
    }

    // Hub
    draw.ellipse()
        .xy(center)
        .w_h(inner * 2.0, inner * 2.0)
        .no_fill()
        .stroke(preset_rgba(params.preset.colors.accent, 0.4))
        .stroke_weight(2.0);
}
