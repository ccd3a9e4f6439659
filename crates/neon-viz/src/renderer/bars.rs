//! Spectrum bars standing in a row on the baseline.

use nannou::prelude::*;
use neon_viz_core::{BarParams, VisualParameters};

use super::bloom::halo_layers;
use super::color::{brightness, hsl_to_rgb, rgb_to_rgba};
use super::layout::Layout;

pub const SATURATION: f32 = 0.8;
pub const LIGHTNESS: f32 = 0.6;

/// Colour of a bar from its mapped hue.
pub fn bar_rgb(bar: &BarParams) -> (f32, f32, f32) {
    hsl_to_rgb(bar.hue, SATURATION, LIGHTNESS)
}

pub fn draw(draw: &Draw, layout: &Layout, params: &VisualParameters) {
    let count = params.bars.len();
    let max_height = (layout.bounds.top() - layout.baseline).max(1.0);

    for (i, bar) in params.bars.iter().enumerate() {
        let x = layout.bar_x(i, count);
        let h = layout.px(bar.height).min(max_height);
        let y = layout.baseline + h / 2.0;
        let rgb = bar_rgb(bar);

        for (scale, alpha) in halo_layers(params.bloom, brightness(rgb)) {
            draw.rect()
                .x_y(x, y)
                .w_h(layout.bar_width * (1.0 + scale), h + layout.bar_width * scale)
                .color(rgb_to_rgba(rgb, alpha * bar.opacity));
        }

        draw.rect()
            .x_y(x, y)
            .w_h(layout.bar_width, h)
            .color(rgb_to_rgba(rgb, bar.opacity));
    }
}
