//! Onset rings in the preset's secondary colour.

use nannou::prelude::*;
use neon_viz_core::{PresetStyle, VisualParameters};

use super::bloom::halo_layers;
use super::color::{brightness, preset_rgba};
use super::layout::Layout;

/// Ring band width in scene units
const RING_WIDTH: f32 = 0.1;

/// Vertical squash per style. Rings lie flat under the bar row.
fn squash(style: PresetStyle) -> f32 {
    match style {
        PresetStyle::Bars => 0.3,
        PresetStyle::Ribbons => 0.5,
        PresetStyle::Radial => 1.0,
    }
}

fn centre(layout: &Layout, style: PresetStyle) -> Vec2 {
    match style {
        PresetStyle::Bars => pt2(layout.bounds.x(), layout.baseline),
        PresetStyle::Ribbons | PresetStyle::Radial => layout.bounds.xy(),
    }
}

pub fn draw(draw: &Draw, layout: &Layout, params: &VisualParameters) {
    if params.rings.is_empty() {
        return;
    }

    let style = params.preset.style;
    let color = params.preset.colors.secondary;
    let glow = brightness(color.to_f32());
    let center = centre(layout, style);
    let squash = squash(style);
    let weight = layout.px(RING_WIDTH).max(1.0);

    for ring in &params.rings {
        let d = layout.px(ring.radius) * 2.0;
        let opacity = ring.opacity.clamp(0.0, 1.0);

        for (scale, alpha) in halo_layers(params.bloom, glow) {
            draw.ellipse()
                .xy(center)
                .w_h(d, d * squash)
                .no_fill()
                .stroke(preset_rgba(color, alpha * opacity))
                .stroke_weight(weight * (1.0 + scale * 2.0));
        }

        draw.ellipse()
            .xy(center)
            .w_h(d, d * squash)
            .no_fill()
            .stroke(preset_rgba(color, opacity))
            .stroke_weight(weight);
    }
}
