//! Colour conversion shared by the scene layers.

use nannou::prelude::*;
use neon_viz_core::Rgb;

/// Scene background, 0x0a0a0f
pub const BACKGROUND: Rgb = Rgb::from_hex(0x0a0a0f);

/// HSL to RGB. Hue in degrees (any range), saturation and lightness in
/// [0, 1]. Channels come back in [0, 1].
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (f32, f32, f32) {
    let hue = if hue.is_finite() { hue.rem_euclid(360.0) } else { 0.0 };
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let h = hue / 60.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r1, g1, b1) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (r1 + m, g1 + m, b1 + m)
}

pub fn rgb_to_rgba((r, g, b): (f32, f32, f32), alpha: f32) -> Srgba<u8> {
    srgba(to_u8(r), to_u8(g), to_u8(b), to_u8(alpha))
}

/// A preset colour with the given opacity.
pub fn preset_rgba(color: Rgb, alpha: f32) -> Srgba<u8> {
    srgba(color.r, color.g, color.b, to_u8(alpha))
}

/// Brightness used for the bloom threshold: the HSV value (largest channel).
pub fn brightness((r, g, b): (f32, f32, f32)) -> f32 {
    r.max(g).max(b)
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
