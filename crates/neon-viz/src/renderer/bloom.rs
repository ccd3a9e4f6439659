//! Glow approximation: stacked translucent halos behind bright shapes.
//!
//! Only colours brighter than the luminance threshold glow; the smoothing
//! width fades the halo in above it. The bloom control scales the result.

/// Brightness where glow starts
pub const LUMINANCE_THRESHOLD: f32 = 0.4;

/// Width of the fade-in above the threshold
pub const LUMINANCE_SMOOTHING: f32 = 0.9;

const HALO_LAYERS: usize = 4;

/// How far the outermost halo reaches, relative to the shape's size
const HALO_SPREAD: f32 = 1.5;

/// Opacity of the innermost halo at full bloom
const MAX_HALO_ALPHA: f32 = 0.35;

/// Smoothstep of `brightness` across the threshold band.
pub fn glow_weight(brightness: f32) -> f32 {
    let t = ((brightness - LUMINANCE_THRESHOLD) / LUMINANCE_SMOOTHING).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Halo layers for one shape, innermost first, as `(scale, alpha)`.
/// `scale` multiplies the shape's extent; empty when there is no glow.
pub fn halo_layers(intensity: f32, brightness: f32) -> impl Iterator<Item = (f32, f32)> {
    let strength = intensity.clamp(0.0, 1.0) * glow_weight(brightness);
    let layers = if strength > 0.0 { HALO_LAYERS } else { 0 };

    (1..=layers).map(move |layer| {
        let t = layer as f32 / HALO_LAYERS as f32;
        (1.0 + t * HALO_SPREAD, strength * MAX_HALO_ALPHA * (1.0 - t * 0.8))
    })
}
