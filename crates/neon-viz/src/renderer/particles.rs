//! Ambient particles drifting behind the spectrum.
//!
//! The particle count follows the density control; drift speed and size
//! follow the smoothed loudness.

use std::f32::consts::TAU;

use nannou::prelude::*;
use neon_viz_core::VisualParameters;
use rand::Rng;

use super::color::preset_rgba;

pub const MAX_PARTICLES: usize = 400;

/// Drift per tick in normalized units when silent
const BASE_DRIFT: f32 = 0.002;

/// Extra drift at full loudness
const LOUDNESS_DRIFT: f32 = 0.02;

const TWINKLE_RATE: f32 = 0.05;

#[derive(Clone)]
struct Particle {
    /// Position in [-1, 1] on both axes
    pos: Vec2,
    /// Unit heading
    heading: Vec2,
    size: f32,
    /// Twinkle phase
    phase: f32,
}

impl Particle {
    fn random(rng: &mut impl Rng) -> Self {
        let angle = rng.random_range(0.0..TAU);
        Self {
            pos: vec2(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
            heading: vec2(angle.cos(), angle.sin()),
            size: rng.random_range(1.0..3.5),
            phase: rng.random_range(0.0..TAU),
        }
    }
}

pub struct ParticleField {
    particles: Vec<Particle>,
    /// Smoothed loudness from the last update
    loudness: f32,
    tick: u64,
}

impl ParticleField {
    pub fn new() -> Self {
        Self {
            particles: Vec::with_capacity(MAX_PARTICLES),
            loudness: 0.0,
            tick: 0,
        }
    }

    /// Particles wanted at `density` (0-1).
    pub fn target_count(density: f32) -> usize {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        (density * MAX_PARTICLES as f32).round() as usize
    }

    pub fn update(&mut self, params: &VisualParameters) {
        let target = Self::target_count(params.controls.particle_density);
        if self.particles.len() < target {
            let mut rng = rand::rng();
            let missing = target - self.particles.len();
            self.particles
                .extend((0..missing).map(|_| Particle::random(&mut rng)));
        } else {
            self.particles.truncate(target);
        }

        let rms = params.smoothed.rms;
        self.loudness = if rms.is_finite() { rms.clamp(0.0, 1.0) } else { 0.0 };
        self.tick = params.tick;

        let speed = BASE_DRIFT + self.loudness * LOUDNESS_DRIFT;
        for p in &mut self.particles {
            p.pos += p.heading * speed;
            p.pos = vec2(wrap_unit(p.pos.x), wrap_unit(p.pos.y));
        }
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect, params: &VisualParameters) {
        let half = bounds.wh() / 2.0;
        let color = params.preset.colors.accent;
        let grow = 1.0 + self.loudness * 2.0;

        for p in &self.particles {
            let twinkle = 0.5 + 0.5 * (p.phase + self.tick as f32 * TWINKLE_RATE).sin();
            let alpha = 0.15 + 0.25 * twinkle;
            let size = p.size * grow;

            draw.ellipse()
                .xy(bounds.xy() + p.pos * half)
                .w_h(size, size)
                .color(preset_rgba(color, alpha));
        }
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap_unit(v: f32) -> f32 {
    (v + 1.0).rem_euclid(2.0) - 1.0
}
