//! Scene drawing with nannou.
//!
//! [`SceneRenderer`] is the pipeline's [`Renderer`]: `present` stores the
//! tick's parameters, and the nannou `view` callback draws whatever was
//! presented last.

mod bars;
mod bloom;
mod color;
mod layout;
mod particles;
mod radial;
mod ribbons;
mod rings;

use nannou::prelude::*;
use neon_viz_core::{PresetStyle, Renderer, VisualParameters};

use color::{preset_rgba, BACKGROUND};
use layout::Layout;
use particles::ParticleField;

/// Fade alpha at the longest trail
const MIN_FADE: f32 = 0.08;

const NOTIFICATION_FRAMES: u32 = 180; // ~3 seconds at 60fps

/// Resolution settings for the window
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Resolution {
    pub fn current(windowed: bool) -> Self {
        if windowed || cfg!(debug_assertions) {
            Self {
                width: 960,
                height: 540,
                fullscreen: false,
            }
        } else {
            Self {
                width: 1280,
                height: 720,
                fullscreen: true,
            }
        }
    }
}

/// Opacity of the background wash drawn over the previous frame.
/// Longer trails fade slower; 0 clears every frame.
pub fn trail_fade_alpha(trail_length: f32) -> f32 {
    let trail = if trail_length.is_nan() { 0.0 } else { trail_length.clamp(0.0, 1.0) };
    1.0 - trail * (1.0 - MIN_FADE)
}

pub struct SceneRenderer {
    params: VisualParameters,
    particles: ParticleField,
    presented: u64,
    notification_text: Option<String>,
    notification_frames: u32,
}

impl SceneRenderer {
    /// `blank` should come from the pipeline so buffer sizes match.
    pub fn new(blank: VisualParameters) -> Self {
        Self {
            params: blank,
            particles: ParticleField::new(),
            presented: 0,
            notification_text: None,
            notification_frames: 0,
        }
    }

    /// Parameters from the last `present`.
    pub fn params(&self) -> &VisualParameters {
        &self.params
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Shows a notification message for 3 seconds
    pub fn show_notification(&mut self, text: String) {
        self.notification_text = Some(text);
        self.notification_frames = NOTIFICATION_FRAMES;
    }

    /// Advance UI timers. Call once per app update.
    pub fn step(&mut self) {
        if self.notification_frames > 0 {
            self.notification_frames -= 1;
            if self.notification_frames == 0 {
                self.notification_text = None;
            }
        }
    }

    /// Draw the scene. `clear` wipes the frame instead of fading it.
    pub fn draw(&self, draw: &Draw, bounds: Rect, clear: bool) {
        let params = &self.params;

        if clear {
            draw.background().color(preset_rgba(BACKGROUND, 1.0));
        } else {
            draw.rect()
                .xy(bounds.xy())
                .wh(bounds.wh())
                .color(preset_rgba(BACKGROUND, trail_fade_alpha(params.controls.trail_length)));
        }

        self.particles.draw(draw, bounds, params);

        let layout = Layout::new(bounds, params.bars.len());
        match params.preset.style {
            PresetStyle::Bars => bars::draw(draw, &layout, params),
            PresetStyle::Ribbons => ribbons::draw(draw, &layout, params),
            PresetStyle::Radial => radial::draw(draw, &layout, params),
        }
        rings::draw(draw, &layout, params);
    }

    pub fn draw_notification(&self, draw: &Draw, bounds: Rect) {
        if let Some(ref text) = self.notification_text {
            let alpha = (self.notification_frames as f32 / NOTIFICATION_FRAMES as f32).min(1.0);
            draw.text(text)
                .x_y(0.0, bounds.top() - 30.0)
                .color(rgba(1.0, 1.0, 1.0, alpha))
                .font_size(24);
        }
    }
}

impl Renderer for SceneRenderer {
    fn present(&mut self, params: &VisualParameters) {
        self.params.clone_from(params);
        self.particles.update(params);
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_viz_core::{Preset, RingInstance};

    #[test]
    fn test_trail_fade() {
        assert_eq!(trail_fade_alpha(0.0), 1.0);
        assert!((trail_fade_alpha(1.0) - MIN_FADE).abs() < 1e-6);
        assert!(trail_fade_alpha(0.8) < trail_fade_alpha(0.2));
        assert_eq!(trail_fade_alpha(f32::NAN), 1.0);
    }

    #[test]
    fn test_present_keeps_latest() {
        let mut renderer = SceneRenderer::new(VisualParameters::new(64, 8));
        let mut params = VisualParameters::new(64, 8);
        params.tick = 7;
        params.preset = Preset::by_name("Cyber Rosette");
        params.rings.push(RingInstance {
            age: 1,
            radius: 0.55,
            opacity: 0.78,
        });

        renderer.present(&params);
        assert_eq!(renderer.presented(), 1);
        assert_eq!(renderer.params(), &params);

        params.rings.clear();
        params.tick = 8;
        renderer.present(&params);
        assert!(renderer.params().rings.is_empty());
        assert_eq!(renderer.params().tick, 8);
    }

    #[test]
    fn test_notification_expires() {
        let mut renderer = SceneRenderer::new(VisualParameters::new(4, 0));
        renderer.show_notification("Aurora Ribbons".into());
        for _ in 0..NOTIFICATION_FRAMES - 1 {
            renderer.step();
        }
        assert!(renderer.notification_text.is_some());
        renderer.step();
        assert!(renderer.notification_text.is_none());
    }
}
