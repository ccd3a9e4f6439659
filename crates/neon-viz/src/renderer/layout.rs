//! Maps scene units onto the window.
//!
//! Sizes from the visual parameters (bar heights, ring radii) are in scene
//! units; the window shows about 7.7 units top to bottom.

use nannou::prelude::*;

/// Half the visible scene height in scene units
const SCENE_HALF_HEIGHT: f32 = 3.84;

/// Distance between bar centres
const BAR_SPACING: f32 = 0.15;

const BAR_WIDTH: f32 = 0.1;

/// Bars and flat rings sit on this line
const BASELINE: f32 = -2.0;

/// Share of the window width the bar row may use
const MAX_ROW_WIDTH: f32 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub bounds: Rect,
    /// Pixels per scene unit
    pub unit: f32,
    /// Pixels between bar centres
    pub spacing: f32,
    pub bar_width: f32,
    /// Baseline y in pixels
    pub baseline: f32,
}

impl Layout {
    pub fn new(bounds: Rect, bar_count: usize) -> Self {
        let unit = bounds.h() / (2.0 * SCENE_HALF_HEIGHT);
        let fit = bounds.w() * MAX_ROW_WIDTH / bar_count.max(1) as f32;
        let spacing = (BAR_SPACING * unit).min(fit);

        Self {
            bounds,
            unit,
            spacing,
            bar_width: spacing * BAR_WIDTH / BAR_SPACING,
            baseline: bounds.y() + BASELINE * unit,
        }
    }

    /// Horizontal centre of bar `i` in a row of `count`.
    pub fn bar_x(&self, i: usize, count: usize) -> f32 {
        self.bounds.x() + (i as f32 - count as f32 / 2.0) * self.spacing
    }

    /// Scene units to pixels.
    pub fn px(&self, units: f32) -> f32 {
        units * self.unit
    }
}
