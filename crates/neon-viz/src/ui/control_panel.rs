//! Control panel HUD: current control values and the one being edited.

use nannou::prelude::*;
use neon_viz_core::{Control, ControlConfig, ControlUpdate, FeatureSet, Preset};

/// Change per key press
pub const STEP: f32 = 0.05;

pub struct ControlPanel {
    pub visible: bool,
    pub selected: Control,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self {
            visible: true,
            selected: Control::Sensitivity,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn select_next(&mut self) {
        self.selected = self.selected.next();
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.prev();
    }

    /// Update that nudges the selected control by `steps` increments.
    pub fn nudge(&self, controls: &ControlConfig, steps: f32) -> ControlUpdate {
        let value = controls.get(self.selected) + steps * STEP;
        // Snap to the step grid so repeated presses land on round values
        self.selected.set(((value / STEP).round() * STEP).clamp(0.0, 1.0))
    }

    pub fn draw(
        &self,
        draw: &Draw,
        bounds: Rect,
        controls: &ControlConfig,
        preset: &Preset,
        features: &FeatureSet,
    ) {
        if !self.visible {
            return;
        }

        let padding = 12.0;
        let line_height = 20.0;
        let font_size = 14;
        let width = 260.0;
        let bar_width = 80.0;
        let rows = Control::ALL.len() + 4;
        let height = line_height * rows as f32 + padding * 2.0;

        // Bottom-left corner
        let x = bounds.left() + width / 2.0 + padding;
        let y = bounds.bottom() + height / 2.0 + padding;

        draw.rect()
            .x_y(x, y)
            .w_h(width, height)
            .color(rgba(0.0, 0.0, 0.0, 0.6));

        let left = x - width / 2.0 + padding;
        let text_width = width - padding * 2.0 - bar_width;
        let mut row_y = y + height / 2.0 - padding - line_height / 2.0;

        draw.text(preset.name)
            .xy(pt2(x, row_y))
            .wh(pt2(width - padding * 2.0, line_height))
            .left_justify()
            .color(rgba(0.5, 0.8, 1.0, 0.9))
            .font_size(font_size);

        for control in Control::ALL {
            row_y -= line_height;
            let value = controls.get(control);
            let is_selected = control == self.selected;
            let prefix = if is_selected { "> " } else { "  " };
            let color = if is_selected {
                rgb(0.3, 0.8, 1.0)
            } else {
                rgb(1.0, 1.0, 1.0)
            };

            draw.text(&format!("{}{}", prefix, control.label()))
                .xy(pt2(left + text_width / 2.0, row_y))
                .wh(pt2(text_width, line_height))
                .left_justify()
                .no_line_wrap()
                .color(color)
                .font_size(font_size);

            // Value gauge
            let gauge_x = left + text_width + bar_width / 2.0;
            draw.rect()
                .x_y(gauge_x, row_y)
                .w_h(bar_width, 6.0)
                .color(rgba(1.0, 1.0, 1.0, 0.15));
            let filled = bar_width * value.clamp(0.0, 1.0);
            draw.rect()
                .x_y(gauge_x - bar_width / 2.0 + filled / 2.0, row_y)
                .w_h(filled, 6.0)
                .color(color);
        }

        for (label, on) in [("Onset rings", controls.onset_rings), ("Pitch to color", controls.pitch_to_color)] {
            row_y -= line_height;
            let state = if on { "on" } else { "off" };
            draw.text(&format!("  {}: {}", label, state))
                .xy(pt2(x, row_y))
                .wh(pt2(width - padding * 2.0, line_height))
                .left_justify()
                .color(rgba(1.0, 1.0, 1.0, 0.7))
                .font_size(font_size);
        }

        row_y -= line_height;
        let readout = format!(
            "  rms {:.2}  {:>5.0} Hz  flux {:.0}",
            features.rms, features.centroid, features.flux
        );
        draw.text(&readout)
            .xy(pt2(x, row_y))
            .wh(pt2(width - padding * 2.0, line_height))
            .left_justify()
            .no_line_wrap()
            .color(rgba(1.0, 1.0, 1.0, 0.5))
            .font_size(font_size);
    }
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}
