//! Preset picker: a list in the top-right corner, navigated with the arrows.

use nannou::prelude::*;
use neon_viz_core::{Preset, PRESETS};

const ROW_HEIGHT: f32 = 22.0;
const PADDING: f32 = 20.0;
const WIDTH: f32 = 420.0;
const SWATCH: f32 = 12.0;

#[derive(Debug, Default)]
pub struct PresetPicker {
    pub active: bool,
    cursor: usize,
}

impl PresetPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open with the cursor on `current`.
    pub fn show(&mut self, current: &Preset) {
        self.cursor = current.index();
        self.active = true;
    }

    pub fn hide(&mut self) {
        self.active = false;
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.checked_sub(1).unwrap_or(PRESETS.len() - 1);
    }

    pub fn move_down(&mut self) {
        self.cursor = (self.cursor + 1) % PRESETS.len();
    }

    pub fn selected(&self) -> Preset {
        PRESETS.get(self.cursor).copied().unwrap_or_default()
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect, current: &Preset) {
        if !self.active {
            return;
        }

        // Title, two rows per preset, hint line
        let rows = PRESETS.len() * 2 + 3;
        let panel = Rect::from_w_h(WIDTH, ROW_HEIGHT * rows as f32 + PADDING * 2.0)
            .top_right_of(bounds.pad(PADDING));
        draw.rect()
            .xy(panel.xy())
            .wh(panel.wh())
            .color(rgba(0.0, 0.0, 0.0, 0.85))
            .stroke(rgba(1.0, 1.0, 1.0, 0.3))
            .stroke_weight(1.0);

        let inner = panel.pad(PADDING);
        let mut row = Rect::from_w_h(inner.w(), ROW_HEIGHT).mid_top_of(inner);

        draw.text("Presets")
            .xy(row.xy())
            .wh(row.wh())
            .center_justify()
            .color(rgba(0.5, 0.8, 1.0, 0.9))
            .font_size(18);
        let rule_y = row.bottom() - ROW_HEIGHT * 0.2;
        draw.line()
            .start(pt2(inner.left(), rule_y))
            .end(pt2(inner.right(), rule_y))
            .color(rgba(1.0, 1.0, 1.0, 0.3))
            .weight(1.0);
        row = row.shift_y(-ROW_HEIGHT);

        for (i, preset) in PRESETS.iter().enumerate() {
            row = row.shift_y(-ROW_HEIGHT);
            let selected = i == self.cursor;
            let marker = match (selected, preset.name == current.name) {
                (true, _) => "> ",
                (false, true) => "* ",
                _ => "  ",
            };
            let color = if selected {
                rgb(0.3, 0.8, 1.0)
            } else {
                rgb(1.0, 1.0, 1.0)
            };

            draw.text(&format!("{}{}", marker, preset.name))
                .xy(row.xy())
                .wh(row.wh())
                .left_justify()
                .no_line_wrap()
                .color(color)
                .font_size(18);

            // Palette swatches on the right of the name row
            let colors = [preset.colors.primary, preset.colors.secondary, preset.colors.accent];
            for (k, c) in colors.into_iter().enumerate() {
                let x = row.right() - SWATCH * (3.5 - k as f32 * 1.5);
                draw.rect()
                    .x_y(x, row.y())
                    .w_h(SWATCH, SWATCH)
                    .color(rgb8(c.r, c.g, c.b));
            }

            row = row.shift_y(-ROW_HEIGHT);
            draw.text(preset.description)
                .xy(row.xy())
                .wh(row.wh())
                .left_justify()
                .no_line_wrap()
                .color(rgba(1.0, 1.0, 1.0, 0.5))
                .font_size(14);
        }

        let hint = Rect::from_w_h(inner.w(), ROW_HEIGHT).mid_bottom_of(inner);
        draw.text("Enter: select | Esc: close")
            .xy(hint.xy())
            .wh(hint.wh())
            .center_justify()
            .color(rgba(1.0, 1.0, 1.0, 0.5))
            .font_size(14);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_starts_on_current() {
        let mut picker = PresetPicker::new();
        picker.show(&Preset::by_name("Cyber Rosette"));
        assert!(picker.active);
        assert_eq!(picker.selected().name, "Cyber Rosette");
    }

    #[test]
    fn test_navigation_wraps() {
        let mut picker = PresetPicker::new();
        picker.move_up();
        assert_eq!(picker.selected().name, PRESETS[PRESETS.len() - 1].name);
        picker.move_down();
        assert_eq!(picker.selected().name, "Neon Spectrum");
        picker.move_down();
        assert_eq!(picker.selected().name, "Aurora Ribbons");
    }

    #[test]
    fn test_hide_keeps_cursor() {
        let mut picker = PresetPicker::new();
        picker.show(&Preset::default());
        picker.move_down();
        picker.hide();
        assert!(!picker.active);
        assert_eq!(picker.selected().name, "Aurora Ribbons");
    }
}
