//! Keyboard reference drawn over the scene.

use nannou::prelude::*;

type Shortcuts = &'static [(&'static str, &'static str)];

const SECTIONS: &[(&str, Shortcuts)] = &[
    (
        "General",
        &[("h", "Toggle this help"), ("Tab", "Toggle control panel"), ("q", "Quit")],
    ),
    (
        "Presets",
        &[
            ("Space", "Next preset"),
            ("Up / Down", "Open picker, move"),
            ("Enter", "Pick preset"),
            ("b", "Restore the preset's bloom"),
        ],
    ),
    (
        "Controls",
        &[
            ("[ / ]", "Select control"),
            ("- / =", "Adjust selected control"),
            ("r", "Onset rings on/off"),
            ("c", "Pitch to color on/off"),
        ],
    ),
    (
        "Input",
        &[("0-9", "Switch device (Shift: +10)"), ("Esc / x", "Stop input")],
    ),
];

const LINE_HEIGHT: f32 = 24.0;
const PADDING: f32 = 25.0;
const WIDTH: f32 = 540.0;
const KEY_COLUMN: f32 = 120.0;
const GAP: f32 = 15.0;
const FONT_SIZE: u32 = 18;

/// Rows drawn: a header per section, its shortcuts, and the status line.
fn row_count() -> usize {
    SECTIONS.iter().map(|(_, keys)| keys.len() + 1).sum::<usize>() + 1
}

#[derive(Default)]
pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Centered panel; `input` is shown on the last line.
    pub fn draw(&self, draw: &Draw, bounds: Rect, input: &str) {
        if !self.visible {
            return;
        }

        let height = LINE_HEIGHT * row_count() as f32 + PADDING * 2.0;
        let panel = Rect::from_w_h(WIDTH, height).middle_of(bounds);

        draw.rect()
            .xy(panel.xy())
            .wh(panel.wh())
            .color(rgba(0.0, 0.0, 0.0, 0.9))
            .stroke(rgba(1.0, 1.0, 1.0, 0.3))
            .stroke_weight(1.0);

        let inner = panel.pad(PADDING);
        let desc_width = inner.w() - KEY_COLUMN - GAP;
        let key_x = inner.left() + KEY_COLUMN / 2.0;
        let desc_x = inner.right() - desc_width / 2.0;
        let mut y = inner.top() - LINE_HEIGHT / 2.0;

        let header = |text: &str, y: f32| {
            draw.text(text)
                .x_y(inner.x(), y)
                .w_h(inner.w(), LINE_HEIGHT)
                .center_justify()
                .color(rgba(0.5, 0.8, 1.0, 0.8))
                .font_size(FONT_SIZE);
        };

        for (title, keys) in SECTIONS {
            header(&format!("--- {} ---", title), y);
            y -= LINE_HEIGHT;

            for (key, desc) in keys.iter() {
                draw.text(key)
                    .x_y(key_x, y)
                    .w_h(KEY_COLUMN, LINE_HEIGHT)
                    .right_justify()
                    .color(rgb(0.3, 0.8, 1.0))
                    .font_size(FONT_SIZE);
                draw.text(desc)
                    .x_y(desc_x, y)
                    .w_h(desc_width, LINE_HEIGHT)
                    .left_justify()
                    .color(WHITE)
                    .font_size(FONT_SIZE);
                y -= LINE_HEIGHT;
            }
        }

        header(&format!("Input: {}", input), y);
    }
}
