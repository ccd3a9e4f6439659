//! Keyboard bindings and input handling.
//!
//! Centralizes all keyboard shortcuts and key mapping logic.

use nannou::prelude::*;

/// Actions that can be triggered by key presses
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // App-level
    Quit,
    ShowHelp,
    ToggleHud,

    // Preset picker navigation
    PickerShow,
    PickerHide,
    PickerMoveUp,
    PickerMoveDown,
    PickerSelect,

    // Controls
    NextPreset,
    ToggleRings,
    TogglePitchColor,
    SelectNextControl,
    SelectPrevControl,
    IncreaseControl,
    DecreaseControl,
    ApplyBloomDefault,

    // Input
    StopInput,
    SelectDevice(usize),
}

/// Digit keys as a number
fn key_to_digit(key: Key) -> Option<usize> {
    let d = match key {
        Key::Key0 => 0,
        Key::Key1 => 1,
        Key::Key2 => 2,
        Key::Key3 => 3,
        Key::Key4 => 4,
        Key::Key5 => 5,
        Key::Key6 => 6,
        Key::Key7 => 7,
        Key::Key8 => 8,
        Key::Key9 => 9,
        _ => return None,
    };
    Some(d)
}

/// Parse a key into an action based on current mode
pub fn parse_key(key: Key, shift: bool, picker_active: bool) -> Option<Action> {
    // Global quit key
    if key == Key::Q {
        return Some(Action::Quit);
    }

    if key == Key::H {
        return Some(Action::ShowHelp);
    }

    // Preset picker mode bindings
    if picker_active {
        return match key {
            Key::Escape => Some(Action::PickerHide),
            Key::Up => Some(Action::PickerMoveUp),
            Key::Down => Some(Action::PickerMoveDown),
            Key::Return => Some(Action::PickerSelect),
            _ => None,
        };
    }

    if let Some(digit) = key_to_digit(key) {
        let offset = if shift { 10 } else { 0 };
        return Some(Action::SelectDevice(digit + offset));
    }

    // Normal mode bindings
    match key {
        Key::Space => Some(Action::NextPreset),
        Key::Up | Key::Down => Some(Action::PickerShow),
        Key::R => Some(Action::ToggleRings),
        Key::C => Some(Action::TogglePitchColor),
        Key::B => Some(Action::ApplyBloomDefault),
        Key::Tab => Some(Action::ToggleHud),
        Key::RBracket => Some(Action::SelectNextControl),
        Key::LBracket => Some(Action::SelectPrevControl),
        Key::Equals | Key::Plus | Key::Right => Some(Action::IncreaseControl),
        Key::Minus | Key::Left => Some(Action::DecreaseControl),
        Key::Escape | Key::X => Some(Action::StopInput),
        _ => None,
    }
}
