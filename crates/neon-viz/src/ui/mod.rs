pub mod bindings;
pub mod control_panel;
pub mod help_overlay;
pub mod preset_picker;
