//! Built-in visual presets.

use serde::{Deserialize, Serialize};

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Channels as floats in [0, 1].
    pub fn to_f32(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetColors {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
}

/// How the renderer lays out the mapped parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetStyle {
    Bars,
    Ribbons,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub colors: PresetColors,
    /// Hue offset in degrees added to every bar hue
    pub base_hue: f32,
    /// Bloom value the UI may restore when this preset is picked
    pub bloom_default: f32,
    pub style: PresetStyle,
}

pub const NEON_SPECTRUM: Preset = Preset {
    name: "Neon Spectrum",
    description: "Classic frequency bars with bloom glow",
    colors: PresetColors {
        primary: Rgb::from_hex(0x8b5cf6),
        secondary: Rgb::from_hex(0xd946ef),
        accent: Rgb::from_hex(0xa78bfa),
    },
    base_hue: 270.0,
    bloom_default: 0.75,
    style: PresetStyle::Bars,
};

pub const AURORA_RIBBONS: Preset = Preset {
    name: "Aurora Ribbons",
    description: "Flowing ribbons controlled by spectral centroid",
    colors: PresetColors {
        primary: Rgb::from_hex(0x06b6d4),
        secondary: Rgb::from_hex(0x8b5cf6),
        accent: Rgb::from_hex(0xec4899),
    },
    base_hue: 180.0,
    bloom_default: 0.8,
    style: PresetStyle::Ribbons,
};

pub const CYBER_ROSETTE: Preset = Preset {
    name: "Cyber Rosette",
    description: "Radial visualization with onset-triggered rings",
    colors: PresetColors {
        primary: Rgb::from_hex(0xf59e0b),
        secondary: Rgb::from_hex(0xef4444),
        accent: Rgb::from_hex(0x8b5cf6),
    },
    base_hue: 30.0,
    bloom_default: 0.7,
    style: PresetStyle::Radial,
};

pub const PRESETS: [Preset; 3] = [NEON_SPECTRUM, AURORA_RIBBONS, CYBER_ROSETTE];

impl Preset {
    /// Look up a preset by name (case-insensitive). Unknown names fall back
    /// to Neon Spectrum.
    pub fn by_name(name: &str) -> Preset {
        Self::find(name).unwrap_or(NEON_SPECTRUM)
    }

    pub fn find(name: &str) -> Option<Preset> {
        let name = name.trim();
        PRESETS
            .iter()
            .copied()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|p| p.name)
    }

    pub fn index(&self) -> usize {
        PRESETS
            .iter()
            .position(|p| p.name == self.name)
            .unwrap_or(0)
    }

    /// The preset after this one, wrapping around.
    pub fn next(&self) -> Preset {
        PRESETS[(self.index() + 1) % PRESETS.len()]
    }
}

impl Default for Preset {
    fn default() -> Self {
        NEON_SPECTRUM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Preset::by_name("Aurora Ribbons").base_hue, 180.0);
        assert_eq!(Preset::by_name("cyber rosette").style, PresetStyle::Radial);
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(Preset::by_name("Vaporwave").name, "Neon Spectrum");
        assert!(Preset::find("Vaporwave").is_none());
    }

    #[test]
    fn test_hex_colors() {
        let c = NEON_SPECTRUM.colors.primary;
        assert_eq!((c.r, c.g, c.b), (0x8b, 0x5c, 0xf6));
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(CYBER_ROSETTE.next().name, NEON_SPECTRUM.name);
        assert_eq!(NEON_SPECTRUM.next().name, AURORA_RIBBONS.name);
        assert_eq!(Preset::names().count(), 3);
    }
}
