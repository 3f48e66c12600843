#![forbid(unsafe_code)]

//! Style palettes: the named colors of one visual theme.
//!
//! A palette is swapped as a whole. Hosts load palettes from template JSON,
//! where any missing slot falls back to the house dark theme.

use serde::{Deserialize, Serialize};

use crate::color::PackedRgba;

/// Semantic color slots for photo, tribute, and text panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePalette {
    pub background: PackedRgba,
    pub name: PackedRgba,
    pub dates: PackedRgba,
    pub divider: PackedRgba,
    pub poem: PackedRgba,
    pub nickname: PackedRgba,
    pub family: PackedRgba,
}

impl Default for StylePalette {
    fn default() -> Self {
        Self::CHARCOAL
    }
}

impl StylePalette {
    /// House dark theme: charcoal ground, ivory name, brass accents.
    pub const CHARCOAL: Self = Self {
        background: PackedRgba::rgb(0x1a, 0x1a, 0x1a),
        name: PackedRgba::rgb(0xFA, 0xF8, 0xF5),
        dates: PackedRgba::rgb(0x9B, 0x95, 0x90),
        divider: PackedRgba::rgb(0xC4, 0xA8, 0x82),
        poem: PackedRgba::rgb(0xC4, 0xA8, 0x82),
        nickname: PackedRgba::rgb(0x9B, 0x95, 0x90),
        family: PackedRgba::rgb(0x9B, 0x95, 0x90),
    };

    /// Start a palette from the house theme.
    #[must_use]
    pub fn builder() -> StylePaletteBuilder {
        StylePaletteBuilder {
            palette: Self::CHARCOAL,
        }
    }
}

/// Builder for custom palettes.
#[derive(Debug, Clone, Copy)]
pub struct StylePaletteBuilder {
    palette: StylePalette,
}

impl StylePaletteBuilder {
    #[must_use]
    pub fn background(mut self, color: PackedRgba) -> Self {
        self.palette.background = color;
        self
    }

    #[must_use]
    pub fn name(mut self, color: PackedRgba) -> Self {
        self.palette.name = color;
        self
    }

    #[must_use]
    pub fn dates(mut self, color: PackedRgba) -> Self {
        self.palette.dates = color;
        self
    }

    #[must_use]
    pub fn divider(mut self, color: PackedRgba) -> Self {
        self.palette.divider = color;
        self
    }

    #[must_use]
    pub fn poem(mut self, color: PackedRgba) -> Self {
        self.palette.poem = color;
        self
    }

    #[must_use]
    pub fn nickname(mut self, color: PackedRgba) -> Self {
        self.palette.nickname = color;
        self
    }

    #[must_use]
    pub fn family(mut self, color: PackedRgba) -> Self {
        self.palette.family = color;
        self
    }

    #[must_use]
    pub fn build(self) -> StylePalette {
        self.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_per_slot() {
        let palette: StylePalette =
            serde_json::from_str(r##"{"background":"#F5F0E8","poem":"#3A3530"}"##).unwrap();
        assert_eq!(palette.background, PackedRgba::rgb(0xF5, 0xF0, 0xE8));
        assert_eq!(palette.poem, PackedRgba::rgb(0x3A, 0x35, 0x30));
        assert_eq!(palette.name, StylePalette::CHARCOAL.name);
    }

    #[test]
    fn builder_overrides_only_named_slots() {
        let palette = StylePalette::builder()
            .background(PackedRgba::WHITE)
            .name(PackedRgba::BLACK)
            .build();
        assert_eq!(palette.background, PackedRgba::WHITE);
        assert_eq!(palette.divider, StylePalette::CHARCOAL.divider);
    }
}
