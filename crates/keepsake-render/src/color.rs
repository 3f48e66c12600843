#![forbid(unsafe_code)]

//! Packed straight-alpha colors and hex parsing.

use std::fmt;

use serde::{Deserialize, Serialize};
use tiny_skia::{ColorU8, PremultipliedColorU8};

/// A compact RGBA color laid out as `0xRRGGBBAA`.
///
/// Straight alpha (channels are not pre-multiplied). Compositing is
/// Porter-Duff source-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackedRgba(pub u32);

impl PackedRgba {
    pub const TRANSPARENT: Self = Self(0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    const fn div_round_u8(numer: u64, denom: u64) -> u8 {
        let v = (numer + (denom / 2)) / denom;
        if v > 255 { 255 } else { v as u8 }
    }

    /// Source-over: `self` painted on top of `dst`.
    ///
    /// Computed in exact rationals and rounded once at the end.
    #[inline]
    pub fn over(self, dst: Self) -> Self {
        let s_a = u64::from(self.a());
        if s_a == 255 {
            return self;
        }
        if s_a == 0 {
            return dst;
        }

        let d_a = u64::from(dst.a());
        let inv_s_a = 255 - s_a;
        let numer_a = 255 * s_a + d_a * inv_s_a;
        if numer_a == 0 {
            return Self::TRANSPARENT;
        }
        let out_a = Self::div_round_u8(numer_a, 255);
        let channel = |s: u8, d: u8| {
            Self::div_round_u8(
                u64::from(s) * s_a * 255 + u64::from(d) * d_a * inv_s_a,
                numer_a,
            )
        };
        Self::rgba(
            channel(self.r(), dst.r()),
            channel(self.g(), dst.g()),
            channel(self.b(), dst.b()),
            out_a,
        )
    }

    /// Scale alpha by `opacity` in `[0.0, 1.0]`.
    #[inline]
    #[must_use]
    pub fn with_opacity(self, opacity: f64) -> Self {
        let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        let a = (f64::from(self.a()) * opacity).round().clamp(0.0, 255.0) as u8;
        Self::rgba(self.r(), self.g(), self.b(), a)
    }

    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa` (leading `#` optional).
    pub fn parse_hex(input: &str) -> Result<Self, ColorParseError> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(ColorParseError::new(input));
        }
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..=i], 16).map_err(|_| ColorParseError::new(input))
        };
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError::new(input))
        };
        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ColorParseError::new(input)),
        }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a() == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r(), self.g(), self.b())
        } else {
            format!("#{:08X}", self.0)
        }
    }

    /// Float color for shaders.
    #[must_use]
    pub fn to_color(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r(), self.g(), self.b(), self.a())
    }

    /// Premultiplied pixel as stored in a pixmap.
    #[must_use]
    pub fn premultiply(self) -> PremultipliedColorU8 {
        ColorU8::from_rgba(self.r(), self.g(), self.b(), self.a()).premultiply()
    }

    /// Straight color back from a pixmap pixel. Channels of translucent
    /// pixels may differ by one from what was painted.
    #[must_use]
    pub fn from_premultiplied(pixel: PremultipliedColorU8) -> Self {
        let color = pixel.demultiply();
        Self::rgba(color.red(), color.green(), color.blue(), color.alpha())
    }
}

impl fmt::Display for PackedRgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for PackedRgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<PackedRgba> for String {
    fn from(color: PackedRgba) -> Self {
        color.to_hex()
    }
}

/// A string that is not a hex color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError {
    input: String,
}

impl ColorParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex color: {:?}", self.input)
    }
}

impl std::error::Error for ColorParseError {}
