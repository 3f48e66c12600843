#![forbid(unsafe_code)]

//! Font descriptions and the measurement backend seam.
//!
//! Layout only needs one question answered: how wide is this string in this
//! font? [`TextMeasure`] is that question. The render crate answers it
//! from rasterised font faces; [`ApproxMetrics`] is the fallback that
//! answers from Unicode cell widths when no face is available.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Typeface family used by the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Display serif for names, dates, and poems.
    Serif,
    /// UI sans for placeholders and labels.
    Sans,
}

/// Upright or italic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// A concrete font at a whole-pixel size.
///
/// Sizes are rounded on construction so that measurement and painting agree
/// on the exact face being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: FontFamily,
    pub style: FontStyle,
    pub weight: u16,
    pub size_px: u32,
}

impl FontSpec {
    /// Regular-weight upright font; `size` is rounded to whole pixels.
    #[must_use]
    pub fn new(family: FontFamily, size: f64) -> Self {
        let size_px = if size.is_finite() && size > 0.0 {
            size.round() as u32
        } else {
            0
        };
        Self {
            family,
            style: FontStyle::Normal,
            weight: 400,
            size_px,
        }
    }

    /// Same font with a different weight.
    #[must_use]
    pub fn weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    /// Same font in italic.
    #[must_use]
    pub fn italic(mut self) -> Self {
        self.style = FontStyle::Italic;
        self
    }

    /// Pixel size as a float.
    #[must_use]
    pub fn size(&self) -> f64 {
        f64::from(self.size_px)
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.style {
            FontStyle::Normal => "",
            FontStyle::Italic => "italic ",
        };
        let family = match self.family {
            FontFamily::Serif => "serif",
            FontFamily::Sans => "sans-serif",
        };
        write!(f, "{style}{} {}px {family}", self.weight, self.size_px)
    }
}

/// Text width oracle.
pub trait TextMeasure {
    /// Whether the backend can answer queries yet (fonts loaded).
    fn ready(&self) -> bool {
        true
    }

    /// Advance width of `text` in layout pixels.
    fn measure(&self, font: &FontSpec, text: &str) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&FontSpec, &str) -> f64,
{
    fn measure(&self, font: &FontSpec, text: &str) -> f64 {
        self(font, text)
    }
}

/// Deterministic metrics from Unicode cell widths.
///
/// Every grapheme advances by its cell width times a per-family fraction of
/// the font size. Italic faces run slightly narrower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxMetrics {
    pub serif_advance: f64,
    pub sans_advance: f64,
    pub italic_factor: f64,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            serif_advance: 0.46,
            sans_advance: 0.52,
            italic_factor: 0.95,
        }
    }
}

impl ApproxMetrics {
    /// Advance of one cell in `font`, in layout pixels.
    #[must_use]
    pub fn cell_advance(&self, font: &FontSpec) -> f64 {
        let base = match font.family {
            FontFamily::Serif => self.serif_advance,
            FontFamily::Sans => self.sans_advance,
        };
        let style = match font.style {
            FontStyle::Normal => 1.0,
            FontStyle::Italic => self.italic_factor,
        };
        font.size() * base * style
    }
}

impl TextMeasure for ApproxMetrics {
    fn measure(&self, font: &FontSpec, text: &str) -> f64 {
        let cells: usize = text.graphemes(true).map(UnicodeWidthStr::width).sum();
        cells as f64 * self.cell_advance(font)
    }
}
