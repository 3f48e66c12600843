#![forbid(unsafe_code)]

//! Proof composition: every region surface flattened into one image.

use std::f64::consts::PI;

use keepsake_core::geometry::PixelSize;
use keepsake_text::{FontFamily, FontSpec, VerticalAnchor};

use crate::color::PackedRgba;
use crate::glyph::{GlyphBackend, TextRun};
use crate::surface::Surface;

/// Default watermark text.
pub const PROOF_WATERMARK: &str = "PROOF";

const WATERMARK_COLOR: PackedRgba = PackedRgba::rgba(255, 255, 255, 64);
const WATERMARK_SIZE: f64 = 0.12;
const WATERMARK_ANGLE: f64 = -PI / 6.0;

/// A region surface and its device-pixel offset in the composite.
#[derive(Debug, Clone, Copy)]
pub struct ProofLayer<'a> {
    pub surface: &'a Surface,
    pub origin: (u32, u32),
}

/// Builds a flattened proof.
#[derive(Debug, Clone)]
pub struct ProofComposer {
    size: PixelSize,
    background: PackedRgba,
    watermark: Option<String>,
}

impl ProofComposer {
    /// Composer for a `size` canvas filled with `background` and carrying
    /// the default watermark.
    #[must_use]
    pub fn new(size: PixelSize, background: PackedRgba) -> Self {
        Self {
            size,
            background,
            watermark: Some(PROOF_WATERMARK.to_owned()),
        }
    }

    /// Replace the watermark; `None` leaves the proof clean.
    #[must_use]
    pub fn watermark(mut self, text: Option<String>) -> Self {
        self.watermark = text.filter(|text| !text.is_empty());
        self
    }

    /// Flatten `layers` in order, then stamp the watermark across the centre.
    pub fn compose<'a, G, I>(&self, glyphs: &G, layers: I) -> Surface
    where
        G: GlyphBackend + ?Sized,
        I: IntoIterator<Item = ProofLayer<'a>>,
    {
        let mut canvas = Surface::new(self.size);
        canvas.fill(self.background);
        let mut count = 0_usize;
        for layer in layers {
            canvas.blit(layer.surface, layer.origin.0, layer.origin.1);
            count += 1;
        }

        if let Some(text) = &self.watermark {
            let width = f64::from(self.size.width);
            let height = f64::from(self.size.height);
            let font = FontSpec::new(FontFamily::Sans, (width.min(height) * WATERMARK_SIZE).round()).weight(700);
            let run = TextRun::new(text, font, width / 2.0, height / 2.0, WATERMARK_COLOR)
                .anchor(VerticalAnchor::Middle)
                .rotation(WATERMARK_ANGLE);
            glyphs.draw_text(&mut canvas, &run);
        }
        tracing::debug!(
            width = self.size.width,
            height = self.size.height,
            layers = count,
            "proof composed"
        );
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::FontGlyphs;

    #[test]
    fn layers_land_at_their_origins() {
        let mut left = Surface::new(PixelSize::new(10, 10));
        left.fill(PackedRgba::rgb(200, 0, 0));
        let mut right = Surface::new(PixelSize::new(10, 10));
        right.fill(PackedRgba::rgb(0, 0, 200));

        let proof = ProofComposer::new(PixelSize::new(20, 10), PackedRgba::BLACK)
            .watermark(None)
            .compose(
                &FontGlyphs::bundled(),
                [
                    ProofLayer { surface: &left, origin: (0, 0) },
                    ProofLayer { surface: &right, origin: (10, 0) },
                ],
            );
        assert_eq!(proof.pixel(9, 5), Some(PackedRgba::rgb(200, 0, 0)));
        assert_eq!(proof.pixel(10, 5), Some(PackedRgba::rgb(0, 0, 200)));
    }

    #[test]
    fn watermark_lightens_the_centre_only() {
        let glyphs = FontGlyphs::bundled();
        let size = PixelSize::new(400, 300);
        let plain = ProofComposer::new(size, PackedRgba::BLACK)
            .watermark(None)
            .compose(&glyphs, []);
        let stamped = ProofComposer::new(size, PackedRgba::BLACK).compose(&glyphs, []);

        assert_eq!(stamped.pixel(0, 0), plain.pixel(0, 0));
        assert_eq!(stamped.pixel(399, 299), plain.pixel(399, 299));
        let changed: Vec<u8> = (0..400)
            .flat_map(|x| (0..300).map(move |y| (x, y)))
            .filter(|&(x, y)| stamped.pixel(x, y) != plain.pixel(x, y))
            .filter_map(|(x, y)| stamped.pixel(x, y).map(PackedRgba::r))
            .collect();
        assert!(changed.len() > 200);
        // Full-coverage ink lands at 25% white over black; glyph edges land
        // in between.
        let full = changed.iter().copied().max().unwrap();
        assert!((60..=68).contains(&full), "full ink {full}");
        assert!(changed.iter().any(|&r| r < full / 2));
    }

    #[test]
    fn empty_watermark_is_no_watermark() {
        let composer = ProofComposer::new(PixelSize::new(4, 4), PackedRgba::BLACK)
            .watermark(Some(String::new()));
        assert!(composer.watermark.is_none());
    }
}
