#![forbid(unsafe_code)]

//! Raster side of the Keepsake preview.
//!
//! Surfaces, colors, photo cover-fit, font glyphs, and the painters that
//! turn a region's role plus the current fields into pixels.

pub mod color;
pub mod compose;
pub mod fields;
pub mod glyph;
pub mod palette;
pub mod photo;
pub mod region;
pub mod surface;

pub use color::{ColorParseError, PackedRgba};
pub use compose::{PROOF_WATERMARK, ProofComposer, ProofLayer};
pub use fields::{FieldValues, PANEL_TEXT_FIELD, PlaceholderLabels, TributeMapping};
pub use glyph::{FaceKey, FontGlyphs, GlyphBackend, TextRun};
pub use palette::{StylePalette, StylePaletteBuilder};
pub use photo::{
    DecodeOutcome, DecodeTicket, DecodedPhoto, FocalPoint, ImageTransform, MAX_ZOOM, MIN_ZOOM,
    PhotoCrop, PhotoState, cover_rect,
};
pub use region::{Painted, RegionRenderer, RenderContext};
pub use surface::Surface;
