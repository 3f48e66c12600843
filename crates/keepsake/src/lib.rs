#![forbid(unsafe_code)]

//! Keepsake public facade crate.
//!
//! Re-exports the types a host needs to drive a memorial wall-art preview
//! (templates, the per-preview renderer, snapshots, and the geometry they
//! speak in) and offers a prelude for day-to-day usage.
//!
//! ```no_run
//! use keepsake::prelude::*;
//!
//! # fn demo(template_json: &str) -> keepsake::PreviewResult<()> {
//! let template = TemplateDescriptor::from_json(template_json)?;
//! let mut preview = PreviewRenderer::init(template, Viewport::new(800.0, 2.0))?;
//! preview.set_field("petName", "Luna");
//! preview.on_frame()?;
//! let png = preview.export_png()?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```

// --- Core re-exports -------------------------------------------------------

pub use keepsake_core::{
    AspectRatio, FrameSize, PanelMode, PixelSize, PreviewError, PreviewResult, Rect, RegionId,
    RegionRole, Viewport,
};

// --- Layout re-exports -----------------------------------------------------

pub use keepsake_layout::{
    DEFAULT_LAYOUT_ID, DividerAxis, DividerEffect, DividerEvent, DividerHandle, LayoutCatalog,
    LayoutDefinition, TrackRatios,
};

// --- Text re-exports -------------------------------------------------------

pub use keepsake_text::{ApproxMetrics, FontFamily, FontSpec, FontStyle, TextMeasure};

// --- Render re-exports -----------------------------------------------------

pub use keepsake_render::{
    FieldValues, FocalPoint, FontGlyphs, GlyphBackend, PackedRgba, PhotoCrop, StylePalette,
    Surface, TextRun,
};

// --- Runtime re-exports ----------------------------------------------------

pub use keepsake_runtime::{
    CropEvent, FrameOutcome, FrameReport, PreviewRenderer, PreviewSnapshot, RenderConfig,
    TemplateDescriptor,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CropEvent, DividerEvent, FieldValues, FocalPoint, FrameOutcome, FrameSize, PanelMode,
        PreviewError, PreviewRenderer, PreviewResult, PreviewSnapshot, RegionId, RenderConfig,
        TemplateDescriptor, Viewport,
    };

    pub use crate::{core, layout, render, runtime, text};
}

pub use keepsake_core as core;
pub use keepsake_layout as layout;
pub use keepsake_render as render;
pub use keepsake_runtime as runtime;
pub use keepsake_text as text;
