#![forbid(unsafe_code)]

//! Layout primitives for the multi-panel preview.
//!
//! - [`catalog`] - static table of named grid layouts
//! - [`tracks`] - fractional ("fr") track solving and ratio overrides
//! - [`grid`] - [`GridController`]: active layout, live regions, pixel boxes
//! - [`divider`] - drag lifecycle turning pointer deltas into track weights
//!
//! Everything here is pure geometry. Surfaces are created, resized, and
//! disposed by whoever consumes the [`RegionChange`]s the controller reports.

pub mod catalog;
pub mod divider;
pub mod grid;
pub mod tracks;

pub use catalog::{DEFAULT_LAYOUT_ID, LayoutCatalog, LayoutDefinition};
pub use divider::{
    DividerAxis, DividerDrag, DividerEffect, DividerEvent, DividerHandle, DividerNoopReason,
    MIN_TRACK_WEIGHT,
    redistribute,
};
pub use grid::{GridController, RegionChange, RegionMeasure};
pub use tracks::{TrackRatios, solve_tracks};
