#![forbid(unsafe_code)]

//! Core: geometry, region identity, and the shared error taxonomy.

pub mod error;
pub mod geometry;
pub mod logging;
pub mod region;

pub use error::{PreviewError, PreviewResult};
pub use geometry::{AspectRatio, FrameSize, PixelSize, Rect, Viewport};
pub use region::{PanelMode, RegionId, RegionRole};
