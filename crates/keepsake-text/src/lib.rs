#![forbid(unsafe_code)]

//! Text for the preview: measurement, wrapping, and typesetting.
//!
//! - [`measure`] - font descriptions and the [`TextMeasure`] backend seam
//! - [`width_cache`] - LRU cache in front of any measurer
//! - [`wrap`] - paragraph-preserving word wrap
//! - [`typeset`] - adaptive tribute layout with the tier and font-scale ladders
//! - [`block`] - single-size centred text for the custom message panel
//!
//! Nothing here paints. Plans carry text, fonts and coordinates; the
//! renderer turns them into pixels.

pub mod block;
pub mod measure;
pub mod typeset;
pub mod width_cache;
pub mod wrap;

pub use block::{TextBlockPlan, layout_text_block};
pub use measure::{ApproxMetrics, FontFamily, FontSpec, FontStyle, TextMeasure};
pub use typeset::{
    FONT_SCALE_FLOOR, PlacedLine, PlacedText, RuleMark, TIERS, TextSlot, Tier, TributeText,
    TypesetEngine, TypesetPlan, VerticalAnchor, type_scale,
};
pub use width_cache::{CacheStats, DEFAULT_CACHE_CAPACITY, MeasureCache};
pub use wrap::wrap_paragraphs;
