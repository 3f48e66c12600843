#![forbid(unsafe_code)]

//! Runtime for the Keepsake preview: one [`PreviewRenderer`] per preview,
//! plus the scheduling, configuration, persistence, and gesture pieces it
//! is built from.

pub mod gesture;
pub mod preview;
pub mod scheduler;
pub mod snapshot;
pub mod template;

pub use gesture::{CropEvent, CropGesture};
pub use preview::{FrameOutcome, FrameReport, PreviewRenderer};
pub use scheduler::{FrameScheduler, SchedulerStats};
pub use snapshot::{PreviewSnapshot, SNAPSHOT_VERSION};
pub use template::{MemoryField, RenderConfig, StyleVariant, TemplateDescriptor};
