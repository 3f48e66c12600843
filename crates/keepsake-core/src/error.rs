#![forbid(unsafe_code)]

//! Error taxonomy shared by every preview crate.
//!
//! Nothing here is fatal: each variant describes a condition the renderer
//! degrades around (placeholder, stale state, deferred render) and that the
//! host may surface to the user.
//!
//! | Variant | Cause | Renderer behavior |
//! |---------|-------|-------------------|
//! | `UnknownLayout` | Layout id not in the catalog | Active layout unchanged |
//! | `DecodeFailed` | Image bytes could not be decoded | Previous photo state kept |
//! | `MeasurementUnavailable` | Text backend not ready | Render stays pending |
//! | `RegionNotFound` | Region id not in the active layout | Call is a no-op |
//! | `InvalidTracks` | Override track counts do not match the layout | Override rejected |
//! | `InvalidSnapshot` | Persisted state could not be parsed | Nothing restored |
//! | `Export` | Proof image could not be encoded | No output written |
//! | `FontLoad` | Font bytes could not be parsed | Face left out; text defers if none load |

use std::fmt;

/// Errors reported by the preview renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewError {
    /// The layout id is not in the catalog.
    UnknownLayout { id: String },
    /// Image bytes for a region could not be decoded.
    DecodeFailed { region: String, reason: String },
    /// The text measurement backend is not ready yet (e.g. fonts loading).
    MeasurementUnavailable,
    /// The region id is not part of the active layout.
    RegionNotFound { region: String },
    /// A track ratio override does not fit the layout's grid.
    InvalidTracks {
        layout: String,
        expected_columns: usize,
        expected_rows: usize,
        columns: usize,
        rows: usize,
    },
    /// A persisted snapshot or template could not be parsed.
    InvalidSnapshot(String),
    /// A proof image could not be encoded or written.
    Export(String),
    /// A font face could not be parsed.
    FontLoad { face: String, reason: String },
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLayout { id } => write!(f, "unknown layout id {id:?}"),
            Self::DecodeFailed { region, reason } => {
                write!(f, "image for region {region:?} could not be decoded: {reason}")
            }
            Self::MeasurementUnavailable => write!(f, "text measurement is not available yet"),
            Self::RegionNotFound { region } => {
                write!(f, "region {region:?} is not part of the active layout")
            }
            Self::InvalidTracks {
                layout,
                expected_columns,
                expected_rows,
                columns,
                rows,
            } => write!(
                f,
                "layout {layout:?} expects {expected_columns}x{expected_rows} tracks, got {columns}x{rows}"
            ),
            Self::InvalidSnapshot(msg) => write!(f, "invalid snapshot: {msg}"),
            Self::Export(msg) => write!(f, "proof export failed: {msg}"),
            Self::FontLoad { face, reason } => write!(f, "font face {face} could not be loaded: {reason}"),
        }
    }
}

impl std::error::Error for PreviewError {}

/// Result type for preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_subject() {
        let err = PreviewError::UnknownLayout {
            id: "diagonal".into(),
        };
        assert_eq!(err.to_string(), "unknown layout id \"diagonal\"");

        let err = PreviewError::InvalidTracks {
            layout: "stacked".into(),
            expected_columns: 1,
            expected_rows: 2,
            columns: 2,
            rows: 2,
        };
        assert!(err.to_string().contains("1x2"));
    }
}
