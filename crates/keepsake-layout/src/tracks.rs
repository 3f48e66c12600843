#![forbid(unsafe_code)]

//! Fractional track sizing.
//!
//! Tracks are weights in "fr" units: only ratios matter. A track of weight
//! `w` in a set summing to `W` receives `w / W` of the available extent.

use serde::{Deserialize, Serialize};

/// Column and row weights for one layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackRatios {
    pub columns: Vec<f64>,
    pub rows: Vec<f64>,
}

impl TrackRatios {
    /// Create a ratio set.
    #[must_use]
    pub fn new(columns: Vec<f64>, rows: Vec<f64>) -> Self {
        Self { columns, rows }
    }

    /// Whether every weight is finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.columns
            .iter()
            .chain(self.rows.iter())
            .all(|w| w.is_finite() && *w > 0.0)
    }
}

/// Split `extent` starting at `origin` into tracks proportional to `weights`.
///
/// Returns `(start, size)` per track. Invalid weights count as zero; if
/// nothing valid remains the extent is shared equally.
#[must_use]
pub fn solve_tracks(weights: &[f64], origin: f64, extent: f64) -> Vec<(f64, f64)> {
    if weights.is_empty() {
        return Vec::new();
    }
    let sanitized: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let total: f64 = sanitized.iter().sum();
    let extent = extent.max(0.0);

    let mut cursor = origin;
    sanitized
        .iter()
        .map(|w| {
            let size = if total > 0.0 {
                extent * w / total
            } else {
                extent / weights.len() as f64
            };
            let track = (cursor, size);
            cursor += size;
            track
        })
        .collect()
}
