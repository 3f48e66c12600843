#![forbid(unsafe_code)]

//! Divider drag lifecycle.
//!
//! A divider sits between two adjacent tracks (a column pair or a row pair).
//! Dragging it moves weight from one track to the other; nothing else about
//! the layout changes.
//!
//! ```text
//! Idle -> Dragging -> Idle
//!   ^        \-----> Idle (cancel restores the snapshot)
//!   \-- double activation clears the layout's override
//! ```
//!
//! # Invariants
//!
//! 1. Deltas are measured from the gesture origin against the snapshot taken
//!    at start, so repeated moves never accumulate rounding drift.
//! 2. Both adjacent weights stay at or above the floor after every move.
//! 3. The pair's sum is conserved whenever it is at least twice the floor.

use keepsake_core::geometry::Rect;
use serde::{Deserialize, Serialize};

use crate::tracks::TrackRatios;

/// Smallest weight a dragged track may shrink to.
pub const MIN_TRACK_WEIGHT: f64 = 0.3;

/// Which set of tracks a divider separates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerAxis {
    /// Between column `index` and `index + 1`; dragged horizontally.
    Column,
    /// Between row `index` and `index + 1`; dragged vertically.
    Row,
}

/// One draggable boundary of the active layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividerHandle {
    pub axis: DividerAxis,
    /// Index of the first of the two adjacent tracks.
    pub index: usize,
    /// Boundary position along the axis, in layout pixels.
    pub position: f64,
}

/// Pointer input addressed to the divider machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DividerEvent {
    /// Mouse-down or touch-start on a handle.
    Start {
        axis: DividerAxis,
        index: usize,
        x: f64,
        y: f64,
    },
    /// Pointer moved while dragging.
    Move { x: f64, y: f64 },
    /// Mouse-up or touch-end.
    End { x: f64, y: f64 },
    /// Gesture aborted (focus loss, escape).
    Cancel,
    /// Double-click or double-tap on a handle.
    DoubleActivate,
}

/// Why an event changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DividerNoopReason {
    IdleWithoutActiveDrag,
    DragAlreadyInProgress,
    TrackOutOfRange,
    EmptySurface,
}

/// Outcome of one event.
#[derive(Debug, Clone, PartialEq)]
pub enum DividerEffect {
    Started { axis: DividerAxis, index: usize },
    /// Live ratios to apply for this move.
    Updated { ratios: TrackRatios },
    /// Final ratios to persist as the layout's override.
    Committed { ratios: TrackRatios },
    /// Restore the ratios captured at start.
    Canceled { ratios: TrackRatios },
    /// Clear the layout's override.
    Reset,
    Noop { reason: DividerNoopReason },
}

#[derive(Debug, Clone, PartialEq)]
enum DividerState {
    Idle,
    Dragging {
        axis: DividerAxis,
        index: usize,
        origin: f64,
        snapshot: TrackRatios,
    },
}

/// Drag machine for one preview surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DividerDrag {
    state: DividerState,
    min_weight: f64,
}

impl Default for DividerDrag {
    fn default() -> Self {
        Self::new(MIN_TRACK_WEIGHT)
    }
}

impl DividerDrag {
    /// Create a machine with an explicit weight floor.
    #[must_use]
    pub fn new(min_weight: f64) -> Self {
        Self {
            state: DividerState::Idle,
            min_weight: if min_weight.is_finite() {
                min_weight.max(0.0)
            } else {
                MIN_TRACK_WEIGHT
            },
        }
    }

    /// Configured weight floor.
    #[must_use]
    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DividerState::Dragging { .. })
    }

    /// Feed one event.
    ///
    /// `tracks` are the ratios currently in effect (override included) and
    /// `surface` is the preview surface in layout pixels.
    pub fn apply_event(
        &mut self,
        event: &DividerEvent,
        tracks: &TrackRatios,
        surface: Rect,
    ) -> DividerEffect {
        match (&self.state, *event) {
            (DividerState::Idle, DividerEvent::Start { axis, index, x, y }) => {
                let weights = axis_weights(tracks, axis);
                if index + 1 >= weights.len() {
                    return DividerEffect::Noop {
                        reason: DividerNoopReason::TrackOutOfRange,
                    };
                }
                self.state = DividerState::Dragging {
                    axis,
                    index,
                    origin: along(axis, x, y),
                    snapshot: tracks.clone(),
                };
                tracing::trace!(?axis, index, "divider drag started");
                DividerEffect::Started { axis, index }
            }
            (DividerState::Idle, DividerEvent::DoubleActivate) => DividerEffect::Reset,
            (DividerState::Idle, _) => DividerEffect::Noop {
                reason: DividerNoopReason::IdleWithoutActiveDrag,
            },
            (DividerState::Dragging { .. }, DividerEvent::Start { .. }) => DividerEffect::Noop {
                reason: DividerNoopReason::DragAlreadyInProgress,
            },
            (
                DividerState::Dragging {
                    axis,
                    index,
                    origin,
                    snapshot,
                },
                DividerEvent::Move { x, y },
            ) => match self.ratios_at(*axis, *index, *origin, snapshot, x, y, surface) {
                Some(ratios) => DividerEffect::Updated { ratios },
                None => DividerEffect::Noop {
                    reason: DividerNoopReason::EmptySurface,
                },
            },
            (
                DividerState::Dragging {
                    axis,
                    index,
                    origin,
                    snapshot,
                },
                DividerEvent::End { x, y },
            ) => {
                let ratios = self
                    .ratios_at(*axis, *index, *origin, snapshot, x, y, surface)
                    .unwrap_or_else(|| snapshot.clone());
                self.state = DividerState::Idle;
                tracing::debug!(?ratios, "divider drag committed");
                DividerEffect::Committed { ratios }
            }
            (DividerState::Dragging { snapshot, .. }, DividerEvent::Cancel) => {
                let ratios = snapshot.clone();
                self.state = DividerState::Idle;
                DividerEffect::Canceled { ratios }
            }
            (DividerState::Dragging { .. }, DividerEvent::DoubleActivate) => {
                self.state = DividerState::Idle;
                DividerEffect::Reset
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn ratios_at(
        &self,
        axis: DividerAxis,
        index: usize,
        origin: f64,
        snapshot: &TrackRatios,
        x: f64,
        y: f64,
        surface: Rect,
    ) -> Option<TrackRatios> {
        let extent = match axis {
            DividerAxis::Column => surface.width,
            DividerAxis::Row => surface.height,
        };
        if !(extent > 0.0) {
            return None;
        }
        let fraction = (along(axis, x, y) - origin) / extent;
        let mut ratios = snapshot.clone();
        let weights = match axis {
            DividerAxis::Column => &mut ratios.columns,
            DividerAxis::Row => &mut ratios.rows,
        };
        let (a, b) = (*weights.get(index)?, *weights.get(index + 1)?);
        let (new_a, new_b) = redistribute(a, b, fraction * (a + b), self.min_weight);
        weights[index] = new_a;
        weights[index + 1] = new_b;
        Some(ratios)
    }
}

fn axis_weights(tracks: &TrackRatios, axis: DividerAxis) -> &[f64] {
    match axis {
        DividerAxis::Column => &tracks.columns,
        DividerAxis::Row => &tracks.rows,
    }
}

fn along(axis: DividerAxis, x: f64, y: f64) -> f64 {
    match axis {
        DividerAxis::Column => x,
        DividerAxis::Row => y,
    }
}

/// Move `delta` weight from track `b` to track `a`, keeping both at or above
/// `floor`.
///
/// Any deficit below the floor is taken from the other track, so the pair's
/// sum is unchanged as long as `a + b >= 2 * floor`.
#[must_use]
pub fn redistribute(a: f64, b: f64, delta: f64, floor: f64) -> (f64, f64) {
    let mut new_a = a + delta;
    let mut new_b = b - delta;
    if new_a < floor {
        new_b -= floor - new_a;
        new_a = floor;
    }
    if new_b < floor {
        new_a -= floor - new_b;
        new_b = floor;
    }
    (new_a.max(floor), new_b.max(floor))
}
