#![forbid(unsafe_code)]

//! Grid controller: active layout, live regions, and pixel boxes.
//!
//! The controller never touches a raster surface. It reports
//! [`RegionChange`]s (create, dispose, role switch) and [`RegionMeasure`]s
//! (device-pixel size per region) that a surface adapter applies.
//!
//! # Region lifecycle
//!
//! ```text
//! Absent -> Live -> (Resized)* -> Absent
//! ```
//!
//! A region becomes `Live` when its area name first appears in the active
//! layout and returns to `Absent` when a layout switch drops the name. A
//! region that comes back later is a fresh region, not a reused one.
//!
//! # Invariants
//!
//! 1. The set of live regions equals the active layout's area names.
//! 2. Applying the active layout again changes nothing.
//! 3. Device sizes are rounded from layout pixels, never truncated.
//! 4. A region whose layout box has no area keeps its last device size and
//!    is reported without one, so it is neither resized nor drawn.

use std::collections::BTreeMap;

use keepsake_core::geometry::{AspectRatio, FrameSize, PixelSize, Rect, Viewport};
use keepsake_core::region::{PanelMode, RegionId, RegionRole};
use keepsake_core::{PreviewError, PreviewResult};

use crate::catalog::{LayoutCatalog, LayoutDefinition};
use crate::divider::{DividerAxis, DividerHandle};
use crate::tracks::{TrackRatios, solve_tracks};

/// A lifecycle event for one region's surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionChange {
    /// The region became live; allocate an empty surface.
    Created { id: RegionId, role: RegionRole },
    /// The region left the layout; dispose its surface.
    Destroyed { id: RegionId },
    /// The region stays but draws different content.
    RoleChanged { id: RegionId, role: RegionRole },
}

/// Current geometry of one live region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMeasure {
    pub id: RegionId,
    pub role: RegionRole,
    /// Box in layout pixels relative to the preview surface.
    pub layout_box: Rect,
    /// Raster size, or `None` while the box has no area.
    pub device_size: Option<PixelSize>,
    /// Raster offset of the region inside the whole preview.
    pub device_origin: (u32, u32),
    /// Whether this measurement changed the region's raster size.
    pub resized: bool,
}

#[derive(Debug, Clone, Copy)]
struct LiveRegion {
    role: RegionRole,
    device_size: Option<PixelSize>,
}

/// Owns the active layout and the geometry of every live region.
#[derive(Debug, Clone)]
pub struct GridController {
    catalog: LayoutCatalog,
    active: &'static LayoutDefinition,
    overrides: BTreeMap<String, TrackRatios>,
    regions: BTreeMap<RegionId, LiveRegion>,
    panel_mode: PanelMode,
    frame: Option<FrameSize>,
    viewport: Viewport,
}

impl GridController {
    /// Create a controller with `layout_id` applied.
    ///
    /// Returns the creation events for the initial regions.
    pub fn new(
        catalog: LayoutCatalog,
        layout_id: &str,
        viewport: Viewport,
    ) -> PreviewResult<(Self, Vec<RegionChange>)> {
        let active = catalog.get(layout_id)?;
        let mut grid = Self {
            catalog,
            active,
            overrides: BTreeMap::new(),
            regions: BTreeMap::new(),
            panel_mode: PanelMode::default(),
            frame: None,
            viewport,
        };
        let changes = grid.reconcile();
        Ok((grid, changes))
    }

    /// The catalog this controller resolves ids against.
    #[must_use]
    pub fn catalog(&self) -> LayoutCatalog {
        self.catalog
    }

    /// Id of the active layout.
    #[must_use]
    pub fn active_layout_id(&self) -> &'static str {
        self.active.id
    }

    /// The active layout definition.
    #[must_use]
    pub fn active_layout(&self) -> &'static LayoutDefinition {
        self.active
    }

    /// Switch to `layout_id` and reconcile live regions.
    ///
    /// Unknown ids leave the controller untouched. Re-applying the active id
    /// still reconciles, which is a no-op when nothing else changed.
    pub fn apply_layout(&mut self, layout_id: &str) -> PreviewResult<Vec<RegionChange>> {
        let next = self.catalog.get(layout_id)?;
        if next.id != self.active.id {
            tracing::debug!(from = self.active.id, to = next.id, "layout applied");
        }
        self.active = next;
        Ok(self.reconcile())
    }

    /// Choose what the optional third panel draws.
    pub fn set_panel_mode(&mut self, mode: PanelMode) -> Vec<RegionChange> {
        self.panel_mode = mode;
        self.reconcile()
    }

    /// Current third-panel mode.
    #[must_use]
    pub fn panel_mode(&self) -> PanelMode {
        self.panel_mode
    }

    fn reconcile(&mut self) -> Vec<RegionChange> {
        let required = self.active.area_names();
        let mut changes = Vec::new();

        let stale: Vec<RegionId> = self
            .regions
            .keys()
            .filter(|id| !required.iter().any(|name| *name == id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.regions.remove(&id);
            tracing::debug!(region = %id, "region destroyed");
            changes.push(RegionChange::Destroyed { id });
        }

        for name in required {
            let Some(role) = RegionRole::for_area(name, self.panel_mode) else {
                tracing::warn!(area = name, "area has no role; skipped");
                continue;
            };
            match self.regions.get_mut(name) {
                Some(region) if region.role != role => {
                    region.role = role;
                    changes.push(RegionChange::RoleChanged {
                        id: RegionId::new(name),
                        role,
                    });
                }
                Some(_) => {}
                None => {
                    let id = RegionId::new(name);
                    self.regions.insert(
                        id.clone(),
                        LiveRegion {
                            role,
                            device_size: None,
                        },
                    );
                    tracing::debug!(region = %id, ?role, "region created");
                    changes.push(RegionChange::Created { id, role });
                }
            }
        }
        changes
    }

    /// Ids and roles of all live regions, in id order.
    pub fn live_regions(&self) -> impl Iterator<Item = (&RegionId, RegionRole)> {
        self.regions.iter().map(|(id, region)| (id, region.role))
    }

    /// Role of a live region.
    #[must_use]
    pub fn role_of(&self, id: &str) -> Option<RegionRole> {
        self.regions.get(id).map(|region| region.role)
    }

    /// Whether `id` is live in the active layout.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    /// Track weights for `layout_id`: the override if present, else the
    /// catalog's defaults.
    pub fn resolve_tracks(&self, layout_id: &str) -> PreviewResult<TrackRatios> {
        let layout = self.catalog.get(layout_id)?;
        Ok(self
            .overrides
            .get(layout.id)
            .cloned()
            .unwrap_or_else(|| layout.default_tracks()))
    }

    /// Track weights currently in effect for the active layout.
    #[must_use]
    pub fn active_tracks(&self) -> TrackRatios {
        self.overrides
            .get(self.active.id)
            .cloned()
            .unwrap_or_else(|| self.active.default_tracks())
    }

    /// Store a user override for `layout_id`.
    ///
    /// Returns `true` when the override affects the active layout.
    pub fn set_custom_ratios(&mut self, layout_id: &str, ratios: TrackRatios) -> PreviewResult<bool> {
        let layout = self.catalog.get(layout_id)?;
        if ratios.columns.len() != layout.columns.len()
            || ratios.rows.len() != layout.rows.len()
            || !ratios.is_valid()
        {
            return Err(PreviewError::InvalidTracks {
                layout: layout.id.to_owned(),
                expected_columns: layout.columns.len(),
                expected_rows: layout.rows.len(),
                columns: ratios.columns.len(),
                rows: ratios.rows.len(),
            });
        }
        self.overrides.insert(layout.id.to_owned(), ratios);
        Ok(layout.id == self.active.id)
    }

    /// Drop the override for `layout_id`, reverting to catalog tracks.
    ///
    /// Returns `true` if an override was removed.
    pub fn reset_custom_ratios(&mut self, layout_id: &str) -> bool {
        self.overrides.remove(layout_id).is_some()
    }

    /// Copy of all overrides, keyed by layout id.
    #[must_use]
    pub fn custom_ratios(&self) -> BTreeMap<String, TrackRatios> {
        self.overrides.clone()
    }

    /// Replace the surface aspect with a physical print size, or restore the
    /// layout's own aspect with `None`.
    pub fn recompute_frame(&mut self, frame: Option<FrameSize>) {
        self.frame = frame;
    }

    /// The print size currently overriding the aspect ratio.
    #[must_use]
    pub fn frame(&self) -> Option<FrameSize> {
        self.frame
    }

    /// Aspect ratio of the whole preview surface.
    ///
    /// A print size is reordered to the orientation of the layout's default
    /// aspect, so a landscape layout stays landscape whichever way round the
    /// product quotes its dimensions.
    #[must_use]
    pub fn surface_aspect(&self) -> AspectRatio {
        match self.frame {
            Some(frame) => frame.aspect().oriented_like(&self.active.aspect),
            None => self.active.aspect,
        }
    }

    /// Update the host container metrics.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Current host container metrics.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The preview surface in layout pixels.
    #[must_use]
    pub fn surface_rect(&self) -> Rect {
        let aspect = self.surface_aspect();
        let width = self.viewport.width;
        Rect::from_size(width, width * aspect.height / aspect.width)
    }

    /// Layout-pixel box of a live region.
    #[must_use]
    pub fn region_box(&self, id: &str) -> Option<Rect> {
        if !self.regions.contains_key(id) {
            return None;
        }
        let span = self.active.area_span(id)?;
        let surface = self.surface_rect();
        let tracks = self.active_tracks();
        let columns = solve_tracks(&tracks.columns, surface.x, surface.width);
        let rows = solve_tracks(&tracks.rows, surface.y, surface.height);
        let first_col = columns.get(span.col_start)?;
        let last_col = columns.get(span.col_end - 1)?;
        let first_row = rows.get(span.row_start)?;
        let last_row = rows.get(span.row_end - 1)?;
        Some(Rect::new(
            first_col.0,
            first_row.0,
            last_col.0 + last_col.1 - first_col.0,
            last_row.0 + last_row.1 - first_row.0,
        ))
    }

    /// Recompute every live region's device-pixel size.
    ///
    /// Regions whose box currently has no area are reported with
    /// `device_size: None` and keep their previous raster size.
    pub fn measure_regions(&mut self) -> Vec<RegionMeasure> {
        let scale = self.viewport.device_scale;
        let boxes: Vec<(RegionId, Rect)> = self
            .regions
            .keys()
            .map(|id| (id.clone(), self.region_box(id.as_str()).unwrap_or_default()))
            .collect();

        let mut measures = Vec::with_capacity(boxes.len());
        for (id, layout_box) in boxes {
            let Some(region) = self.regions.get_mut(&id) else {
                continue;
            };
            let device_size = layout_box.to_device(scale);
            let resized = match device_size {
                Some(size) if region.device_size != Some(size) => {
                    region.device_size = Some(size);
                    true
                }
                _ => false,
            };
            measures.push(RegionMeasure {
                role: region.role,
                device_origin: layout_box.device_origin(scale),
                id,
                layout_box,
                device_size,
                resized,
            });
        }
        measures
    }

    /// Device-pixel size of the whole preview surface.
    #[must_use]
    pub fn surface_device_size(&self) -> Option<PixelSize> {
        self.surface_rect().to_device(self.viewport.device_scale)
    }

    /// Drag handles between adjacent tracks of the active layout, positioned
    /// in layout pixels.
    #[must_use]
    pub fn divider_handles(&self) -> Vec<DividerHandle> {
        let surface = self.surface_rect();
        let tracks = self.active_tracks();
        let mut handles = Vec::new();
        let columns = solve_tracks(&tracks.columns, surface.x, surface.width);
        for (index, (start, size)) in columns.iter().enumerate().take(columns.len().saturating_sub(1)) {
            handles.push(DividerHandle {
                axis: DividerAxis::Column,
                index,
                position: start + size,
            });
        }
        let rows = solve_tracks(&tracks.rows, surface.y, surface.height);
        for (index, (start, size)) in rows.iter().enumerate().take(rows.len().saturating_sub(1)) {
            handles.push(DividerHandle {
                axis: DividerAxis::Row,
                index,
                position: start + size,
            });
        }
        handles
    }
}
