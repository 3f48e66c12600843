#![forbid(unsafe_code)]

//! The preview renderer instance.
//!
//! # Architecture
//!
//! ```text
//!  host mutations ──► PreviewRenderer ──► FrameScheduler (pending flag)
//!                          │                      │
//!                          │               on_frame() ◄── host frame tick
//!                          ▼                      ▼
//!                   GridController ──► measure ──► RegionRenderer ──► Surface per region
//!                   ImageTransform                                     │
//!                   FieldValues                                        ▼
//!                                                             compose_proof() ──► PNG
//! ```
//!
//! Every setter mutates state synchronously and asks for a frame. Renders
//! only happen in [`PreviewRenderer::on_frame`], so a burst of edits costs
//! one repaint.
//!
//! # Invariants
//!
//! 1. There is exactly one surface per live region of the active layout.
//! 2. A frame that cannot measure text is deferred to the next frame,
//!    never dropped.
//! 3. Independent renderer instances share no state.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Unknown layout id | `UnknownLayout`, active layout unchanged |
//! | Photo call on a non-photo region | `RegionNotFound`, nothing stored |
//! | Undecodable image bytes | `DecodeFailed`, previous photo kept |
//! | Text backend not ready | Frame deferred, surfaces untouched |
//! | Snapshot names an unknown layout | `UnknownLayout`, nothing restored |

use std::collections::BTreeMap;
use std::fmt;

use keepsake_core::geometry::{FrameSize, PixelSize, Viewport};
use keepsake_core::region::{PanelMode, RegionId, RegionRole};
use keepsake_core::{PreviewError, PreviewResult};
use keepsake_layout::{
    DividerDrag, DividerEffect, DividerEvent, DividerHandle, GridController, LayoutCatalog,
    RegionChange, TrackRatios,
};
use keepsake_render::{
    DecodeOutcome, DecodeTicket, DecodedPhoto, FieldValues, FocalPoint, FontGlyphs,
    GlyphBackend, ImageTransform, PhotoCrop, ProofComposer, ProofLayer, RegionRenderer,
    RenderContext, StylePalette, Surface,
};
use keepsake_text::{CacheStats, MeasureCache, TextMeasure};

use crate::gesture::{CropEvent, CropGesture};
use crate::scheduler::{FrameScheduler, SchedulerStats};
use crate::snapshot::{PreviewSnapshot, SNAPSHOT_VERSION};
use crate::template::{RenderConfig, TemplateDescriptor};

// ─────────────────────────────────────────────────────────────────────────────
// Frame results
// ─────────────────────────────────────────────────────────────────────────────

/// What one frame tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing was pending.
    Idle,
    /// Regions were repainted.
    Rendered(FrameReport),
    /// Text measurement was unavailable; the frame stays pending.
    Deferred,
}

/// Region counts of a rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub rendered: usize,
    /// Live regions with a zero-area box.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
struct RegionSlot {
    role: RegionRole,
    surface: Surface,
    origin: (u32, u32),
    /// Painted at the last frame.
    visible: bool,
}

impl RegionSlot {
    fn new(role: RegionRole) -> Self {
        Self {
            role,
            surface: Surface::new(PixelSize::new(0, 0)),
            origin: (0, 0),
            visible: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// One live preview.
pub struct PreviewRenderer<G: GlyphBackend = FontGlyphs> {
    template: TemplateDescriptor,
    config: RenderConfig,
    grid: GridController,
    photos: ImageTransform,
    fields: FieldValues,
    style: String,
    palette: StylePalette,
    regions: BTreeMap<RegionId, RegionSlot>,
    scheduler: FrameScheduler,
    divider: DividerDrag,
    /// Override in effect when the current divider drag started.
    divider_prior: Option<Option<TrackRatios>>,
    gestures: BTreeMap<RegionId, CropGesture>,
    glyphs: MeasureCache<G>,
}

impl<G: GlyphBackend> fmt::Debug for PreviewRenderer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewRenderer")
            .field("template", &self.template.id)
            .field("layout", &self.grid.active_layout_id())
            .field("style", &self.style)
            .field("regions", &self.regions.keys().collect::<Vec<_>>())
            .field("pending", &self.scheduler.is_pending())
            .finish_non_exhaustive()
    }
}

impl PreviewRenderer<FontGlyphs> {
    /// Start a preview for `template` drawing with the bundled fonts.
    pub fn init(template: TemplateDescriptor, viewport: Viewport) -> PreviewResult<Self> {
        Self::with_backend(FontGlyphs::bundled(), template, viewport, RenderConfig::default())
    }
}

impl<G: GlyphBackend> PreviewRenderer<G> {
    /// Start a preview drawing through `glyphs`.
    ///
    /// The template's default layout, style, and field values are applied
    /// and the first frame is requested.
    pub fn with_backend(
        glyphs: G,
        template: TemplateDescriptor,
        viewport: Viewport,
        config: RenderConfig,
    ) -> PreviewResult<Self> {
        let (grid, changes) =
            GridController::new(LayoutCatalog::builtin(), template.initial_layout(), viewport)?;
        let (style, palette) = template.initial_style();
        let fields = template.default_fields();
        let mut renderer = Self {
            glyphs: MeasureCache::new(glyphs, config.measure_cache_capacity),
            divider: DividerDrag::new(config.min_track_weight),
            divider_prior: None,
            template,
            config,
            grid,
            photos: ImageTransform::new(),
            fields,
            style,
            palette,
            regions: BTreeMap::new(),
            scheduler: FrameScheduler::new(),
            gestures: BTreeMap::new(),
        };
        renderer.apply_changes(changes);
        renderer.scheduler.request();
        tracing::debug!(
            template = %renderer.template.id,
            layout = renderer.grid.active_layout_id(),
            style = %renderer.style,
            "preview initialised"
        );
        Ok(renderer)
    }

    fn apply_changes(&mut self, changes: Vec<RegionChange>) {
        for change in changes {
            match change {
                RegionChange::Created { id, role } => {
                    self.regions.insert(id, RegionSlot::new(role));
                }
                RegionChange::Destroyed { id } => {
                    self.regions.remove(&id);
                    self.gestures.remove(&id);
                }
                RegionChange::RoleChanged { id, role } => {
                    if let Some(slot) = self.regions.get_mut(&id) {
                        slot.role = role;
                    }
                }
            }
        }
    }

    fn request_render(&mut self) {
        self.scheduler.request();
    }

    // ── Fields and style ────────────────────────────────────────────────

    /// Set one field. Returns `true` and schedules a render if it changed.
    pub fn set_field(&mut self, id: &str, value: impl Into<String>) -> bool {
        let changed = self.fields.set(id, value);
        if changed {
            self.request_render();
        }
        changed
    }

    /// Current field values.
    #[must_use]
    pub fn fields(&self) -> &FieldValues {
        &self.fields
    }

    /// Switch to a style variant of the template.
    ///
    /// Unknown style ids are ignored and return `false`.
    pub fn set_style(&mut self, style: &str) -> bool {
        let Some(palette) = self.template.palette(style) else {
            tracing::warn!(style, "unknown style ignored");
            return false;
        };
        self.style = style.to_owned();
        self.palette = palette;
        self.request_render();
        true
    }

    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }

    #[must_use]
    pub fn palette(&self) -> StylePalette {
        self.palette
    }

    // ── Photos ──────────────────────────────────────────────────────────

    /// Regions that may hold a photo, whether or not they are live.
    fn photo_region(region: &str) -> PreviewResult<RegionId> {
        match RegionRole::for_area(region, PanelMode::Photo) {
            Some(RegionRole::Photo) => Ok(RegionId::from(region)),
            _ => Err(PreviewError::RegionNotFound {
                region: region.to_owned(),
            }),
        }
    }

    /// Decode `bytes` and show them in `region`.
    pub fn set_photo(&mut self, region: &str, bytes: Vec<u8>, focal_hint: Option<FocalPoint>) -> PreviewResult<()> {
        let id = Self::photo_region(region)?;
        self.photos.set_image(id, bytes, focal_hint)?;
        self.request_render();
        Ok(())
    }

    /// Start an upload whose decode runs elsewhere.
    ///
    /// Hand the ticket's [`DecodeTicket::decode`] result back through
    /// [`Self::finish_photo`]. A newer upload to the same region makes this
    /// one stale.
    pub fn begin_photo(
        &mut self,
        region: &str,
        bytes: Vec<u8>,
        focal_hint: Option<FocalPoint>,
    ) -> PreviewResult<DecodeTicket> {
        let id = Self::photo_region(region)?;
        Ok(self.photos.begin_decode(id, bytes, focal_hint))
    }

    /// Apply a finished decode.
    pub fn finish_photo(&mut self, decoded: DecodedPhoto) -> DecodeOutcome {
        let outcome = self.photos.finish_decode(decoded);
        if outcome == DecodeOutcome::Applied {
            self.request_render();
        }
        outcome
    }

    /// Set zoom and pan of a photo region, clamped into range.
    pub fn set_photo_crop(&mut self, region: &str, zoom: f64, pan_x: f64, pan_y: f64) -> PreviewResult<PhotoCrop> {
        let id = Self::photo_region(region)?;
        let crop = self.photos.set_crop(id, zoom, pan_x, pan_y);
        self.request_render();
        Ok(crop)
    }

    /// Crop of a live photo region; `None` if the region is not in the
    /// active layout or nothing was ever set or uploaded.
    ///
    /// Crops of regions the layout dropped are kept and come back with the
    /// region.
    #[must_use]
    pub fn photo_crop(&self, region: &str) -> Option<PhotoCrop> {
        if !self.grid.contains(region) {
            return None;
        }
        self.photos.crop(region)
    }

    /// Whether `region` currently shows a decoded bitmap.
    #[must_use]
    pub fn has_photo(&self, region: &str) -> bool {
        self.photos
            .state(region)
            .is_some_and(|state| state.image.is_some())
    }

    /// Feed a pointer gesture on a live photo region.
    ///
    /// Gestures on a region without a bitmap do nothing. Returns the stored
    /// crop when the gesture changed it.
    pub fn handle_crop_event(&mut self, region: &str, event: CropEvent) -> PreviewResult<Option<PhotoCrop>> {
        if self.grid.role_of(region) != Some(RegionRole::Photo) {
            return Err(PreviewError::RegionNotFound {
                region: region.to_owned(),
            });
        }
        if !self.has_photo(region) {
            return Ok(None);
        }
        let id = RegionId::from(region);
        let size = self
            .grid
            .region_box(region)
            .map_or((0.0, 0.0), |rect| (rect.width, rect.height));
        let current = self.photos.crop(region).unwrap_or_default();
        let threshold = self.config.drag_threshold;
        let gesture = self
            .gestures
            .entry(id.clone())
            .or_insert_with(|| CropGesture::new(threshold));
        let Some(next) = gesture.apply(event, current, size) else {
            return Ok(None);
        };
        if next == current {
            return Ok(None);
        }
        let stored = self.photos.set_crop(id, next.zoom, next.pan_x, next.pan_y);
        self.request_render();
        Ok(Some(stored))
    }

    // ── Layout ──────────────────────────────────────────────────────────

    /// Switch layouts. Unknown ids leave everything unchanged.
    pub fn set_layout(&mut self, layout_id: &str) -> PreviewResult<()> {
        let changes = self.grid.apply_layout(layout_id)?;
        self.apply_changes(changes);
        self.cancel_divider_drag();
        self.request_render();
        Ok(())
    }

    /// Id of the active layout.
    #[must_use]
    pub fn current_layout(&self) -> &'static str {
        self.grid.active_layout_id()
    }

    /// Live regions and their roles, in id order.
    #[must_use]
    pub fn live_regions(&self) -> Vec<(RegionId, RegionRole)> {
        self.grid
            .live_regions()
            .map(|(id, role)| (id.clone(), role))
            .collect()
    }

    /// Use a physical print size for the surface aspect.
    ///
    /// Returns `false` and changes nothing for non-positive dimensions.
    pub fn set_frame_aspect(&mut self, width_in: f64, height_in: f64) -> bool {
        let Some(frame) = FrameSize::new(width_in, height_in) else {
            return false;
        };
        self.grid.recompute_frame(Some(frame));
        self.request_render();
        true
    }

    /// Use the print size encoded in a product SKU; any other SKU clears the
    /// override. Returns the size now in effect.
    pub fn set_frame_sku(&mut self, sku: &str) -> Option<FrameSize> {
        let frame = FrameSize::from_sku(sku);
        self.grid.recompute_frame(frame);
        self.request_render();
        frame
    }

    /// Return to the layout's own aspect ratio.
    pub fn clear_frame_aspect(&mut self) {
        self.grid.recompute_frame(None);
        self.request_render();
    }

    #[must_use]
    pub fn frame(&self) -> Option<FrameSize> {
        self.grid.frame()
    }

    /// Device-pixel size of the whole preview.
    #[must_use]
    pub fn surface_size(&self) -> Option<PixelSize> {
        self.grid.surface_device_size()
    }

    /// Update the host container metrics.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.grid.viewport() != viewport {
            self.grid.set_viewport(viewport);
            self.request_render();
        }
    }

    /// Override the track weights of `layout_id`.
    pub fn set_custom_ratios(&mut self, layout_id: &str, columns: Vec<f64>, rows: Vec<f64>) -> PreviewResult<()> {
        if self.grid.set_custom_ratios(layout_id, TrackRatios::new(columns, rows))? {
            self.request_render();
        }
        Ok(())
    }

    /// Drop the override of `layout_id`. Returns `true` if one existed.
    pub fn reset_custom_ratios(&mut self, layout_id: &str) -> bool {
        let removed = self.grid.reset_custom_ratios(layout_id);
        if removed && layout_id == self.grid.active_layout_id() {
            self.request_render();
        }
        removed
    }

    /// Every override, keyed by layout id.
    #[must_use]
    pub fn custom_ratios(&self) -> BTreeMap<String, TrackRatios> {
        self.grid.custom_ratios()
    }

    // ── Third panel ─────────────────────────────────────────────────────

    #[must_use]
    pub fn has_third_panel(&self) -> bool {
        self.grid.active_layout().region_count >= 3
    }

    /// Move to the 3-region counterpart of the active layout with the third
    /// panel in `mode`. Returns the new layout id.
    pub fn add_third_panel(&mut self, mode: PanelMode) -> PreviewResult<&'static str> {
        let target = self
            .grid
            .catalog()
            .with_third_panel(self.grid.active_layout_id())?
            .id;
        let changes = self.grid.set_panel_mode(mode);
        self.apply_changes(changes);
        self.set_layout(target)?;
        Ok(target)
    }

    /// Move to the 2-region counterpart of the active layout.
    pub fn remove_third_panel(&mut self) -> PreviewResult<&'static str> {
        let target = self
            .grid
            .catalog()
            .without_third_panel(self.grid.active_layout_id())?
            .id;
        self.set_layout(target)?;
        Ok(target)
    }

    /// Switch the third panel between photo and custom text.
    pub fn set_panel_mode(&mut self, mode: PanelMode) {
        let changes = self.grid.set_panel_mode(mode);
        if !changes.is_empty() {
            self.apply_changes(changes);
            self.request_render();
        }
    }

    #[must_use]
    pub fn panel_mode(&self) -> PanelMode {
        self.grid.panel_mode()
    }

    // ── Dividers ────────────────────────────────────────────────────────

    /// Handles between adjacent tracks, in layout pixels.
    #[must_use]
    pub fn divider_handles(&self) -> Vec<DividerHandle> {
        self.grid.divider_handles()
    }

    /// Feed a divider gesture. Moves apply live; the end of a drag persists
    /// the override; a double activation clears it.
    pub fn handle_divider_event(&mut self, event: DividerEvent) -> PreviewResult<DividerEffect> {
        let layout = self.grid.active_layout_id();
        let tracks = self.grid.active_tracks();
        let effect = self.divider.apply_event(&event, &tracks, self.grid.surface_rect());
        match &effect {
            DividerEffect::Started { .. } => {
                self.divider_prior = Some(self.grid.custom_ratios().remove(layout));
            }
            DividerEffect::Updated { ratios } => {
                self.grid.set_custom_ratios(layout, ratios.clone())?;
                self.request_render();
            }
            DividerEffect::Committed { ratios } => {
                self.divider_prior = None;
                self.grid.set_custom_ratios(layout, ratios.clone())?;
                self.request_render();
            }
            DividerEffect::Canceled { .. } => {
                match self.divider_prior.take().flatten() {
                    Some(prior) => {
                        self.grid.set_custom_ratios(layout, prior)?;
                    }
                    None => {
                        self.grid.reset_custom_ratios(layout);
                    }
                }
                self.request_render();
            }
            DividerEffect::Reset => {
                self.divider_prior = None;
                self.grid.reset_custom_ratios(layout);
                self.request_render();
            }
            DividerEffect::Noop { .. } => {}
        }
        Ok(effect)
    }

    fn cancel_divider_drag(&mut self) {
        if self.divider.is_dragging() {
            tracing::debug!("divider drag abandoned by layout change");
            self.divider = DividerDrag::new(self.config.min_track_weight);
            self.divider_prior = None;
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    /// Whether a render is waiting for the next frame.
    #[must_use]
    pub fn is_render_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Host frame callback: render if anything changed since the last one.
    pub fn on_frame(&mut self) -> PreviewResult<FrameOutcome> {
        if !self.scheduler.take() {
            return Ok(FrameOutcome::Idle);
        }
        match self.render_regions() {
            Ok(report) => Ok(FrameOutcome::Rendered(report)),
            Err(PreviewError::MeasurementUnavailable) => {
                self.scheduler.defer();
                tracing::debug!("render deferred until text measurement is ready");
                Ok(FrameOutcome::Deferred)
            }
            Err(err) => Err(err),
        }
    }

    /// Request a frame and run it immediately.
    pub fn render_now(&mut self) -> PreviewResult<FrameOutcome> {
        self.request_render();
        self.on_frame()
    }

    fn render_regions(&mut self) -> PreviewResult<FrameReport> {
        let _span = tracing::debug_span!("preview_frame", layout = self.grid.active_layout_id()).entered();
        if !self.glyphs.ready() {
            return Err(PreviewError::MeasurementUnavailable);
        }
        let device_scale = self.grid.viewport().device_scale;
        let measures = self.grid.measure_regions();
        let ctx = RenderContext {
            fields: &self.fields,
            palette: &self.palette,
            mapping: &self.template.tribute_mapping,
            labels: &self.template.placeholders,
            photos: &self.photos,
            device_scale,
        };
        let renderer = RegionRenderer::new(&self.glyphs);

        let mut report = FrameReport::default();
        for measure in measures {
            let Some(slot) = self.regions.get_mut(&measure.id) else {
                continue;
            };
            slot.role = measure.role;
            slot.origin = measure.device_origin;
            let Some(size) = measure.device_size else {
                slot.visible = false;
                report.skipped += 1;
                continue;
            };
            if slot.surface.resize(size) {
                tracing::trace!(region = %measure.id, width = size.width, height = size.height, "surface resized");
            }
            renderer.render(&measure.id, measure.role, &mut slot.surface, &ctx)?;
            slot.visible = true;
            report.rendered += 1;
        }
        tracing::debug!(rendered = report.rendered, skipped = report.skipped, "frame rendered");
        Ok(report)
    }

    /// Raster surface of a live region, for host gesture wiring.
    #[must_use]
    pub fn panel_surface(&self, region: &str) -> Option<&Surface> {
        self.regions.get(region).map(|slot| &slot.surface)
    }

    /// Flatten the current preview into one watermarked surface.
    ///
    /// Runs any pending frame first.
    pub fn compose_proof(&mut self) -> PreviewResult<Surface> {
        if self.scheduler.is_pending() && self.on_frame()? == FrameOutcome::Deferred {
            return Err(PreviewError::MeasurementUnavailable);
        }
        let size = self
            .grid
            .surface_device_size()
            .ok_or_else(|| PreviewError::Export("preview surface has no area".to_owned()))?;
        let layers = self
            .regions
            .values()
            .filter(|slot| slot.visible)
            .map(|slot| ProofLayer {
                surface: &slot.surface,
                origin: slot.origin,
            });
        let composer = ProofComposer::new(size, self.palette.background).watermark(self.config.watermark.clone());
        Ok(composer.compose(&self.glyphs, layers))
    }

    /// [`Self::compose_proof`] encoded as PNG.
    pub fn export_png(&mut self) -> PreviewResult<Vec<u8>> {
        self.compose_proof()?.encode_png()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Capture everything needed to rebuild this preview, photo bytes aside.
    #[must_use]
    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            version: SNAPSHOT_VERSION,
            fields: self.fields.clone(),
            style: self.style.clone(),
            layout: self.grid.active_layout_id().to_owned(),
            crops: self.photos.crops(),
            custom_ratios: self.grid.custom_ratios(),
            panel_mode: self.grid.panel_mode(),
            frame: self.grid.frame(),
        }
    }

    /// Replace the current state with `snapshot`.
    ///
    /// All-or-nothing: an unknown layout or an override that does not fit
    /// its layout leaves the preview untouched. Unknown styles and crops for
    /// regions that can never hold a photo are skipped with a warning.
    pub fn restore(&mut self, snapshot: &PreviewSnapshot) -> PreviewResult<()> {
        let mut grid = self.grid.clone();
        let mut changes = grid.set_panel_mode(snapshot.panel_mode);
        changes.extend(grid.apply_layout(&snapshot.layout)?);
        for layout in grid.custom_ratios().keys() {
            grid.reset_custom_ratios(layout);
        }
        for (layout, ratios) in &snapshot.custom_ratios {
            grid.set_custom_ratios(layout, ratios.clone())?;
        }
        grid.recompute_frame(snapshot.frame);

        self.grid = grid;
        self.apply_changes(changes);
        self.cancel_divider_drag();
        self.fields = snapshot.fields.clone();
        let crops: Vec<_> = snapshot
            .crops
            .iter()
            .filter_map(|(region, crop)| match Self::photo_region(region.as_str()) {
                Ok(id) => Some((id, *crop)),
                Err(_) => {
                    tracing::warn!(region = %region, "crop for non-photo region skipped");
                    None
                }
            })
            .collect();
        self.photos.replace_crops(crops);
        self.gestures.clear();
        if !snapshot.style.is_empty() {
            self.set_style(&snapshot.style);
        }
        self.request_render();
        tracing::debug!(layout = %snapshot.layout, "snapshot restored");
        Ok(())
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    #[must_use]
    pub fn template(&self) -> &TemplateDescriptor {
        &self.template
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The glyph backend this preview draws through.
    #[must_use]
    pub fn backend(&self) -> &G {
        self.glyphs.inner()
    }

    #[must_use]
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    #[must_use]
    pub fn measure_cache_stats(&self) -> CacheStats {
        self.glyphs.stats()
    }
}
