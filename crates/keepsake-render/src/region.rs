#![forbid(unsafe_code)]

//! Painters for the three region roles.
//!
//! Layout runs in layout pixels; painting happens on device-pixel surfaces.
//! [`RegionRenderer`] derives the layout box from the surface size and the
//! device scale, typesets there, and scales every coordinate on the way to
//! the surface.
//!
//! # Invariants
//!
//! 1. Rendering only mutates the region's own surface.
//! 2. A zero-sized surface is skipped without error.
//! 3. Every paint starts from a cleared surface; output depends only on the
//!    inputs, never on what was drawn before.

use keepsake_core::geometry::Rect;
use keepsake_core::region::{RegionId, RegionRole};
use keepsake_core::PreviewResult;
use keepsake_text::{
    FontFamily, FontSpec, TextBlockPlan, TextSlot, TypesetEngine, TypesetPlan, VerticalAnchor,
    layout_text_block,
};

use crate::color::PackedRgba;
use crate::fields::{FieldValues, PANEL_TEXT_FIELD, PlaceholderLabels, TributeMapping};
use crate::glyph::{GlyphBackend, TextRun};
use crate::palette::StylePalette;
use crate::photo::ImageTransform;
use crate::surface::Surface;

const VIGNETTE_INNER: PackedRgba = PackedRgba::rgba(196, 168, 130, 10);
const VIGNETTE_OUTER: PackedRgba = PackedRgba::rgba(196, 168, 130, 0);
const VIGNETTE_REACH: f64 = 0.6;
const RULE_OPACITY: f64 = 0.4;

const PLACEHOLDER_FILL: PackedRgba = PackedRgba::rgba(255, 255, 255, 8);
const PLACEHOLDER_STROKE: PackedRgba = PackedRgba::rgba(255, 255, 255, 31);
const PLACEHOLDER_LABEL: PackedRgba = PackedRgba::rgba(255, 255, 255, 38);
const TEXT_PLACEHOLDER: PackedRgba = PackedRgba::rgba(255, 255, 255, 26);

/// Shared inputs for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub fields: &'a FieldValues,
    pub palette: &'a StylePalette,
    pub mapping: &'a TributeMapping,
    pub labels: &'a PlaceholderLabels,
    pub photos: &'a ImageTransform,
    /// Device pixels per layout pixel.
    pub device_scale: f64,
}

/// What a render call painted.
#[derive(Debug, Clone, PartialEq)]
pub enum Painted {
    /// The surface had no pixels.
    Skipped,
    /// A photo region; `cover` is the source rectangle when a bitmap was drawn.
    Photo { cover: Option<Rect> },
    Tribute(Box<TypesetPlan>),
    /// A text region; `None` when the placeholder was drawn.
    Text(Option<TextBlockPlan>),
}

/// Paints regions through a glyph backend.
#[derive(Debug, Clone, Copy)]
pub struct RegionRenderer<'g, G: ?Sized> {
    glyphs: &'g G,
}

impl<'g, G: GlyphBackend + ?Sized> RegionRenderer<'g, G> {
    #[must_use]
    pub fn new(glyphs: &'g G) -> Self {
        Self { glyphs }
    }

    /// Repaint `surface` for `region` in `role`.
    ///
    /// Fails only with [`keepsake_core::PreviewError::MeasurementUnavailable`],
    /// in which case the surface is left as it was.
    pub fn render(
        &self,
        region: &RegionId,
        role: RegionRole,
        surface: &mut Surface,
        ctx: &RenderContext<'_>,
    ) -> PreviewResult<Painted> {
        if surface.width() == 0 || surface.height() == 0 {
            return Ok(Painted::Skipped);
        }
        match role {
            RegionRole::Photo => Ok(self.paint_photo(region, surface, ctx)),
            RegionRole::Tribute => self.paint_tribute(surface, ctx),
            RegionRole::Text => self.paint_text(surface, ctx),
        }
    }

    fn paint_photo(&self, region: &RegionId, surface: &mut Surface, ctx: &RenderContext<'_>) -> Painted {
        let width = f64::from(surface.width());
        let height = f64::from(surface.height());
        surface.clear();
        surface.fill(ctx.palette.background);

        let image = ctx.photos.state(region.as_str()).and_then(|state| state.image.clone());
        if let (Some(image), Some(cover)) = (image, ctx.photos.cover_rect(region.as_str(), width, height)) {
            surface.draw_image(&image, cover, Rect::from_size(width, height));
            return Painted::Photo { cover: Some(cover) };
        }

        let label = if region.as_str() == RegionId::PHOTO {
            ctx.labels.photo.as_str()
        } else {
            ctx.labels.second_photo.as_str()
        };
        self.paint_photo_placeholder(surface, label);
        Painted::Photo { cover: None }
    }

    fn paint_photo_placeholder(&self, surface: &mut Surface, label: &str) {
        let width = f64::from(surface.width());
        let height = f64::from(surface.height());
        surface.fill(PLACEHOLDER_FILL);

        let cx = width / 2.0;
        let cy = height / 2.0;
        let icon = width.min(height) * 0.12;
        let stroke = icon * 0.06;
        surface.stroke_rounded_rect(
            Rect::new(cx - icon, cy - icon * 0.7, icon * 2.0, icon * 1.4),
            icon * 0.15,
            stroke,
            PLACEHOLDER_STROKE,
        );
        surface.stroke_circle(cx, cy, icon * 0.4, stroke, PLACEHOLDER_STROKE);

        let font = FontSpec::new(FontFamily::Sans, (icon * 0.3).round());
        self.glyphs.draw_text(
            surface,
            &TextRun::new(label, font, cx, cy + icon * 1.1, PLACEHOLDER_LABEL),
        );
    }

    fn paint_tribute(&self, surface: &mut Surface, ctx: &RenderContext<'_>) -> PreviewResult<Painted> {
        let k = device_scale(ctx);
        let width = f64::from(surface.width());
        let height = f64::from(surface.height());
        let text = ctx.mapping.resolve(ctx.fields);
        let plan = TypesetEngine::new(self.glyphs).typeset(&text, width / k, height / k)?;

        surface.clear();
        surface.fill(ctx.palette.background);
        surface.fill_radial_gradient(
            width / 2.0,
            height / 2.0,
            height * VIGNETTE_REACH,
            VIGNETTE_INNER,
            VIGNETTE_OUTER,
        );

        let center_x = plan.center_x * k;
        let max_width = plan.max_text_width * k;
        for placed in plan.header.iter().chain(plan.footer.iter()) {
            let color = match placed.slot {
                TextSlot::Name => ctx.palette.name,
                TextSlot::Dates => ctx.palette.dates,
                TextSlot::Nickname => ctx.palette.nickname,
                TextSlot::Family => ctx.palette.family,
            };
            let run = TextRun::new(&placed.text, scaled(placed.font, k), center_x, placed.y * k, color)
                .anchor(placed.anchor)
                .max_width(max_width);
            self.glyphs.draw_text(surface, &run);
        }

        let rule_color = ctx.palette.divider.with_opacity(RULE_OPACITY);
        for rule in &plan.rules {
            surface.stroke_hline(
                center_x - rule.half_width * k,
                center_x + rule.half_width * k,
                rule.y * k,
                rule.line_width * k,
                rule_color,
            );
        }

        let body_font = scaled(plan.body_font, k);
        for line in plan.visible_lines() {
            let run = TextRun::new(&line.text, body_font, center_x, line.y * k, ctx.palette.poem)
                .max_width(max_width);
            self.glyphs.draw_text(surface, &run);
        }

        tracing::trace!(
            tier = plan.tier_index,
            font_percent = plan.font_percent,
            lines = plan.body.len(),
            overflow = plan.overflow,
            "tribute painted"
        );
        Ok(Painted::Tribute(Box::new(plan)))
    }

    fn paint_text(&self, surface: &mut Surface, ctx: &RenderContext<'_>) -> PreviewResult<Painted> {
        let k = device_scale(ctx);
        let width = f64::from(surface.width());
        let height = f64::from(surface.height());
        let message = ctx.fields.get(PANEL_TEXT_FIELD);
        let plan = layout_text_block(self.glyphs, message, width / k, height / k)?;

        surface.clear();
        surface.fill(ctx.palette.background);

        let Some(plan) = plan else {
            let font = FontSpec::new(FontFamily::Sans, (width.min(height) * 0.05).round());
            let run = TextRun::new(&ctx.labels.text, font, width / 2.0, height / 2.0, TEXT_PLACEHOLDER)
                .anchor(VerticalAnchor::Middle);
            self.glyphs.draw_text(surface, &run);
            return Ok(Painted::Text(None));
        };

        let font = scaled(plan.font, k);
        for line in plan.lines.iter().filter(|line| !line.is_blank()) {
            let run = TextRun::new(&line.text, font, plan.center_x * k, line.y * k, ctx.palette.poem)
                .max_width(plan.max_text_width * k);
            self.glyphs.draw_text(surface, &run);
        }
        Ok(Painted::Text(Some(plan)))
    }
}

fn device_scale(ctx: &RenderContext<'_>) -> f64 {
    if ctx.device_scale.is_finite() && ctx.device_scale > 0.0 {
        ctx.device_scale
    } else {
        1.0
    }
}

/// `font` resized from layout to device pixels.
fn scaled(font: FontSpec, k: f64) -> FontSpec {
    FontSpec {
        size_px: FontSpec::new(font.family, font.size() * k).size_px,
        ..font
    }
}
