#![forbid(unsafe_code)]

//! Glyph painting backends.
//!
//! [`GlyphBackend`] pairs measurement with painting so the widths layout
//! relies on are the widths that get drawn. [`FontGlyphs`] rasterises
//! TrueType faces with `fontdue`. The DejaVu serif and sans faces ship with
//! the crate, so proofs and tests render identical text on every machine.
//!
//! A run is rasterised once into its own premultiplied layer at its natural
//! width, then drawn onto the surface through one transform that places
//! it on the run's anchor point.
//!
//! # Invariants
//!
//! 1. `measure` and `draw_text` use the same face and the same kerned
//!    advances for a given [`FontSpec`].
//! 2. A backend with no faces is not `ready`; it measures zero and paints
//!    nothing.

use std::fmt;
use std::sync::{Arc, OnceLock};

use fontdue::{Font, FontSettings};
use keepsake_core::{PreviewError, PreviewResult};
use keepsake_text::{FontFamily, FontSpec, FontStyle, MeasureCache, TextMeasure, VerticalAnchor};
use tiny_skia::{FilterQuality, Pixmap, Transform};

use crate::color::PackedRgba;
use crate::surface::Surface;

/// Weight at and above which the bold face is preferred.
const BOLD_WEIGHT: u16 = 600;
/// Transparent margin around a rasterised run so filtered edges survive.
const RUN_PAD: f32 = 1.0;

const BUNDLED_FACES: [(FaceKey, &[u8]); 4] = [
    (
        FaceKey::new(FontFamily::Serif, FontStyle::Normal, false),
        include_bytes!("../assets/fonts/DejaVuSerif.ttf"),
    ),
    (
        FaceKey::new(FontFamily::Serif, FontStyle::Italic, false),
        include_bytes!("../assets/fonts/DejaVuSerif-Italic.ttf"),
    ),
    (
        FaceKey::new(FontFamily::Sans, FontStyle::Normal, false),
        include_bytes!("../assets/fonts/DejaVuSans.ttf"),
    ),
    (
        FaceKey::new(FontFamily::Sans, FontStyle::Normal, true),
        include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf"),
    ),
];

/// One horizontally centred string to paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font: FontSpec,
    pub center_x: f64,
    pub y: f64,
    pub anchor: VerticalAnchor,
    /// Runs wider than this are compressed horizontally to fit.
    pub max_width: Option<f64>,
    pub color: PackedRgba,
    /// Clockwise rotation in radians about `(center_x, y)`.
    pub rotation: f64,
}

impl<'a> TextRun<'a> {
    /// Upright run anchored at its top.
    #[must_use]
    pub fn new(text: &'a str, font: FontSpec, center_x: f64, y: f64, color: PackedRgba) -> Self {
        Self {
            text,
            font,
            center_x,
            y,
            anchor: VerticalAnchor::Top,
            max_width: None,
            color,
            rotation: 0.0,
        }
    }

    #[must_use]
    pub fn anchor(mut self, anchor: VerticalAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }

    #[must_use]
    pub fn rotation(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }
}

/// Measures and paints text.
pub trait GlyphBackend: TextMeasure {
    fn draw_text(&self, surface: &mut Surface, run: &TextRun<'_>);
}

/// Cached measurement, uncached painting.
impl<G: GlyphBackend> GlyphBackend for MeasureCache<G> {
    fn draw_text(&self, surface: &mut Surface, run: &TextRun<'_>) {
        self.inner().draw_text(surface, run);
    }
}

/// Which face of a family a font resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceKey {
    pub family: FontFamily,
    pub style: FontStyle,
    pub bold: bool,
}

impl FaceKey {
    #[must_use]
    pub const fn new(family: FontFamily, style: FontStyle, bold: bool) -> Self {
        Self {
            family,
            style,
            bold,
        }
    }

    /// The face `font` asks for.
    #[must_use]
    pub fn for_font(font: &FontSpec) -> Self {
        Self::new(font.family, font.style, font.weight >= BOLD_WEIGHT)
    }
}

impl fmt::Display for FaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self.family {
            FontFamily::Serif => "serif",
            FontFamily::Sans => "sans",
        };
        f.write_str(family)?;
        if self.bold {
            f.write_str(" bold")?;
        }
        if self.style == FontStyle::Italic {
            f.write_str(" italic")?;
        }
        Ok(())
    }
}

/// TrueType glyphs rasterised by `fontdue`.
///
/// A font resolves to its exact face, then the same family without bold,
/// then without italic, then any face of the family, then any face at all.
/// Cloning shares the parsed faces.
#[derive(Clone)]
pub struct FontGlyphs {
    faces: Arc<[(FaceKey, Font)]>,
}

impl FontGlyphs {
    /// Parse `faces`, failing on the first one `fontdue` rejects.
    pub fn from_faces<'a, I>(faces: I) -> PreviewResult<Self>
    where
        I: IntoIterator<Item = (FaceKey, &'a [u8])>,
    {
        let faces = faces
            .into_iter()
            .map(|(key, bytes)| load_face(key, bytes).map(|font| (key, font)))
            .collect::<PreviewResult<Vec<_>>>()?;
        Ok(Self {
            faces: faces.into(),
        })
    }

    /// The bundled DejaVu faces, parsed once per process.
    ///
    /// A face that fails to parse is logged and left out.
    #[must_use]
    pub fn bundled() -> Self {
        static BUNDLED: OnceLock<FontGlyphs> = OnceLock::new();
        BUNDLED
            .get_or_init(|| {
                let faces: Vec<_> = BUNDLED_FACES
                    .iter()
                    .filter_map(|&(key, bytes)| match load_face(key, bytes) {
                        Ok(font) => Some((key, font)),
                        Err(err) => {
                            tracing::warn!(error = %err, "bundled font face skipped");
                            None
                        }
                    })
                    .collect();
                tracing::debug!(faces = faces.len(), "bundled fonts loaded");
                Self {
                    faces: faces.into(),
                }
            })
            .clone()
    }

    /// Faces available, in load order.
    pub fn faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces.iter().map(|(key, _)| *key)
    }

    /// The key of the face `font` resolves to.
    #[must_use]
    pub fn resolve(&self, font: &FontSpec) -> Option<FaceKey> {
        self.face(font).map(|(key, _)| *key)
    }

    fn face(&self, font: &FontSpec) -> Option<&(FaceKey, Font)> {
        let want = FaceKey::for_font(font);
        let fallbacks = [
            want,
            FaceKey { bold: false, ..want },
            FaceKey { style: FontStyle::Normal, ..want },
            FaceKey::new(want.family, FontStyle::Normal, false),
        ];
        fallbacks
            .iter()
            .find_map(|key| self.faces.iter().find(|(have, _)| have == key))
            .or_else(|| self.faces.iter().find(|(have, _)| have.family == want.family))
            .or_else(|| self.faces.first())
    }
}

impl Default for FontGlyphs {
    fn default() -> Self {
        Self::bundled()
    }
}

impl fmt::Debug for FontGlyphs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontGlyphs")
            .field("faces", &self.faces().collect::<Vec<_>>())
            .finish()
    }
}

fn load_face(key: FaceKey, bytes: &[u8]) -> PreviewResult<Font> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| PreviewError::FontLoad {
        face: key.to_string(),
        reason: reason.to_owned(),
    })
}

/// Kerned advance of `text`.
fn advance(face: &Font, px: f32, text: &str) -> f32 {
    let mut width = 0.0;
    let mut previous = None;
    for ch in text.chars() {
        if let Some(prev) = previous {
            width += face.horizontal_kern(prev, ch, px).unwrap_or(0.0);
        }
        width += face.metrics(ch, px).advance_width;
        previous = Some(ch);
    }
    width
}

/// A run rasterised at its natural width.
struct RunLayer {
    pixmap: Pixmap,
    advance: f32,
    line_height: f32,
}

fn rasterize_run(face: &Font, px: f32, text: &str, color: PackedRgba) -> Option<RunLayer> {
    let (ascent, descent) = face
        .horizontal_line_metrics(px)
        .map_or((px * 0.8, -px * 0.2), |line| (line.ascent, line.descent));
    let advance = advance(face, px, text);
    let line_height = ascent - descent;
    let width = (advance + RUN_PAD * 2.0).ceil() as u32;
    let height = (line_height + RUN_PAD * 2.0).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)?;

    let (stride, rows) = (width as i64, height as i64);
    let baseline = RUN_PAD + ascent;
    let pixels = pixmap.pixels_mut();
    let mut pen = RUN_PAD;
    let mut previous = None;
    for ch in text.chars() {
        if let Some(prev) = previous {
            pen += face.horizontal_kern(prev, ch, px).unwrap_or(0.0);
        }
        let (metrics, coverage) = face.rasterize(ch, px);
        let left = (pen + metrics.xmin as f32).round() as i64;
        let top = (baseline - metrics.ymin as f32 - metrics.height as f32).round() as i64;
        for (i, &cover) in coverage.iter().enumerate() {
            if cover == 0 {
                continue;
            }
            let x = left + (i % metrics.width) as i64;
            let y = top + (i / metrics.width) as i64;
            if !(0..stride).contains(&x) || !(0..rows).contains(&y) {
                continue;
            }
            let alpha = ((u16::from(color.a()) * u16::from(cover) + 127) / 255) as u8;
            let slot = &mut pixels[(y * stride + x) as usize];
            // Overlapping glyphs keep the stronger coverage.
            if alpha > slot.alpha() {
                *slot = PackedRgba::rgba(color.r(), color.g(), color.b(), alpha).premultiply();
            }
        }
        pen += metrics.advance_width;
        previous = Some(ch);
    }
    Some(RunLayer {
        pixmap,
        advance,
        line_height,
    })
}

impl TextMeasure for FontGlyphs {
    fn ready(&self) -> bool {
        !self.faces.is_empty()
    }

    fn measure(&self, font: &FontSpec, text: &str) -> f64 {
        match self.face(font) {
            Some((_, face)) if font.size_px > 0 => f64::from(advance(face, font.size_px as f32, text)),
            _ => 0.0,
        }
    }
}

impl GlyphBackend for FontGlyphs {
    fn draw_text(&self, surface: &mut Surface, run: &TextRun<'_>) {
        if run.text.trim().is_empty() || run.font.size_px == 0 || run.color.a() == 0 {
            return;
        }
        let Some((_, face)) = self.face(&run.font) else {
            return;
        };
        let Some(layer) = rasterize_run(face, run.font.size_px as f32, run.text, run.color) else {
            return;
        };
        let natural = f64::from(layer.advance);
        let compress = match run.max_width {
            Some(max) if natural > max && max > 0.0 => max / natural,
            _ => 1.0,
        };
        let line_height = f64::from(layer.line_height);
        let top = match run.anchor {
            VerticalAnchor::Top => 0.0,
            VerticalAnchor::Middle => -line_height / 2.0,
            VerticalAnchor::Bottom => -line_height,
        };
        let pad = f64::from(RUN_PAD);
        let origin_x = -natural / 2.0 - pad;
        let origin_y = top - pad;

        if run.rotation == 0.0 && compress == 1.0 {
            let x = (run.center_x + origin_x).round() as f32;
            let y = (run.y + origin_y).round() as f32;
            surface.draw_layer(&layer.pixmap, Transform::from_translate(x, y), FilterQuality::Nearest);
        } else {
            let transform = Transform::from_translate(run.center_x as f32, run.y as f32)
                .pre_concat(Transform::from_rotate(run.rotation.to_degrees() as f32))
                .pre_scale(compress as f32, 1.0)
                .pre_translate(origin_x as f32, origin_y as f32);
            surface.draw_layer(&layer.pixmap, transform, FilterQuality::Bilinear);
        }
    }
}
