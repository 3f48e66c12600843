#![forbid(unsafe_code)]

//! Headless raster surface over a `tiny-skia` pixmap.
//!
//! One [`Surface`] backs each live region. Coordinates are device pixels
//! with the origin at the top-left. Shapes are anti-aliased paths and every
//! paint blends source-over onto what is already there. Pixels are stored
//! premultiplied; [`Surface::pixel`] hands them back straight.
//!
//! # Invariants
//!
//! 1. Painting never reads or writes outside the pixel grid.
//! 2. A zero-sized surface accepts every call and paints nothing.

use keepsake_core::geometry::{PixelSize, Rect};
use keepsake_core::{PreviewError, PreviewResult};
use tiny_skia::{
    FilterQuality, GradientStop, Paint, Path, PathBuilder, Pattern, Pixmap, PixmapPaint, Point,
    RadialGradient, Rect as SkRect, Shader, SpreadMode, Stroke, Transform,
};

use crate::color::PackedRgba;

/// Cubic control distance for a quarter circle of unit radius.
const KAPPA: f32 = 0.552_284_75;

/// An RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    size: PixelSize,
    /// `None` when either side is zero; tiny-skia has no empty pixmaps.
    pixmap: Option<Pixmap>,
}

impl Surface {
    /// A transparent surface of `size`.
    #[must_use]
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            pixmap: Pixmap::new(size.width, size.height),
        }
    }

    #[must_use]
    pub fn size(&self) -> PixelSize {
        self.size
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Reallocate to `size`, discarding content. Returns `false` when the
    /// size was already `size` and nothing changed.
    pub fn resize(&mut self, size: PixelSize) -> bool {
        if self.size == size {
            return false;
        }
        *self = Self::new(size);
        true
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        if let Some(pixmap) = &mut self.pixmap {
            pixmap.fill(tiny_skia::Color::TRANSPARENT);
        }
    }

    /// Color at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<PackedRgba> {
        let pixel = self.pixmap.as_ref()?.pixel(x, y)?;
        Some(PackedRgba::from_premultiplied(pixel))
    }

    /// Borrow the pixmap; `None` for a zero-sized surface.
    #[must_use]
    pub fn as_pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    fn full_rect(&self) -> Option<SkRect> {
        SkRect::from_xywh(0.0, 0.0, self.size.width as f32, self.size.height as f32)
    }

    fn fill_with(&mut self, rect: Option<SkRect>, paint: &Paint<'_>) {
        if let (Some(pixmap), Some(rect)) = (&mut self.pixmap, rect) {
            pixmap.fill_rect(rect, paint, Transform::identity(), None);
        }
    }

    fn stroke_with(&mut self, path: Option<Path>, line_width: f64, color: PackedRgba) {
        if color.a() == 0 {
            return;
        }
        let (Some(pixmap), Some(path)) = (&mut self.pixmap, path) else {
            return;
        };
        let stroke = Stroke {
            width: line_width.max(1.0) as f32,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
    }

    /// Blend `color` over the whole surface.
    pub fn fill(&mut self, color: PackedRgba) {
        if color.a() > 0 {
            self.fill_with(self.full_rect(), &solid(color));
        }
    }

    /// Blend `color` over `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: PackedRgba) {
        if color.a() > 0 {
            self.fill_with(sk_rect(rect), &solid(color));
        }
    }

    /// Horizontal stroke from `x0` to `x1` centred on `y`.
    pub fn stroke_hline(&mut self, x0: f64, x1: f64, y: f64, line_width: f64, color: PackedRgba) {
        let half = line_width.max(1.0) / 2.0;
        self.fill_rect(Rect::new(x0, y - half, x1 - x0, half * 2.0), color);
    }

    /// Outline of a circle.
    pub fn stroke_circle(&mut self, cx: f64, cy: f64, radius: f64, line_width: f64, color: PackedRgba) {
        let path = PathBuilder::from_circle(cx as f32, cy as f32, radius as f32);
        self.stroke_with(path, line_width, color);
    }

    /// Outline of a rounded rectangle.
    pub fn stroke_rounded_rect(&mut self, rect: Rect, radius: f64, line_width: f64, color: PackedRgba) {
        self.stroke_with(rounded_rect_path(rect, radius), line_width, color);
    }

    /// Blend a radial gradient over the whole surface: `inner` at the
    /// centre fading to `outer` at `radius` and beyond.
    pub fn fill_radial_gradient(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        inner: PackedRgba,
        outer: PackedRgba,
    ) {
        if !(radius > 0.0) {
            return;
        }
        let centre = Point::from_xy(cx as f32, cy as f32);
        let Some(shader) = RadialGradient::new(
            centre,
            centre,
            radius as f32,
            vec![
                GradientStop::new(0.0, inner.to_color()),
                GradientStop::new(1.0, outer.to_color()),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        self.fill_with(self.full_rect(), &shaded(shader));
    }

    /// Draw the `source` sub-rectangle of `image` scaled into `dest` with
    /// bilinear filtering. Samples past the image edge repeat the edge.
    pub fn draw_image(&mut self, image: &Pixmap, source: Rect, dest: Rect) {
        if dest.is_empty() || source.is_empty() {
            return;
        }
        let transform = Transform::from_translate(dest.x as f32, dest.y as f32)
            .pre_scale(
                (dest.width / source.width) as f32,
                (dest.height / source.height) as f32,
            )
            .pre_translate(-source.x as f32, -source.y as f32);
        let pattern = Pattern::new(
            image.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            transform,
        );
        self.fill_with(sk_rect(dest), &shaded(pattern));
    }

    /// Blend `layer` through `transform`, which maps layer pixels to
    /// surface pixels.
    pub fn draw_layer(&mut self, layer: &Pixmap, transform: Transform, quality: FilterQuality) {
        if let Some(pixmap) = &mut self.pixmap {
            let paint = PixmapPaint {
                quality,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(0, 0, layer.as_ref(), &paint, transform, None);
        }
    }

    /// Blend `other` onto this surface with its top-left at `(x, y)`.
    pub fn blit(&mut self, other: &Surface, x: u32, y: u32) {
        let (Some(layer), Ok(x), Ok(y)) = (other.as_pixmap(), i32::try_from(x), i32::try_from(y))
        else {
            return;
        };
        if let Some(pixmap) = &mut self.pixmap {
            pixmap.draw_pixmap(x, y, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        }
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> PreviewResult<Vec<u8>> {
        let pixmap = self
            .pixmap
            .as_ref()
            .ok_or_else(|| PreviewError::Export("surface has no pixels".to_owned()))?;
        pixmap
            .encode_png()
            .map_err(|err| PreviewError::Export(err.to_string()))
    }
}

fn solid(color: PackedRgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
    paint.anti_alias = true;
    paint
}

fn shaded(shader: Shader<'_>) -> Paint<'_> {
    Paint {
        shader,
        anti_alias: true,
        ..Paint::default()
    }
}

fn sk_rect(rect: Rect) -> Option<SkRect> {
    SkRect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
}

/// Closed outline of `rect` with circular corners; `radius` is clamped to
/// half the shorter side.
fn rounded_rect_path(rect: Rect, radius: f64) -> Option<Path> {
    let (x, y) = (rect.x as f32, rect.y as f32);
    let (w, h) = (rect.width as f32, rect.height as f32);
    if !(w > 0.0 && h > 0.0) {
        return None;
    }
    let r = (radius as f32).clamp(0.0, w.min(h) / 2.0);
    if r == 0.0 {
        return Some(PathBuilder::from_rect(SkRect::from_xywh(x, y, w, h)?));
    }
    let k = r * KAPPA;
    let (right, bottom) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: u32, h: u32) -> Surface {
        Surface::new(PixelSize::new(w, h))
    }

    fn alpha(s: &Surface, x: u32, y: u32) -> u8 {
        s.pixel(x, y).map_or(0, PackedRgba::a)
    }

    #[test]
    fn aligned_rect_covers_whole_pixels() {
        let mut s = surface(10, 10);
        s.fill_rect(Rect::new(2.0, 2.0, 3.0, 1.0), PackedRgba::WHITE);
        assert_eq!(s.pixel(2, 2), Some(PackedRgba::WHITE));
        assert_eq!(s.pixel(4, 2), Some(PackedRgba::WHITE));
        assert_eq!(s.pixel(5, 2), Some(PackedRgba::TRANSPARENT));
        assert_eq!(s.pixel(2, 3), Some(PackedRgba::TRANSPARENT));
    }

    #[test]
    fn fractional_edges_are_antialiased() {
        let mut s = surface(10, 4);
        s.fill_rect(Rect::new(2.5, 0.0, 4.0, 4.0), PackedRgba::WHITE);
        let edge = alpha(&s, 2, 1);
        assert!(edge > 64 && edge < 192, "edge alpha {edge}");
        assert_eq!(alpha(&s, 4, 1), 255);
    }

    #[test]
    fn painting_outside_is_clipped() {
        let mut s = surface(4, 4);
        s.fill_rect(Rect::new(-10.0, -10.0, 100.0, 100.0), PackedRgba::BLACK);
        assert!((0..4).all(|i| s.pixel(i, i) == Some(PackedRgba::BLACK)));
        let mut empty = surface(0, 0);
        empty.fill(PackedRgba::WHITE);
        empty.stroke_circle(0.0, 0.0, 5.0, 1.0, PackedRgba::WHITE);
        empty.clear();
        assert_eq!(empty.pixel(0, 0), None);
        assert!(empty.encode_png().is_err());
    }

    #[test]
    fn resize_reports_change() {
        let mut s = surface(4, 4);
        assert!(!s.resize(PixelSize::new(4, 4)));
        assert!(s.resize(PixelSize::new(8, 2)));
        assert_eq!(s.size(), PixelSize::new(8, 2));
        assert!(s.pixel(7, 1).is_some());
    }

    #[test]
    fn circle_outline_leaves_centre() {
        let mut s = surface(21, 21);
        s.stroke_circle(10.5, 10.5, 6.0, 1.0, PackedRgba::WHITE);
        assert_eq!(alpha(&s, 10, 10), 0);
        assert!(alpha(&s, 16, 10) > 128);
    }

    #[test]
    fn rounded_rect_outline() {
        let mut s = surface(20, 20);
        s.stroke_rounded_rect(Rect::new(2.5, 2.5, 15.0, 15.0), 2.0, 1.0, PackedRgba::WHITE);
        assert!(alpha(&s, 10, 2) > 200);
        assert!(alpha(&s, 2, 10) > 200);
        assert_eq!(alpha(&s, 10, 10), 0);
        assert_eq!(alpha(&s, 0, 0), 0);
    }

    #[test]
    fn gradient_fades_to_outer() {
        let mut s = surface(10, 10);
        s.fill(PackedRgba::BLACK);
        let inner = PackedRgba::rgba(255, 255, 255, 200);
        s.fill_radial_gradient(5.0, 5.0, 3.0, inner, inner.with_opacity(0.0));
        let centre = s.pixel(5, 5).unwrap();
        let corner = s.pixel(0, 0).unwrap();
        assert!(centre.r() > 100);
        assert_eq!(corner, PackedRgba::BLACK);
    }

    #[test]
    fn draw_image_maps_source_to_dest() {
        let mut image = Pixmap::new(2, 1).unwrap();
        image.pixels_mut()[0] = PackedRgba::rgb(255, 0, 0).premultiply();
        image.pixels_mut()[1] = PackedRgba::rgb(0, 0, 255).premultiply();
        let mut s = surface(4, 2);
        s.draw_image(&image, Rect::new(1.0, 0.0, 1.0, 1.0), Rect::from_size(4.0, 2.0));
        let left = s.pixel(0, 0).unwrap();
        let right = s.pixel(3, 1).unwrap();
        assert!(left.b() > left.r(), "{left}");
        assert!(right.b() > 250 && right.r() < 5, "{right}");
    }

    #[test]
    fn blit_offsets_and_clips() {
        let mut small = surface(2, 2);
        small.fill(PackedRgba::WHITE);
        let mut big = surface(3, 3);
        big.blit(&small, 2, 2);
        assert_eq!(big.pixel(2, 2), Some(PackedRgba::WHITE));
        assert_eq!(big.pixel(1, 1), Some(PackedRgba::TRANSPARENT));
    }

    #[test]
    fn png_encodes() {
        let mut s = surface(3, 2);
        s.fill(PackedRgba::rgb(26, 26, 26));
        let png = s.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1).0, [26, 26, 26, 255]);
    }
}
