#![forbid(unsafe_code)]

//! Per-region photo state and cover-fit math.
//!
//! Each photo region has a crop (zoom and a fractional pan) and, once a
//! decode succeeds, a bitmap. The cover rectangle is the part of the
//! bitmap that fills a destination box with no letterboxing.
//!
//! # Decode lifecycle
//!
//! ```text
//! begin_decode -> DecodeTicket --decode()--> DecodedPhoto --finish_decode--> Applied
//!                                                                         \-> Superseded
//!                                                                         \-> Failed
//! ```
//!
//! `decode()` does the expensive work and can run on any thread. Every
//! `begin_decode` bumps the region's generation; a result whose generation
//! is no longer current is discarded when it comes back.
//!
//! # Invariants
//!
//! 1. `zoom` is always in `[1, 3]`; `pan_x` and `pan_y` in `[0, 1]`.
//! 2. The cover rectangle lies inside the bitmap's natural bounds.
//! 3. A failed decode leaves the previous state untouched.
//! 4. Replacing a bitmap keeps the crop the user already chose.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use keepsake_core::geometry::Rect;
use keepsake_core::region::RegionId;
use keepsake_core::{PreviewError, PreviewResult};
use serde::{Deserialize, Serialize};
use tiny_skia::{IntSize, Pixmap};

use crate::color::PackedRgba;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

/// Zoom and fractional pan of one photo region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCrop {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for PhotoCrop {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.5,
            pan_y: 0.5,
        }
    }
}

impl PhotoCrop {
    /// A crop with every component clamped into range.
    ///
    /// Non-finite components fall back to the centred, unzoomed default.
    #[must_use]
    pub fn clamped(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        let fallback = Self::default();
        let clamp = |value: f64, lo: f64, hi: f64, default: f64| {
            if value.is_finite() {
                value.clamp(lo, hi)
            } else {
                default
            }
        };
        Self {
            zoom: clamp(zoom, MIN_ZOOM, MAX_ZOOM, fallback.zoom),
            pan_x: clamp(pan_x, 0.0, 1.0, fallback.pan_x),
            pan_y: clamp(pan_y, 0.0, 1.0, fallback.pan_y),
        }
    }

    /// Centred on a focal point at zoom 1.
    #[must_use]
    pub fn focused(point: FocalPoint) -> Self {
        Self::clamped(1.0, point.x, point.y)
    }
}

/// Suggested pan position from image analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

impl FocalPoint {
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    /// Parse a CSS-style `"X% Y%"` position into fractions.
    ///
    /// Values are clamped to `[0, 1]`; anything else is `None`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split_whitespace();
        let x = parse_percent(parts.next()?)?;
        let y = parse_percent(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

fn parse_percent(token: &str) -> Option<f64> {
    let value: f64 = token.strip_suffix('%')?.parse().ok()?;
    value.is_finite().then(|| (value / 100.0).clamp(0.0, 1.0))
}

impl fmt::Display for FocalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% {}%", self.x * 100.0, self.y * 100.0)
    }
}

/// Source rectangle for a cover-fit draw of a `natural` sized bitmap into a
/// `dest_width` x `dest_height` box.
///
/// The rectangle has the box's aspect ratio, shrinks by `zoom`, and sits at
/// `pan` across the slack left over on each axis.
#[must_use]
pub fn cover_rect(natural: (u32, u32), crop: &PhotoCrop, dest_width: f64, dest_height: f64) -> Rect {
    let natural_w = f64::from(natural.0);
    let natural_h = f64::from(natural.1);
    if natural_w <= 0.0 || natural_h <= 0.0 || !(dest_width > 0.0) || !(dest_height > 0.0) {
        return Rect::from_size(natural_w, natural_h);
    }
    let crop = PhotoCrop::clamped(crop.zoom, crop.pan_x, crop.pan_y);
    let box_aspect = dest_width / dest_height;
    let (mut width, mut height) = if natural_w / natural_h > box_aspect {
        (natural_h * box_aspect, natural_h)
    } else {
        (natural_w, natural_w / box_aspect)
    };
    width /= crop.zoom;
    height /= crop.zoom;
    Rect::new(
        (natural_w - width) * crop.pan_x,
        (natural_h - height) * crop.pan_y,
        width,
        height,
    )
}

/// Stored state of one photo region.
#[derive(Debug, Clone, Default)]
pub struct PhotoState {
    pub image: Option<Arc<Pixmap>>,
    pub crop: PhotoCrop,
    pub focal_hint: Option<FocalPoint>,
}

impl PhotoState {
    /// Natural bitmap size, if a bitmap is present.
    #[must_use]
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|image| (image.width(), image.height()))
    }
}

/// A decode waiting to run.
#[derive(Debug, Clone)]
pub struct DecodeTicket {
    region: RegionId,
    generation: u64,
    bytes: Vec<u8>,
    focal_hint: Option<FocalPoint>,
}

impl DecodeTicket {
    #[must_use]
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Decode the bytes. Pure; safe to run off the render thread.
    #[must_use]
    pub fn decode(self) -> DecodedPhoto {
        let result = decode_image(&self.bytes, &self.region);
        DecodedPhoto {
            region: self.region,
            generation: self.generation,
            focal_hint: self.focal_hint,
            result,
        }
    }
}

/// A finished decode, ready to hand back to its [`ImageTransform`].
#[derive(Debug, Clone)]
pub struct DecodedPhoto {
    region: RegionId,
    generation: u64,
    focal_hint: Option<FocalPoint>,
    result: PreviewResult<Arc<Pixmap>>,
}

/// What [`ImageTransform::finish_decode`] did with a result.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Applied,
    /// A newer upload for the same region started after this one.
    Superseded,
    Failed(PreviewError),
}

fn decode_image(bytes: &[u8], region: &RegionId) -> PreviewResult<Arc<Pixmap>> {
    let failed = |reason: String| PreviewError::DecodeFailed {
        region: region.to_string(),
        reason,
    };
    let decoded = image::load_from_memory(bytes).map_err(|err| failed(err.to_string()))?;
    let rgba = decoded.to_rgba8();
    let size = IntSize::from_wh(rgba.width(), rgba.height())
        .ok_or_else(|| failed("image has no pixels".to_owned()))?;
    let premultiplied = rgba
        .pixels()
        .flat_map(|pixel| {
            let [r, g, b, a] = pixel.0;
            let p = PackedRgba::rgba(r, g, b, a).premultiply();
            [p.red(), p.green(), p.blue(), p.alpha()]
        })
        .collect();
    let pixmap = Pixmap::from_vec(premultiplied, size)
        .ok_or_else(|| failed("image is too large".to_owned()))?;
    Ok(Arc::new(pixmap))
}

/// Photo state for every region, keyed by region id.
#[derive(Debug, Clone, Default)]
pub struct ImageTransform {
    photos: BTreeMap<RegionId, PhotoState>,
    expected: BTreeMap<RegionId, u64>,
    next_generation: u64,
}

impl ImageTransform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start replacing the bitmap of `region`.
    ///
    /// Any decode already in flight for the region becomes stale.
    pub fn begin_decode(
        &mut self,
        region: RegionId,
        bytes: Vec<u8>,
        focal_hint: Option<FocalPoint>,
    ) -> DecodeTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        if self.expected.insert(region.clone(), generation).is_some() {
            tracing::debug!(region = %region, "earlier decode superseded");
        }
        DecodeTicket {
            region,
            generation,
            bytes,
            focal_hint,
        }
    }

    /// Apply a finished decode if it is still the one the region expects.
    pub fn finish_decode(&mut self, decoded: DecodedPhoto) -> DecodeOutcome {
        let DecodedPhoto {
            region,
            generation,
            focal_hint,
            result,
        } = decoded;
        if self.expected.get(&region) != Some(&generation) {
            tracing::debug!(region = %region, generation, "stale decode discarded");
            return DecodeOutcome::Superseded;
        }
        self.expected.remove(&region);
        match result {
            Ok(image) => {
                let (width, height) = (image.width(), image.height());
                match self.photos.get_mut(&region) {
                    Some(state) => {
                        state.image = Some(image);
                        state.focal_hint = focal_hint.or(state.focal_hint);
                    }
                    None => {
                        let crop = focal_hint.map(PhotoCrop::focused).unwrap_or_default();
                        self.photos.insert(
                            region.clone(),
                            PhotoState {
                                image: Some(image),
                                crop,
                                focal_hint,
                            },
                        );
                    }
                }
                tracing::debug!(region = %region, width, height, "photo decoded");
                DecodeOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(region = %region, error = %err, "photo decode failed");
                DecodeOutcome::Failed(err)
            }
        }
    }

    /// Decode synchronously and apply.
    pub fn set_image(
        &mut self,
        region: RegionId,
        bytes: Vec<u8>,
        focal_hint: Option<FocalPoint>,
    ) -> PreviewResult<()> {
        let ticket = self.begin_decode(region, bytes, focal_hint);
        match self.finish_decode(ticket.decode()) {
            DecodeOutcome::Failed(err) => Err(err),
            DecodeOutcome::Applied | DecodeOutcome::Superseded => Ok(()),
        }
    }

    /// Whether a decode is outstanding for `region`.
    #[must_use]
    pub fn is_loading(&self, region: &str) -> bool {
        self.expected.contains_key(region)
    }

    /// Set the crop of `region`, clamping out-of-range values.
    ///
    /// A region without a bitmap yet still records the crop, so a restored
    /// session can set crops before its photos arrive.
    pub fn set_crop(&mut self, region: RegionId, zoom: f64, pan_x: f64, pan_y: f64) -> PhotoCrop {
        let crop = PhotoCrop::clamped(zoom, pan_x, pan_y);
        self.photos.entry(region).or_default().crop = crop;
        crop
    }

    /// Replace every stored crop with `crops`.
    ///
    /// Bitmaps are kept. A region with a bitmap but no entry in `crops`
    /// returns to the crop a first upload would give it; regions with
    /// neither are forgotten.
    pub fn replace_crops<I>(&mut self, crops: I)
    where
        I: IntoIterator<Item = (RegionId, PhotoCrop)>,
    {
        self.photos.retain(|_, state| state.image.is_some());
        for state in self.photos.values_mut() {
            state.crop = state.focal_hint.map(PhotoCrop::focused).unwrap_or_default();
        }
        for (region, crop) in crops {
            self.set_crop(region, crop.zoom, crop.pan_x, crop.pan_y);
        }
    }

    /// Copy of the crop for `region`.
    #[must_use]
    pub fn crop(&self, region: &str) -> Option<PhotoCrop> {
        self.photos.get(region).map(|state| state.crop)
    }

    /// Every stored crop, keyed by region id.
    #[must_use]
    pub fn crops(&self) -> BTreeMap<RegionId, PhotoCrop> {
        self.photos
            .iter()
            .map(|(id, state)| (id.clone(), state.crop))
            .collect()
    }

    /// Stored state for `region`.
    #[must_use]
    pub fn state(&self, region: &str) -> Option<&PhotoState> {
        self.photos.get(region)
    }

    /// Cover rectangle of the bitmap in `region` for a destination box.
    #[must_use]
    pub fn cover_rect(&self, region: &str, dest_width: f64, dest_height: f64) -> Option<Rect> {
        let state = self.photos.get(region)?;
        let natural = state.natural_size()?;
        Some(cover_rect(natural, &state.crop, dest_width, dest_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        png_of(width, height, [120, 80, 40, 255])
    }

    fn png_of(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn crop_is_clamped_not_rejected() {
        let crop = PhotoCrop::clamped(7.0, -0.2, 1.4);
        assert_eq!(
            crop,
            PhotoCrop {
                zoom: 3.0,
                pan_x: 0.0,
                pan_y: 1.0
            }
        );
        assert_eq!(PhotoCrop::clamped(0.2, f64::NAN, 0.3).zoom, 1.0);
        assert_eq!(PhotoCrop::clamped(0.2, f64::NAN, 0.3).pan_x, 0.5);
    }

    #[test]
    fn focal_hints_parse() {
        assert_eq!(FocalPoint::parse("30% 40%"), Some(FocalPoint { x: 0.3, y: 0.4 }));
        assert_eq!(FocalPoint::parse(" 120%   -5% "), Some(FocalPoint { x: 1.0, y: 0.0 }));
        assert_eq!(FocalPoint::parse("center"), None);
        assert_eq!(FocalPoint::parse("50% 50% 50%"), None);
        assert_eq!(FocalPoint::CENTER.to_string(), "50% 50%");
    }

    #[test]
    fn cover_rect_matches_box_aspect() {
        let rect = cover_rect((1600, 900), &PhotoCrop::default(), 400.0, 400.0);
        assert_eq!(rect, Rect::new(350.0, 0.0, 900.0, 900.0));
        let rect = cover_rect((900, 1600), &PhotoCrop::default(), 400.0, 200.0);
        assert_eq!(rect, Rect::new(0.0, 575.0, 900.0, 450.0));
    }

    #[test]
    fn first_decode_uses_focal_hint() {
        let mut photos = ImageTransform::new();
        photos
            .set_image(RegionId::PHOTO.into(), png(8, 4), FocalPoint::parse("25% 75%"))
            .unwrap();
        let crop = photos.crop("photo").unwrap();
        assert_eq!((crop.zoom, crop.pan_x, crop.pan_y), (1.0, 0.25, 0.75));
        assert_eq!(photos.state("photo").unwrap().natural_size(), Some((8, 4)));
    }

    #[test]
    fn decoded_pixels_are_premultiplied() {
        let mut photos = ImageTransform::new();
        photos
            .set_image(RegionId::PHOTO.into(), png_of(2, 2, [200, 100, 0, 128]), None)
            .unwrap();
        let image = photos.state("photo").unwrap().image.clone().unwrap();
        let pixel = image.pixel(1, 1).unwrap();
        assert_eq!(pixel.alpha(), 128);
        assert_eq!(pixel.red(), 100);
        assert_eq!(pixel.green(), 50);
    }

    #[test]
    fn reupload_keeps_user_crop() {
        let mut photos = ImageTransform::new();
        let id = RegionId::new("photo");
        photos.set_image(id.clone(), png(8, 8), None).unwrap();
        photos.set_crop(id.clone(), 2.0, 0.1, 0.9);
        photos.set_image(id.clone(), png(16, 4), FocalPoint::parse("50% 50%")).unwrap();
        let crop = photos.crop("photo").unwrap();
        assert_eq!((crop.zoom, crop.pan_x, crop.pan_y), (2.0, 0.1, 0.9));
        assert_eq!(photos.state("photo").unwrap().natural_size(), Some((16, 4)));
    }

    #[test]
    fn failed_decode_keeps_previous_state() {
        let mut photos = ImageTransform::new();
        let id = RegionId::new("photo");
        photos.set_image(id.clone(), png(4, 4), None).unwrap();
        let err = photos.set_image(id.clone(), b"not an image".to_vec(), None).unwrap_err();
        assert!(matches!(err, PreviewError::DecodeFailed { .. }));
        assert_eq!(photos.state("photo").unwrap().natural_size(), Some((4, 4)));
        assert!(!photos.is_loading("photo"));
    }

    #[test]
    fn superseded_decode_is_discarded() {
        let mut photos = ImageTransform::new();
        let id = RegionId::new("panel2");
        let older = photos.begin_decode(id.clone(), png(2, 2), None);
        let newer = photos.begin_decode(id.clone(), png(6, 3), None);
        assert_eq!(photos.finish_decode(newer.decode()), DecodeOutcome::Applied);
        assert_eq!(photos.finish_decode(older.decode()), DecodeOutcome::Superseded);
        assert_eq!(photos.state("panel2").unwrap().natural_size(), Some((6, 3)));
    }

    #[test]
    fn replacing_crops_keeps_bitmaps() {
        let mut photos = ImageTransform::new();
        photos
            .set_image(RegionId::new("photo"), png(8, 8), FocalPoint::parse("20% 80%"))
            .unwrap();
        photos.set_crop(RegionId::new("photo"), 2.5, 0.9, 0.1);
        photos.set_crop(RegionId::new("panel2"), 1.5, 0.3, 0.3);

        photos.replace_crops([]);
        let crop = photos.crop("photo").unwrap();
        assert_eq!((crop.zoom, crop.pan_x, crop.pan_y), (1.0, 0.2, 0.8));
        assert_eq!(photos.state("photo").unwrap().natural_size(), Some((8, 8)));
        assert_eq!(photos.crop("panel2"), None);

        photos.replace_crops([(RegionId::new("panel2"), PhotoCrop::clamped(9.0, 0.5, 0.5))]);
        assert_eq!(photos.crop("panel2").unwrap().zoom, 3.0);
        assert_eq!(photos.crops().len(), 2);
    }

    #[test]
    fn crop_before_image_is_remembered() {
        let mut photos = ImageTransform::new();
        photos.set_crop(RegionId::new("photo"), 1.5, 0.2, 0.3);
        assert!(photos.cover_rect("photo", 10.0, 10.0).is_none());
        photos.set_image(RegionId::new("photo"), png(10, 10), None).unwrap();
        assert_eq!(photos.crop("photo").unwrap().zoom, 1.5);
    }
}
