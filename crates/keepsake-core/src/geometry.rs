#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Two coordinate spaces exist:
//!
//! - **Layout pixels** ([`Rect`]): fractional CSS-style pixels produced by the
//!   grid solver. Origin at the top-left of the preview surface.
//! - **Device pixels** ([`PixelSize`]): integer raster dimensions obtained by
//!   multiplying layout pixels by the display scale factor and rounding.

use serde::{Deserialize, Serialize};

/// A rectangle in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width in layout pixels.
    pub width: f64,
    /// Height in layout pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area in square layout pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check if the rectangle has no drawable area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Convert to device pixels. Width and height are rounded, never
    /// truncated, so adjacent regions do not open a one-pixel seam.
    ///
    /// Returns `None` when either rounded dimension is zero.
    pub fn to_device(&self, device_scale: f64) -> Option<PixelSize> {
        if self.is_empty() {
            return None;
        }
        let size = PixelSize::new(
            round_to_u32(self.width * device_scale),
            round_to_u32(self.height * device_scale),
        );
        if size.is_empty() { None } else { Some(size) }
    }

    /// Device-pixel origin of this rectangle (rounded like the extent).
    pub fn device_origin(&self, device_scale: f64) -> (u32, u32) {
        (
            round_to_u32(self.x * device_scale),
            round_to_u32(self.y * device_scale),
        )
    }
}

fn round_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        0
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value.round() as u32
    }
}

/// Integer raster dimensions in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    /// Create a new pixel size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total pixel count.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Width-to-height ratio of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: f64,
    pub height: f64,
}

impl AspectRatio {
    /// Create a new aspect ratio.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Parse a CSS-style `"5/3.2"` ratio.
    pub fn parse(input: &str) -> Option<Self> {
        let (w, h) = input.split_once('/')?;
        let width: f64 = w.trim().parse().ok()?;
        let height: f64 = h.trim().parse().ok()?;
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            Some(Self::new(width, height))
        } else {
            None
        }
    }

    /// Width divided by height.
    #[inline]
    pub fn value(&self) -> f64 {
        self.width / self.height
    }

    /// Strictly wider than tall.
    #[inline]
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Reorder this ratio's sides so it has the same orientation as
    /// `reference`.
    ///
    /// A landscape reference puts the longer side first; anything else puts
    /// the shorter side first.
    pub fn oriented_like(&self, reference: &AspectRatio) -> AspectRatio {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if reference.is_landscape() {
            AspectRatio::new(long, short)
        } else {
            AspectRatio::new(short, long)
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.width, self.height)
    }
}

/// Physical print dimensions in inches, as quoted by a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FrameSize {
    /// Create a frame size. Returns `None` for non-positive dimensions.
    pub fn new(width_in: f64, height_in: f64) -> Option<Self> {
        if width_in > 0.0 && height_in > 0.0 && width_in.is_finite() && height_in.is_finite() {
            Some(Self {
                width_in,
                height_in,
            })
        } else {
            None
        }
    }

    /// Parse a framed product SKU such as `"framed-11x14"`.
    pub fn from_sku(sku: &str) -> Option<Self> {
        let start = sku.find("framed-")? + "framed-".len();
        let rest = &sku[start..];
        let (w, tail) = rest.split_once('x')?;
        let h: String = tail.chars().take_while(char::is_ascii_digit).collect();
        if w.is_empty() || !w.chars().all(|c| c.is_ascii_digit()) || h.is_empty() {
            return None;
        }
        Self::new(w.parse().ok()?, h.parse().ok()?)
    }

    /// The frame's aspect ratio as quoted (unoriented).
    #[inline]
    pub fn aspect(&self) -> AspectRatio {
        AspectRatio::new(self.width_in, self.height_in)
    }
}

/// Host-provided container metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Container width in layout pixels; height follows from the aspect ratio.
    pub width: f64,
    /// Device pixels per layout pixel.
    pub device_scale: f64,
}

impl Viewport {
    /// Create a viewport. A non-positive scale falls back to 1.0.
    pub fn new(width: f64, device_scale: f64) -> Self {
        let device_scale = if device_scale > 0.0 && device_scale.is_finite() {
            device_scale
        } else {
            1.0
        };
        Self {
            width: width.max(0.0),
            device_scale,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 1.0)
    }
}
