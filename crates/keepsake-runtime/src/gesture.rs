#![forbid(unsafe_code)]

//! Crop gestures on a photo region.
//!
//! Pointer drags pan, wheel notches zoom, two-finger pinches scale the zoom
//! captured when the pinch began. Every gesture produces a crop that the
//! renderer stores through its clamping setter.
//!
//! Pan sensitivity is `1.5 / zoom` of the region per region-size of pointer
//! travel: at zoom 1 dragging across the whole region moves the focal point
//! by 1.5, and zoomed-in photos move proportionally slower.

use keepsake_render::PhotoCrop;

const PAN_SENSITIVITY: f64 = 1.5;
const WHEEL_STEP: f64 = 0.1;

/// Pointer input on a photo region, in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropEvent {
    /// Mouse-down or single touch-start.
    Press { x: f64, y: f64 },
    /// Pointer moved while pressed.
    Drag { x: f64, y: f64 },
    /// Mouse-up, touch-end, or cancel.
    Release,
    /// Scroll wheel; positive `delta_y` scrolls down and zooms out.
    Wheel { delta_y: f64 },
    /// Second finger landed; `distance` is between the two touches.
    PinchStart { distance: f64 },
    /// Two-finger move.
    Pinch { distance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Pressed {
        x: f64,
        y: f64,
        pan_x: f64,
        pan_y: f64,
        panning: bool,
    },
    Pinching {
        distance: f64,
        zoom: f64,
    },
}

/// Gesture state of one photo region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropGesture {
    state: GestureState,
    threshold: f64,
}

impl Default for CropGesture {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl CropGesture {
    /// A gesture that ignores press travel shorter than `threshold` pixels.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            state: GestureState::Idle,
            threshold: if threshold.is_finite() { threshold.max(0.0) } else { 0.0 },
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// Feed one event. Returns the crop to store, if the event changes it.
    ///
    /// `current` is the region's crop now; `region_size` is its layout box
    /// in layout pixels.
    pub fn apply(&mut self, event: CropEvent, current: PhotoCrop, region_size: (f64, f64)) -> Option<PhotoCrop> {
        match event {
            CropEvent::Press { x, y } => {
                self.state = GestureState::Pressed {
                    x,
                    y,
                    pan_x: current.pan_x,
                    pan_y: current.pan_y,
                    panning: false,
                };
                None
            }
            CropEvent::Drag { x, y } => {
                let GestureState::Pressed {
                    x: start_x,
                    y: start_y,
                    pan_x,
                    pan_y,
                    panning,
                } = &mut self.state
                else {
                    return None;
                };
                let (dx, dy) = (x - *start_x, y - *start_y);
                if !*panning && dx.hypot(dy) < self.threshold {
                    return None;
                }
                *panning = true;
                let (width, height) = region_size;
                if !(width > 0.0 && height > 0.0) {
                    return None;
                }
                let sensitivity = PAN_SENSITIVITY / current.zoom;
                Some(PhotoCrop::clamped(
                    current.zoom,
                    *pan_x - dx / width * sensitivity,
                    *pan_y - dy / height * sensitivity,
                ))
            }
            CropEvent::Release => {
                self.state = GestureState::Idle;
                None
            }
            CropEvent::Wheel { delta_y } => {
                if delta_y == 0.0 || delta_y.is_nan() {
                    return None;
                }
                let step = if delta_y > 0.0 { -WHEEL_STEP } else { WHEEL_STEP };
                Some(PhotoCrop::clamped(current.zoom + step, current.pan_x, current.pan_y))
            }
            CropEvent::PinchStart { distance } => {
                self.state = GestureState::Pinching {
                    distance,
                    zoom: current.zoom,
                };
                None
            }
            CropEvent::Pinch { distance } => {
                let GestureState::Pinching { distance: start, zoom } = self.state else {
                    return None;
                };
                if !(start > 0.0) || !distance.is_finite() {
                    return None;
                }
                Some(PhotoCrop::clamped(zoom * distance / start, current.pan_x, current.pan_y))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGION: (f64, f64) = (400.0, 300.0);

    #[test]
    fn drag_pans_against_pointer() {
        let mut gesture = CropGesture::default();
        let crop = PhotoCrop::default();
        assert_eq!(gesture.apply(CropEvent::Press { x: 100.0, y: 100.0 }, crop, REGION), None);
        let moved = gesture
            .apply(CropEvent::Drag { x: 140.0, y: 70.0 }, crop, REGION)
            .unwrap();
        // 40px of 400 at zoom 1 moves pan by 0.1 * 1.5.
        assert!((moved.pan_x - 0.35).abs() < 1e-12);
        assert!((moved.pan_y - 0.65).abs() < 1e-12);
        assert_eq!(moved.zoom, 1.0);
    }

    #[test]
    fn drag_is_measured_from_press() {
        let mut gesture = CropGesture::default();
        let crop = PhotoCrop::clamped(2.0, 0.5, 0.5);
        gesture.apply(CropEvent::Press { x: 0.0, y: 0.0 }, crop, REGION);
        let first = gesture.apply(CropEvent::Drag { x: 40.0, y: 0.0 }, crop, REGION).unwrap();
        let second = gesture.apply(CropEvent::Drag { x: 40.0, y: 0.0 }, first, REGION).unwrap();
        assert_eq!(first, second);
        assert!((first.pan_x - (0.5 - 0.1 * 0.75)).abs() < 1e-12);
    }

    #[test]
    fn drag_without_press_is_ignored() {
        let mut gesture = CropGesture::default();
        assert_eq!(
            gesture.apply(CropEvent::Drag { x: 10.0, y: 10.0 }, PhotoCrop::default(), REGION),
            None
        );
        gesture.apply(CropEvent::Press { x: 0.0, y: 0.0 }, PhotoCrop::default(), REGION);
        gesture.apply(CropEvent::Release, PhotoCrop::default(), REGION);
        assert!(!gesture.is_active());
        assert_eq!(
            gesture.apply(CropEvent::Drag { x: 10.0, y: 10.0 }, PhotoCrop::default(), REGION),
            None
        );
    }

    #[test]
    fn threshold_holds_small_jitter() {
        let mut gesture = CropGesture::new(5.0);
        let crop = PhotoCrop::default();
        gesture.apply(CropEvent::Press { x: 0.0, y: 0.0 }, crop, REGION);
        assert_eq!(gesture.apply(CropEvent::Drag { x: 3.0, y: 0.0 }, crop, REGION), None);
        assert!(gesture.apply(CropEvent::Drag { x: 6.0, y: 0.0 }, crop, REGION).is_some());
        // Once panning, small moves count.
        assert!(gesture.apply(CropEvent::Drag { x: 1.0, y: 0.0 }, crop, REGION).is_some());
    }

    #[test]
    fn wheel_steps_and_clamps() {
        let mut gesture = CropGesture::default();
        let crop = PhotoCrop::clamped(1.0, 0.3, 0.4);
        let out = gesture.apply(CropEvent::Wheel { delta_y: 120.0 }, crop, REGION).unwrap();
        assert_eq!(out, crop);
        let zoomed = gesture.apply(CropEvent::Wheel { delta_y: -3.0 }, crop, REGION).unwrap();
        assert!((zoomed.zoom - 1.1).abs() < 1e-12);
        assert_eq!((zoomed.pan_x, zoomed.pan_y), (0.3, 0.4));
    }

    #[test]
    fn pinch_scales_starting_zoom() {
        let mut gesture = CropGesture::default();
        let start = PhotoCrop::clamped(1.5, 0.5, 0.5);
        gesture.apply(CropEvent::PinchStart { distance: 100.0 }, start, REGION);
        let later = PhotoCrop::clamped(2.4, 0.5, 0.5);
        let out = gesture.apply(CropEvent::Pinch { distance: 150.0 }, later, REGION).unwrap();
        assert!((out.zoom - 2.25).abs() < 1e-12);
        let out = gesture.apply(CropEvent::Pinch { distance: 400.0 }, later, REGION).unwrap();
        assert_eq!(out.zoom, 3.0);
    }
}
