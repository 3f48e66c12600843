//! Property-based invariant tests for layout → device conversion.
//!
//! 1. Rounded device size is within half a pixel of the exact product.
//! 2. A non-empty device size is never produced for an empty rect.
//! 3. Orientation reordering preserves both side lengths.

use keepsake_core::geometry::{AspectRatio, Rect};
use proptest::prelude::*;

proptest! {
    #[test]
    fn device_size_within_half_pixel(
        w in 0.5f64..4000.0,
        h in 0.5f64..4000.0,
        scale in prop::sample::select(vec![1.0f64, 1.25, 1.5, 2.0, 3.0]),
    ) {
        let rect = Rect::new(0.0, 0.0, w, h);
        let size = rect.to_device(scale).expect("non-empty rect has a size");
        prop_assert!((size.width as f64 - w * scale).abs() <= 0.5 + 1e-9);
        prop_assert!((size.height as f64 - h * scale).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn empty_rects_have_no_device_size(w in 0.0f64..2000.0, scale in 0.5f64..4.0) {
        prop_assert!(Rect::new(0.0, 0.0, w, 0.0).to_device(scale).is_none());
        prop_assert!(Rect::new(0.0, 0.0, 0.0, w).to_device(scale).is_none());
    }

    #[test]
    fn orientation_keeps_sides(a in 1.0f64..60.0, b in 1.0f64..60.0, landscape in any::<bool>()) {
        let reference = if landscape {
            AspectRatio::new(5.0, 3.2)
        } else {
            AspectRatio::new(4.0, 5.0)
        };
        let oriented = AspectRatio::new(a, b).oriented_like(&reference);
        prop_assert_eq!(oriented.width.max(oriented.height), a.max(b));
        prop_assert_eq!(oriented.width.min(oriented.height), a.min(b));
        if landscape {
            prop_assert!(oriented.width >= oriented.height);
        } else {
            prop_assert!(oriented.width <= oriented.height);
        }
    }
}
