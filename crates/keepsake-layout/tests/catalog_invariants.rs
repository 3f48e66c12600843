//! Catalog and grid invariants.
//!
//! 1. Every layout's area grid matches its track counts.
//! 2. Every distinct label maps to exactly one role.
//! 3. Applying the active layout twice yields the same regions and boxes.
//! 4. Region boxes tile the surface without gaps or overlap.

use keepsake_core::geometry::Viewport;
use keepsake_core::region::{PanelMode, RegionRole};
use keepsake_layout::{GridController, LayoutCatalog};
use proptest::prelude::*;

#[test]
fn grid_dimensions_match_tracks() {
    for layout in LayoutCatalog::builtin().all() {
        assert_eq!(layout.areas.len(), layout.rows.len(), "{}", layout.id);
        for row in layout.areas {
            assert_eq!(row.len(), layout.columns.len(), "{}", layout.id);
        }
    }
}

#[test]
fn every_label_has_one_role() {
    for layout in LayoutCatalog::builtin().all() {
        for name in layout.area_names() {
            let photo = RegionRole::for_area(name, PanelMode::Photo);
            assert!(photo.is_some(), "{} in {}", name, layout.id);
        }
    }
}

fn layout_ids() -> Vec<&'static str> {
    LayoutCatalog::builtin().all().map(|layout| layout.id).collect()
}

proptest! {
    #[test]
    fn apply_layout_is_idempotent(
        id in prop::sample::select(layout_ids()),
        width in 120.0f64..1800.0,
        scale in prop::sample::select(vec![1.0f64, 1.5, 2.0, 3.0]),
    ) {
        let (mut grid, _) =
            GridController::new(LayoutCatalog::builtin(), id, Viewport::new(width, scale)).unwrap();
        let first = grid.measure_regions();
        let changes = grid.apply_layout(id).unwrap();
        prop_assert!(changes.is_empty());
        let second = grid.measure_regions();
        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(&a.id, &b.id);
            prop_assert_eq!(a.layout_box, b.layout_box);
            prop_assert_eq!(a.device_size, b.device_size);
            prop_assert!(!b.resized);
        }
    }

    #[test]
    fn boxes_tile_the_surface(
        id in prop::sample::select(layout_ids()),
        width in 120.0f64..1800.0,
    ) {
        let (grid, _) =
            GridController::new(LayoutCatalog::builtin(), id, Viewport::new(width, 1.0)).unwrap();
        let surface = grid.surface_rect();
        let covered: f64 = grid
            .live_regions()
            .filter_map(|(region, _)| grid.region_box(region.as_str()))
            .map(|rect| rect.area())
            .sum();
        prop_assert!((covered - surface.area()).abs() < 1e-6 * surface.area().max(1.0));
    }
}
