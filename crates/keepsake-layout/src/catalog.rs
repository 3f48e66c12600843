#![forbid(unsafe_code)]

//! Static catalog of named grid layouts.
//!
//! Each layout declares fractional column/row tracks, a row-major grid of
//! area names (repeating a name spans that region across cells), and the
//! default aspect ratio of the whole preview surface.
//!
//! # Invariants
//!
//! 1. `areas.len() == rows.len()` and every row has `columns.len()` labels.
//! 2. Every label maps to exactly one [`RegionRole`].
//! 3. Every label's cells form a filled rectangle.
//! 4. The number of distinct labels equals `region_count`.

use keepsake_core::geometry::AspectRatio;
use keepsake_core::region::{PanelMode, RegionRole};
use keepsake_core::{PreviewError, PreviewResult};

use crate::tracks::TrackRatios;

/// Layout used when the host has no preference.
pub const DEFAULT_LAYOUT_ID: &str = "side-by-side";

/// One immutable catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDefinition {
    pub id: &'static str,
    pub region_count: u8,
    pub columns: &'static [f64],
    pub rows: &'static [f64],
    pub areas: &'static [&'static [&'static str]],
    pub aspect: AspectRatio,
}

/// Inclusive-exclusive cell span of one area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub col_start: usize,
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

/// A structural problem found by [`LayoutDefinition::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    RowCountMismatch { rows: usize, area_rows: usize },
    ColumnCountMismatch { row: usize, columns: usize, labels: usize },
    UnknownRole { label: &'static str },
    NotRectangular { label: &'static str },
    RegionCountMismatch { declared: u8, found: usize },
}

impl LayoutDefinition {
    /// Distinct area names in first-appearance (row-major) order.
    #[must_use]
    pub fn area_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for row in self.areas {
            for &name in *row {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Whether the layout contains an area with this name.
    #[must_use]
    pub fn has_area(&self, name: &str) -> bool {
        self.areas.iter().any(|row| row.contains(&name))
    }

    /// Bounding cell span of an area, or `None` if the name is absent.
    #[must_use]
    pub fn area_span(&self, name: &str) -> Option<CellSpan> {
        let mut span: Option<CellSpan> = None;
        for (r, row) in self.areas.iter().enumerate() {
            for (c, &label) in row.iter().enumerate() {
                if label != name {
                    continue;
                }
                span = Some(match span {
                    None => CellSpan {
                        col_start: c,
                        col_end: c + 1,
                        row_start: r,
                        row_end: r + 1,
                    },
                    Some(s) => CellSpan {
                        col_start: s.col_start.min(c),
                        col_end: s.col_end.max(c + 1),
                        row_start: s.row_start.min(r),
                        row_end: s.row_end.max(r + 1),
                    },
                });
            }
        }
        span
    }

    /// The catalog's own track weights.
    #[must_use]
    pub fn default_tracks(&self) -> TrackRatios {
        TrackRatios::new(self.columns.to_vec(), self.rows.to_vec())
    }

    /// Check the structural invariants listed in the module docs.
    #[must_use]
    pub fn validate(&self) -> Vec<LayoutIssue> {
        let mut issues = Vec::new();
        if self.areas.len() != self.rows.len() {
            issues.push(LayoutIssue::RowCountMismatch {
                rows: self.rows.len(),
                area_rows: self.areas.len(),
            });
        }
        for (r, row) in self.areas.iter().enumerate() {
            if row.len() != self.columns.len() {
                issues.push(LayoutIssue::ColumnCountMismatch {
                    row: r,
                    columns: self.columns.len(),
                    labels: row.len(),
                });
            }
        }
        let names = self.area_names();
        for &label in &names {
            if RegionRole::for_area(label, PanelMode::Photo).is_none() {
                issues.push(LayoutIssue::UnknownRole { label });
            }
            if let Some(span) = self.area_span(label) {
                let filled = (span.row_start..span.row_end).all(|r| {
                    (span.col_start..span.col_end)
                        .all(|c| self.areas.get(r).and_then(|row| row.get(c)) == Some(&label))
                });
                if !filled {
                    issues.push(LayoutIssue::NotRectangular { label });
                }
            }
        }
        if names.len() != usize::from(self.region_count) {
            issues.push(LayoutIssue::RegionCountMismatch {
                declared: self.region_count,
                found: names.len(),
            });
        }
        issues
    }
}

static LAYOUTS: [LayoutDefinition; 6] = [
    LayoutDefinition {
        id: "side-by-side",
        region_count: 2,
        columns: &[1.0, 1.0],
        rows: &[1.0],
        areas: &[&["photo", "tribute"]],
        aspect: AspectRatio::new(5.0, 3.2),
    },
    LayoutDefinition {
        id: "stacked",
        region_count: 2,
        columns: &[1.0],
        rows: &[1.0, 1.0],
        areas: &[&["photo"], &["tribute"]],
        aspect: AspectRatio::new(4.0, 5.0),
    },
    LayoutDefinition {
        id: "hero-left",
        region_count: 3,
        columns: &[1.15, 1.0],
        rows: &[1.0, 1.0],
        areas: &[&["photo", "panel2"], &["photo", "tribute"]],
        aspect: AspectRatio::new(5.0, 3.8),
    },
    LayoutDefinition {
        id: "hero-top",
        region_count: 3,
        columns: &[1.0, 1.0],
        rows: &[1.3, 1.0],
        areas: &[&["photo", "photo"], &["panel2", "tribute"]],
        aspect: AspectRatio::new(4.0, 5.0),
    },
    LayoutDefinition {
        id: "photos-left",
        region_count: 3,
        columns: &[1.0, 1.15],
        rows: &[1.0, 1.0],
        areas: &[&["photo", "tribute"], &["panel2", "tribute"]],
        aspect: AspectRatio::new(5.0, 3.8),
    },
    LayoutDefinition {
        id: "tribute-top",
        region_count: 3,
        columns: &[1.0, 1.0],
        rows: &[1.0, 1.3],
        areas: &[&["tribute", "tribute"], &["photo", "panel2"]],
        aspect: AspectRatio::new(4.0, 5.0),
    },
];

/// Read-only lookup over a table of layouts.
#[derive(Debug, Clone, Copy)]
pub struct LayoutCatalog {
    layouts: &'static [LayoutDefinition],
}

impl Default for LayoutCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LayoutCatalog {
    /// The product's built-in layouts.
    #[must_use]
    pub fn builtin() -> Self {
        Self { layouts: &LAYOUTS }
    }

    /// Look up a layout by id.
    pub fn get(&self, id: &str) -> PreviewResult<&'static LayoutDefinition> {
        self.layouts
            .iter()
            .find(|layout| layout.id == id)
            .ok_or_else(|| PreviewError::UnknownLayout { id: id.to_owned() })
    }

    /// Layouts with exactly `region_count` regions, in catalog order.
    pub fn list_available(
        &self,
        region_count: u8,
    ) -> impl Iterator<Item = &'static LayoutDefinition> + use<> {
        let layouts = self.layouts;
        layouts
            .iter()
            .filter(move |layout| layout.region_count == region_count)
    }

    /// Every layout in catalog order.
    pub fn all(&self) -> impl Iterator<Item = &'static LayoutDefinition> + use<> {
        let layouts = self.layouts;
        layouts.iter()
    }

    /// The 3-region counterpart used when the host adds a second photo.
    ///
    /// Layouts that already have three regions map to themselves.
    pub fn with_third_panel(&self, id: &str) -> PreviewResult<&'static LayoutDefinition> {
        let current = self.get(id)?;
        if current.region_count >= 3 {
            return Ok(current);
        }
        self.get(match id {
            "stacked" => "hero-top",
            _ => "hero-left",
        })
    }

    /// The 2-region counterpart used when the host removes the third panel.
    pub fn without_third_panel(&self, id: &str) -> PreviewResult<&'static LayoutDefinition> {
        let current = self.get(id)?;
        if current.region_count <= 2 {
            return Ok(current);
        }
        self.get(match id {
            "hero-top" | "tribute-top" => "stacked",
            _ => DEFAULT_LAYOUT_ID,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layouts_are_well_formed() {
        for layout in LayoutCatalog::builtin().all() {
            assert_eq!(layout.validate(), Vec::new(), "layout {}", layout.id);
        }
    }

    #[test]
    fn unknown_id_is_reported() {
        let err = LayoutCatalog::builtin().get("mosaic").unwrap_err();
        assert_eq!(
            err,
            PreviewError::UnknownLayout {
                id: "mosaic".into()
            }
        );
    }

    #[test]
    fn list_filters_by_region_count() {
        let catalog = LayoutCatalog::builtin();
        let two: Vec<_> = catalog.list_available(2).map(|l| l.id).collect();
        assert_eq!(two, vec!["side-by-side", "stacked"]);
        let three: Vec<_> = catalog.list_available(3).map(|l| l.id).collect();
        assert_eq!(
            three,
            vec!["hero-left", "hero-top", "photos-left", "tribute-top"]
        );
        assert_eq!(catalog.list_available(4).count(), 0);
    }

    #[test]
    fn spans_cover_repeated_labels() {
        let layout = LayoutCatalog::builtin().get("hero-left").unwrap();
        assert_eq!(
            layout.area_span("photo"),
            Some(CellSpan {
                col_start: 0,
                col_end: 1,
                row_start: 0,
                row_end: 2,
            })
        );
        assert_eq!(layout.area_names(), vec!["photo", "panel2", "tribute"]);
        assert!(layout.area_span("sidebar").is_none());
    }

    #[test]
    fn validate_flags_broken_grids() {
        let broken = LayoutDefinition {
            id: "broken",
            region_count: 2,
            columns: &[1.0, 1.0],
            rows: &[1.0, 1.0],
            areas: &[&["photo", "tribute"], &["tribute", "photo"]],
            aspect: AspectRatio::new(1.0, 1.0),
        };
        let issues = broken.validate();
        assert!(issues.contains(&LayoutIssue::NotRectangular { label: "photo" }));
        assert!(issues.contains(&LayoutIssue::NotRectangular { label: "tribute" }));

        let ragged = LayoutDefinition {
            id: "ragged",
            region_count: 3,
            columns: &[1.0, 1.0],
            rows: &[1.0],
            areas: &[&["photo", "banner"]],
            aspect: AspectRatio::new(1.0, 1.0),
        };
        let issues = ragged.validate();
        assert!(issues.contains(&LayoutIssue::UnknownRole { label: "banner" }));
        assert!(issues.contains(&LayoutIssue::RegionCountMismatch {
            declared: 3,
            found: 2
        }));
    }

    #[test]
    fn third_panel_counterparts() {
        let catalog = LayoutCatalog::builtin();
        assert_eq!(catalog.with_third_panel("side-by-side").unwrap().id, "hero-left");
        assert_eq!(catalog.with_third_panel("stacked").unwrap().id, "hero-top");
        assert_eq!(catalog.with_third_panel("photos-left").unwrap().id, "photos-left");
        assert_eq!(catalog.without_third_panel("hero-top").unwrap().id, "stacked");
        assert_eq!(catalog.without_third_panel("tribute-top").unwrap().id, "stacked");
        assert_eq!(
            catalog.without_third_panel("photos-left").unwrap().id,
            "side-by-side"
        );
        assert!(catalog.with_third_panel("mosaic").is_err());
    }
}
