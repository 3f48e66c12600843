#![forbid(unsafe_code)]

//! Template descriptors and renderer configuration.
//!
//! A template is product data, loaded as JSON. It names the fields a tribute
//! reads, the palettes its styles use, and the defaults a new session starts
//! from. Unknown keys are ignored so product metadata can live alongside.

use std::collections::BTreeMap;

use keepsake_core::{PreviewError, PreviewResult};
use keepsake_layout::{DEFAULT_LAYOUT_ID, MIN_TRACK_WEIGHT};
use keepsake_render::{FieldValues, PROOF_WATERMARK, PlaceholderLabels, StylePalette, TributeMapping};
use keepsake_text::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};

/// Colors of one style variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleVariant {
    pub tribute: StylePalette,
}

/// A field the customer fills in, with its starting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryField {
    pub id: String,
    #[serde(default)]
    pub default: String,
}

/// Product template as served to the preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateDescriptor {
    pub id: String,
    pub name: String,
    pub tribute_mapping: TributeMapping,
    pub style_variants: BTreeMap<String, StyleVariant>,
    pub default_style: Option<String>,
    pub default_layout: Option<String>,
    pub memory_fields: Vec<MemoryField>,
    pub placeholders: PlaceholderLabels,
}

impl TemplateDescriptor {
    /// Parse a template from JSON.
    pub fn from_json(json: &str) -> PreviewResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| PreviewError::InvalidSnapshot(format!("template: {err}")))
    }

    /// Palette of `style`, if the template defines it.
    #[must_use]
    pub fn palette(&self, style: &str) -> Option<StylePalette> {
        self.style_variants.get(style).map(|variant| variant.tribute)
    }

    /// Style a new session starts with, and its palette.
    ///
    /// Falls back to the first defined style, then to the built-in charcoal
    /// palette under an empty id.
    #[must_use]
    pub fn initial_style(&self) -> (String, StylePalette) {
        if let Some(id) = &self.default_style {
            if let Some(palette) = self.palette(id) {
                return (id.clone(), palette);
            }
            tracing::warn!(style = %id, "default style not defined by template");
        }
        match self.style_variants.iter().next() {
            Some((id, variant)) => (id.clone(), variant.tribute),
            None => (String::new(), StylePalette::default()),
        }
    }

    /// Layout a new session starts with.
    #[must_use]
    pub fn initial_layout(&self) -> &str {
        self.default_layout.as_deref().unwrap_or(DEFAULT_LAYOUT_ID)
    }

    /// Starting field values: every memory field with a non-empty default.
    #[must_use]
    pub fn default_fields(&self) -> FieldValues {
        self.memory_fields
            .iter()
            .filter(|field| !field.default.is_empty())
            .map(|field| (field.id.clone(), field.default.clone()))
            .collect()
    }
}

/// Tunables of one renderer instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Smallest weight a divider drag may leave on either track.
    pub min_track_weight: f64,
    /// Pointer travel in layout pixels before a crop press becomes a pan.
    pub drag_threshold: f64,
    /// Text stamped across proofs; `None` for a clean composite.
    pub watermark: Option<String>,
    /// Entries kept by the text measurement cache.
    pub measure_cache_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_track_weight: MIN_TRACK_WEIGHT,
            drag_threshold: 0.0,
            watermark: Some(PROOF_WATERMARK.to_owned()),
            measure_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl RenderConfig {
    #[must_use]
    pub fn with_min_track_weight(mut self, weight: f64) -> Self {
        self.min_track_weight = weight;
        self
    }

    #[must_use]
    pub fn with_drag_threshold(mut self, pixels: f64) -> Self {
        self.drag_threshold = pixels.max(0.0);
        self
    }

    #[must_use]
    pub fn with_watermark(mut self, text: Option<String>) -> Self {
        self.watermark = text;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_render::PackedRgba;

    const PERSON: &str = r##"{
        "id": "person-memorial",
        "name": "In Loving Memory",
        "collection": "people",
        "tributeMapping": {
            "name": "fullName",
            "nickname": "knownAs",
            "familyPrefix": "Forever loved by"
        },
        "styleVariants": {
            "classic-dark": { "tribute": { "background": "#1a1a1a", "name": "#FAF8F5" } },
            "soft-light": { "tribute": { "background": "#F5F1EB", "name": "#2B2B2B", "poem": "#5A544E" } }
        },
        "defaultStyle": "soft-light",
        "memoryFields": [
            { "id": "fullName", "label": "Full name" },
            { "id": "poemText", "default": "Those we love never truly leave us" }
        ]
    }"##;

    #[test]
    fn parses_product_template() {
        let template = TemplateDescriptor::from_json(PERSON).unwrap();
        assert_eq!(template.id, "person-memorial");
        assert_eq!(template.tribute_mapping.name, "fullName");
        assert_eq!(template.tribute_mapping.pass_date, "passDate");
        let (style, palette) = template.initial_style();
        assert_eq!(style, "soft-light");
        assert_eq!(palette.background, PackedRgba::rgb(0xF5, 0xF1, 0xEB));
        // Unlisted slots keep the charcoal defaults.
        assert_eq!(palette.divider, StylePalette::CHARCOAL.divider);
        assert_eq!(template.initial_layout(), DEFAULT_LAYOUT_ID);
    }

    #[test]
    fn only_non_empty_defaults_seed_fields() {
        let template = TemplateDescriptor::from_json(PERSON).unwrap();
        let fields = template.default_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("poemText"), "Those we love never truly leave us");
    }

    #[test]
    fn missing_default_style_falls_back() {
        let template = TemplateDescriptor::default();
        assert_eq!(template.initial_style(), (String::new(), StylePalette::default()));
        assert!(TemplateDescriptor::from_json("{ not json").is_err());
    }

    #[test]
    fn config_defaults_match_product() {
        let config = RenderConfig::default();
        assert_eq!(config.min_track_weight, 0.3);
        assert_eq!(config.watermark.as_deref(), Some("PROOF"));
        let config = config.with_drag_threshold(-4.0);
        assert_eq!(config.drag_threshold, 0.0);
    }
}
