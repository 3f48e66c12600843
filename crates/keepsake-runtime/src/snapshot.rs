#![forbid(unsafe_code)]

//! Persisted preview state.
//!
//! A snapshot holds everything the customer chose except photo bytes:
//! fields, style, layout, crops, divider overrides, third-panel mode, and
//! print size. Restoring a snapshot and re-supplying the same photos yields
//! the same pixels.

use std::collections::BTreeMap;

use keepsake_core::geometry::FrameSize;
use keepsake_core::region::{PanelMode, RegionId};
use keepsake_core::{PreviewError, PreviewResult};
use keepsake_layout::TrackRatios;
use keepsake_render::{FieldValues, PhotoCrop};
use serde::{Deserialize, Serialize};

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable preview state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub fields: FieldValues,
    #[serde(default)]
    pub style: String,
    pub layout: String,
    #[serde(default)]
    pub crops: BTreeMap<RegionId, PhotoCrop>,
    #[serde(default)]
    pub custom_ratios: BTreeMap<String, TrackRatios>,
    #[serde(default)]
    pub panel_mode: PanelMode,
    #[serde(default)]
    pub frame: Option<FrameSize>,
}

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

impl PreviewSnapshot {
    /// Encode as JSON.
    pub fn to_json(&self) -> PreviewResult<String> {
        serde_json::to_string(self).map_err(|err| PreviewError::InvalidSnapshot(err.to_string()))
    }

    /// Decode from JSON, rejecting formats newer than this build.
    pub fn from_json(json: &str) -> PreviewResult<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|err| PreviewError::InvalidSnapshot(err.to_string()))?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PreviewError::InvalidSnapshot(format!(
                "snapshot version {} is newer than {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_snapshot_fills_defaults() {
        let snapshot = PreviewSnapshot::from_json(r#"{"layout":"stacked"}"#).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.layout, "stacked");
        assert!(snapshot.fields.is_empty());
        assert_eq!(snapshot.panel_mode, PanelMode::Photo);
        assert_eq!(snapshot.frame, None);
    }

    #[test]
    fn json_uses_host_field_names() {
        let mut crops = BTreeMap::new();
        crops.insert(RegionId::from("photo"), PhotoCrop::clamped(1.5, 0.2, 0.8));
        let mut custom_ratios = BTreeMap::new();
        custom_ratios.insert("side-by-side".to_owned(), TrackRatios::new(vec![1.2, 0.8], vec![1.0]));
        let snapshot = PreviewSnapshot {
            version: SNAPSHOT_VERSION,
            fields: [("petName", "Luna")].into_iter().collect(),
            style: "classic-dark".into(),
            layout: "side-by-side".into(),
            crops,
            custom_ratios,
            panel_mode: PanelMode::Text,
            frame: FrameSize::new(11.0, 14.0),
        };
        let json = snapshot.to_json().unwrap();
        assert!(json.contains(r#""customRatios":{"side-by-side""#));
        assert!(json.contains(r#""panX":0.2"#));
        assert!(json.contains(r#""panelMode":"text""#));
        assert_eq!(PreviewSnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn future_versions_are_rejected() {
        let err = PreviewSnapshot::from_json(r#"{"version":99,"layout":"stacked"}"#).unwrap_err();
        assert!(matches!(err, PreviewError::InvalidSnapshot(_)));
        assert!(PreviewSnapshot::from_json("[]").is_err());
    }
}
