#![forbid(unsafe_code)]

//! Region identity and roles.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a region: the grid-area name it occupies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Main photo area.
    pub const PHOTO: &'static str = "photo";
    /// Tribute typography area.
    pub const TRIBUTE: &'static str = "tribute";
    /// Optional third area (second photo or custom text).
    pub const PANEL2: &'static str = "panel2";

    /// Create a region id from an area name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The area name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for RegionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What a region draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionRole {
    /// Cover-fit photo or upload placeholder.
    Photo,
    /// Name, dates, poem, and family attribution.
    Tribute,
    /// Free-form custom message.
    Text,
}

/// Content mode of the optional third panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelMode {
    #[default]
    Photo,
    Text,
}

impl RegionRole {
    /// Infer the role of a grid area.
    ///
    /// `"tribute"` is always typography. `"photo"` is always a photo. Any other
    /// area (in practice `"panel2"`) follows the host's panel mode.
    #[must_use]
    pub fn for_area(name: &str, panel_mode: PanelMode) -> Option<Self> {
        match name {
            RegionId::TRIBUTE => Some(Self::Tribute),
            RegionId::PHOTO => Some(Self::Photo),
            RegionId::PANEL2 => Some(match panel_mode {
                PanelMode::Photo => Self::Photo,
                PanelMode::Text => Self::Text,
            }),
            _ => None,
        }
    }
}
