#![forbid(unsafe_code)]

//! Field values and the template-driven tribute mapping.
//!
//! Field values are plain strings keyed by field id. Templates decide which
//! ids feed which part of a tribute, so one renderer serves pet, person, and
//! any future template without code changes.

use std::collections::BTreeMap;

use keepsake_text::TributeText;
use serde::{Deserialize, Serialize};

/// Field id read by the custom message panel.
pub const PANEL_TEXT_FIELD: &str = "panel2Text";

/// Text content keyed by field id. Missing ids read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, String>);

impl FieldValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `id`, or `""` when unset.
    #[must_use]
    pub fn get(&self, id: &str) -> &str {
        self.0.get(id).map_or("", String::as_str)
    }

    /// Store a value. Returns `true` if it differs from what was there.
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.0.insert(id.into(), value.clone()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.0.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Which field ids feed each part of a tribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TributeMapping {
    pub name: String,
    pub nickname: String,
    pub family_name: String,
    pub family_prefix: String,
    pub birth_date: String,
    pub pass_date: String,
    pub poem_text: String,
}

impl Default for TributeMapping {
    fn default() -> Self {
        Self {
            name: "petName".into(),
            nickname: "petNicknames".into(),
            family_name: "familyName".into(),
            family_prefix: "Beloved companion of".into(),
            birth_date: "birthDate".into(),
            pass_date: "passDate".into(),
            poem_text: "poemText".into(),
        }
    }
}

impl TributeMapping {
    /// Resolve display strings from `fields`.
    ///
    /// Dates join as "birth – pass" or whichever is present; nicknames are
    /// wrapped in curly quotes unless already quoted; the family line is
    /// prefixed.
    #[must_use]
    pub fn resolve(&self, fields: &FieldValues) -> TributeText {
        let birth = fields.get(&self.birth_date);
        let pass = fields.get(&self.pass_date);
        let dates = match (birth.is_empty(), pass.is_empty()) {
            (false, false) => format!("{birth} \u{2013} {pass}"),
            (false, true) => birth.to_owned(),
            (true, false) => pass.to_owned(),
            (true, true) => String::new(),
        };

        let nickname = fields.get(&self.nickname);
        let nickname = if nickname.is_empty() || nickname.starts_with('"') {
            nickname.to_owned()
        } else {
            format!("\u{201c}{nickname}\u{201d}")
        };

        let family_name = fields.get(&self.family_name);
        let family = if family_name.is_empty() {
            String::new()
        } else {
            format!("{} {family_name}", self.family_prefix)
        };

        TributeText {
            name: fields.get(&self.name).to_owned(),
            dates,
            nickname,
            family,
            body: fields.get(&self.poem_text).to_owned(),
        }
    }
}

/// Labels drawn in empty regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaceholderLabels {
    pub photo: String,
    pub second_photo: String,
    pub text: String,
}

impl Default for PlaceholderLabels {
    fn default() -> Self {
        Self {
            photo: "Upload their photo".into(),
            second_photo: "Upload second photo".into(),
            text: "Custom text".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_read_empty() {
        let mut fields = FieldValues::new();
        assert_eq!(fields.get("petName"), "");
        assert!(fields.set("petName", "Luna"));
        assert!(!fields.set("petName", "Luna"));
        assert!(fields.set("petName", "Lune"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn pet_defaults_resolve() {
        let fields: FieldValues = [
            ("petName", "Biscuit"),
            ("petNicknames", "Bis"),
            ("familyName", "the Okafors"),
            ("birthDate", "2009"),
            ("passDate", "2024"),
            ("poemText", "Run free"),
        ]
        .into_iter()
        .collect();
        let text = TributeMapping::default().resolve(&fields);
        assert_eq!(text.name, "Biscuit");
        assert_eq!(text.dates, "2009 \u{2013} 2024");
        assert_eq!(text.nickname, "\u{201c}Bis\u{201d}");
        assert_eq!(text.family, "Beloved companion of the Okafors");
        assert_eq!(text.body, "Run free");
    }

    #[test]
    fn partial_dates_and_quoted_nicknames() {
        let fields: FieldValues = [("passDate", "March 2024"), ("petNicknames", "\"Bug\"")]
            .into_iter()
            .collect();
        let text = TributeMapping::default().resolve(&fields);
        assert_eq!(text.dates, "March 2024");
        assert_eq!(text.nickname, "\"Bug\"");
        assert!(text.family.is_empty());
    }

    #[test]
    fn mapping_json_overrides_selected_ids() {
        let mapping: TributeMapping = serde_json::from_str(
            r#"{"name":"fullName","familyPrefix":"Forever loved by","poemText":"letterText"}"#,
        )
        .unwrap();
        assert_eq!(mapping.name, "fullName");
        assert_eq!(mapping.family_prefix, "Forever loved by");
        assert_eq!(mapping.birth_date, "birthDate");
    }
}
