//! Per-image extraction results.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Suffix of the column holding a field's recognition confidence.
pub const CONFIDENCE_SUFFIX: &str = "_conf";

/// Recognized text of one region.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct ExtractedField {
    /// Recognized text, empty when nothing was recognized.
    pub value: String,

    /// Recognition confidence (0.0 - 1.0), absent for passes that do not track it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ExtractedField {
    /// A value without confidence.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: None,
        }
    }

    /// A value with a confidence score, clamped to [0, 1].
    pub fn scored(value: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            value: value.into(),
            confidence: Some(confidence),
        }
    }

    /// Placeholder for a region that yielded nothing.
    pub fn empty(track_confidence: bool) -> Self {
        if track_confidence {
            Self::scored("", 0.0)
        } else {
            Self::text("")
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Insertion-ordered mapping from field name to extracted value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, ExtractedField)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. An existing field of the same name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, field: ExtractedField) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = field,
            None => self.entries.push((name, field)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ExtractedField> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, field)| field)
    }

    /// Recognized text of a field, if present.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|f| f.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtractedField)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Append every field of `other`, replacing same-named fields.
    pub fn merge(&mut self, other: FieldMap) {
        for (name, field) in other.entries {
            self.insert(name, field);
        }
    }

    /// Flatten into `(column, cell)` pairs: each field's value, followed by a
    /// `<name>_conf` column when the field carries a confidence.
    pub fn columns(&self) -> Vec<(String, String)> {
        let mut columns = Vec::with_capacity(self.entries.len() * 2);
        for (name, field) in &self.entries {
            columns.push((name.clone(), field.value.clone()));
            if let Some(confidence) = field.confidence {
                columns.push((
                    format!("{}{}", name, CONFIDENCE_SUFFIX),
                    confidence.to_string(),
                ));
            }
        }
        columns
    }
}

impl FromIterator<(String, ExtractedField)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, ExtractedField)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, field) in iter {
            map.insert(name, field);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, ExtractedField);
    type IntoIter = std::vec::IntoIter<(String, ExtractedField)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, field) in &self.entries {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

/// Eye designation (ophthalmology convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub enum EyeSide {
    /// Right eye.
    OD,
    /// Left eye.
    OS,
}

impl EyeSide {
    pub fn label(self) -> &'static str {
        match self {
            EyeSide::OD => "OD",
            EyeSide::OS => "OS",
        }
    }
}

impl std::fmt::Display for EyeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The fields of one eye, split out of a two-eye report.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EyeRecord {
    pub eye_side: EyeSide,
    pub fields: FieldMap,
}

/// One processed image tagged with the folder it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SourceRecord {
    /// Source folder name (one folder per patient).
    pub folder: String,
    /// Extracted fields of the image.
    pub fields: FieldMap,
}

impl SourceRecord {
    pub fn new(folder: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            folder: folder.into(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_preserves_order_and_replaces() {
        let mut map = FieldMap::new();
        map.insert("b", ExtractedField::text("1"));
        map.insert("a", ExtractedField::text("2"));
        map.insert("b", ExtractedField::text("3"));

        let names: Vec<&str> = map.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(map.value("b"), Some("3"));
    }

    #[test]
    fn test_columns_add_confidence() {
        let mut map = FieldMap::new();
        map.insert("Patient", ExtractedField::text("Doe"));
        map.insert("SSI_OD", ExtractedField::scored("98", 0.5));

        assert_eq!(
            map.columns(),
            vec![
                ("Patient".to_string(), "Doe".to_string()),
                ("SSI_OD".to_string(), "98".to_string()),
                ("SSI_OD_conf".to_string(), "0.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_scored_clamps() {
        assert_eq!(ExtractedField::scored("x", 1.7).confidence, Some(1.0));
        assert_eq!(ExtractedField::scored("x", -0.2).confidence, Some(0.0));
        assert_eq!(ExtractedField::scored("x", f32::NAN).confidence, Some(0.0));
    }

    #[test]
    fn test_empty_placeholder() {
        assert_eq!(ExtractedField::empty(true), ExtractedField::scored("", 0.0));
        assert_eq!(ExtractedField::empty(false).confidence, None);
    }

    #[test]
    fn test_serialize_as_ordered_object() {
        let mut map = FieldMap::new();
        map.insert("Gender", ExtractedField::text("M"));
        map.insert("CO_POD", ExtractedField::scored("512", 1.0));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"Gender":{"value":"M"},"CO_POD":{"value":"512","confidence":1.0}}"#
        );
    }
}
