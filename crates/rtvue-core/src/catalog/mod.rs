//! Region catalog: named report fields, their pixel geometry and accepted characters.
//!
//! The catalog is pure data. Header ("info") and scalar ("exam") regions are
//! literal tables per layout; map-grid regions are generated from the sector
//! list and per-layout quadrant tables (see [`grid`]).

mod grid;
mod tables;

use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub use grid::{Quadrant, RINGS, SAMPLE_HEIGHT, SAMPLE_WIDTH, SECTORS, quadrants};

/// Name of the right-eye indicator field.
pub const RIGHT_EYE_INDICATOR: &str = "Eye";

/// Name of the left-eye indicator field, present only on two-eye layouts.
pub const LEFT_EYE_INDICATOR: &str = "Eye_2";

/// Digits only.
pub const DIGITS: &str = "0123456789";

/// One of the two known report layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateId {
    /// Two-eye report (OD and OS side by side).
    One,
    /// Single-eye report.
    Two,
}

impl TemplateId {
    /// All layouts, in id order.
    pub const ALL: [TemplateId; 2] = [TemplateId::One, TemplateId::Two];

    /// Numeric id used in logs and output.
    pub fn number(self) -> u8 {
        match self {
            TemplateId::One => 1,
            TemplateId::Two => 2,
        }
    }

    /// Look up a layout by its numeric id.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(TemplateId::One),
            2 => Some(TemplateId::Two),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Field group within a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Patient header information.
    Info,
    /// Scalar exam values.
    Exam,
    /// Thickness map sample points.
    Map,
}

impl Category {
    /// All categories, in extraction order.
    pub const ALL: [Category; 3] = [Category::Info, Category::Exam, Category::Map];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Info => write!(f, "info"),
            Category::Exam => write!(f, "exam"),
            Category::Map => write!(f, "map"),
        }
    }
}

/// A named rectangular region on a report image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, unique within a template and category.
    pub name: String,
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Characters the recognizer may output. Empty means unrestricted.
    pub allowed_chars: String,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        [x, y, width, height]: [u32; 4],
        allowed_chars: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            allowed_chars: allowed_chars.into(),
        }
    }

    /// The allowlist to hand to the recognizer, if any.
    pub fn allowlist(&self) -> Option<&str> {
        if self.allowed_chars.is_empty() {
            None
        } else {
            Some(&self.allowed_chars)
        }
    }
}

/// Ordered set of field regions for one template and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSet {
    specs: Vec<FieldSpec>,
}

impl RegionSet {
    /// Build a region set. Names must be unique.
    pub fn from_specs(specs: Vec<FieldSpec>) -> Self {
        let set = Self { specs };
        debug_assert!(
            set.duplicate_names().is_empty(),
            "duplicate region names: {:?}",
            set.duplicate_names()
        );
        set
    }

    /// Look up a region by field name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Field names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Names that occur more than once.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for name in self.names() {
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// All region sets of one layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub info: RegionSet,
    pub exam: RegionSet,
    pub map: RegionSet,
}

impl Template {
    /// Build the catalog entries of a layout.
    pub fn build(id: TemplateId) -> Self {
        Self {
            id,
            info: build_regions(id, Category::Info),
            exam: build_regions(id, Category::Exam),
            map: build_regions(id, Category::Map),
        }
    }

    pub fn regions(&self, category: Category) -> &RegionSet {
        match category {
            Category::Info => &self.info,
            Category::Exam => &self.exam,
            Category::Map => &self.map,
        }
    }

    /// Every field name of the layout across all categories.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.regions(c).names())
    }
}

lazy_static! {
    static ref TEMPLATE_ONE: Template = Template::build(TemplateId::One);
    static ref TEMPLATE_TWO: Template = Template::build(TemplateId::Two);
}

/// The cached catalog entry for a layout.
pub fn template(id: TemplateId) -> &'static Template {
    match id {
        TemplateId::One => &TEMPLATE_ONE,
        TemplateId::Two => &TEMPLATE_TWO,
    }
}

/// Regions of a layout and category, from the cached catalog.
pub fn regions_for(id: TemplateId, category: Category) -> &'static RegionSet {
    template(id).regions(category)
}

/// Build the regions of a layout and category from scratch.
pub fn build_regions(id: TemplateId, category: Category) -> RegionSet {
    let specs = match category {
        Category::Info => tables::info_specs(id),
        Category::Exam => tables::exam_specs(id),
        Category::Map => grid::map_specs(id),
    };
    RegionSet::from_specs(specs)
}

/// The region probed to tell the layouts apart: the pachymetry optical-centre
/// sample of the two-eye layout.
pub fn probe_region() -> FieldSpec {
    grid::probe_spec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_unique_per_category() {
        for id in TemplateId::ALL {
            for category in Category::ALL {
                let regions = regions_for(id, category);
                assert!(
                    regions.duplicate_names().is_empty(),
                    "template {} {}: {:?}",
                    id,
                    category,
                    regions.duplicate_names()
                );
            }
        }
    }

    #[test]
    fn test_region_counts() {
        assert_eq!(regions_for(TemplateId::One, Category::Info).len(), 9);
        assert_eq!(regions_for(TemplateId::Two, Category::Info).len(), 7);
        assert_eq!(regions_for(TemplateId::One, Category::Exam).len(), 36);
        assert_eq!(regions_for(TemplateId::Two, Category::Exam).len(), 18);
        // 17 samples per quadrant
        assert_eq!(regions_for(TemplateId::One, Category::Map).len(), 4 * 17);
        assert_eq!(regions_for(TemplateId::Two, Category::Map).len(), 2 * 17);
    }

    #[test]
    fn test_eye_indicators() {
        let one = regions_for(TemplateId::One, Category::Info);
        assert!(one.get(RIGHT_EYE_INDICATOR).is_some());
        assert!(one.get(LEFT_EYE_INDICATOR).is_some());

        let two = regions_for(TemplateId::Two, Category::Info);
        assert!(two.get(RIGHT_EYE_INDICATOR).is_some());
        assert!(two.get(LEFT_EYE_INDICATOR).is_none());
    }

    #[test]
    fn test_info_golden_entries() {
        let one = regions_for(TemplateId::One, Category::Info);
        assert_eq!(
            one.get("Gender"),
            Some(&FieldSpec::new("Gender", [361, 31, 60, 16], "MF"))
        );
        assert_eq!(
            one.get("Eye_2"),
            Some(&FieldSpec::new("Eye_2", [890, 64, 32, 70], "OSD"))
        );

        let two = regions_for(TemplateId::Two, Category::Info);
        assert_eq!(
            two.get("Exam_date"),
            Some(&FieldSpec::new("Exam_date", [694, 18, 140, 16], "0123456789 /"))
        );
    }

    #[test]
    fn test_unrestricted_fields_have_no_allowlist() {
        let info = regions_for(TemplateId::One, Category::Info);
        assert_eq!(info.get("Patient").and_then(|s| s.allowlist()), None);
        assert_eq!(info.get("Gender").and_then(|s| s.allowlist()), Some("MF"));
    }

    #[test]
    fn test_template_field_names_cover_all_categories() {
        let names: Vec<&str> = template(TemplateId::Two).field_names().collect();
        assert_eq!(names.len(), 7 + 18 + 34);
        assert_eq!(names.first(), Some(&"Patient"));
        assert!(names.contains(&"Epi_MinMax"));
        assert!(names.contains(&"EOS_SN2"));
    }

    #[test]
    fn test_template_number_round_trip() {
        for id in TemplateId::ALL {
            assert_eq!(TemplateId::from_number(id.number()), Some(id));
        }
        assert_eq!(TemplateId::from_number(3), None);
    }
}
