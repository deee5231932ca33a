//! Splitting two-eye records into per-eye records.

use crate::catalog::{LEFT_EYE_INDICATOR, RIGHT_EYE_INDICATOR};
use crate::models::record::{EyeRecord, EyeSide, FieldMap};

/// A record covers both eyes iff it carries the left-eye indicator field.
pub fn is_two_eye(fields: &FieldMap) -> bool {
    fields.contains(LEFT_EYE_INDICATOR)
}

/// Eye a field belongs to, or `None` for fields shared by both eyes.
///
/// A name containing both markers counts as OS.
pub fn side_of(name: &str) -> Option<EyeSide> {
    if name.contains("OS") {
        Some(EyeSide::OS)
    } else if name.contains("OD") {
        Some(EyeSide::OD)
    } else if name == RIGHT_EYE_INDICATOR {
        Some(EyeSide::OD)
    } else if name == LEFT_EYE_INDICATOR {
        Some(EyeSide::OS)
    } else {
        None
    }
}

/// Split a record into `(os, od)`. Shared fields go to both, in input order.
pub fn partition(fields: &FieldMap) -> (EyeRecord, EyeRecord) {
    let mut os = FieldMap::new();
    let mut od = FieldMap::new();

    for (name, field) in fields.iter() {
        match side_of(name) {
            Some(EyeSide::OS) => os.insert(name, field.clone()),
            Some(EyeSide::OD) => od.insert(name, field.clone()),
            None => {
                os.insert(name, field.clone());
                od.insert(name, field.clone());
            }
        }
    }

    (
        EyeRecord {
            eye_side: EyeSide::OS,
            fields: os,
        },
        EyeRecord {
            eye_side: EyeSide::OD,
            fields: od,
        },
    )
}
