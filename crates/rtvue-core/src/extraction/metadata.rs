//! Patient metadata encoded in report file names.
//!
//! Exported reports are named with `_`-separated tokens:
//! `<prefix>_<last>_<first>_<middle>_<id>_<x>_<eye>_<date>_<time>_<sex>_<dob>[_...]`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::models::record::{ExtractedField, FieldMap};

/// Metadata recovered from a report file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// "Last, First Middle".
    pub name: String,
    pub patient_id: String,
    pub eye: String,
    pub exam_date: String,
    /// Exam time with `-` separators turned into `:`.
    pub exam_time: String,
    pub sex: String,
    pub birth_date: String,
}

impl FileMetadata {
    /// Minimum number of `_`-separated tokens in a usable file name.
    pub const MIN_TOKENS: usize = 11;

    /// Parse a file name (the extension is ignored).
    pub fn from_file_name(file_name: &str) -> Result<Self, MetadataError> {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);

        let tokens: Vec<&str> = stem.split('_').collect();
        if tokens.len() < Self::MIN_TOKENS {
            return Err(MetadataError::TooFewTokens {
                name: file_name.to_string(),
                found: tokens.len(),
                expected: Self::MIN_TOKENS,
            });
        }

        Ok(Self {
            name: format!("{}, {} {}", tokens[1], tokens[2], tokens[3]),
            patient_id: tokens[4].to_string(),
            eye: tokens[6].to_string(),
            exam_date: tokens[7].to_string(),
            exam_time: tokens[8].replace('-', ":"),
            sex: tokens[9].to_string(),
            birth_date: tokens[10].to_string(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MetadataError::NoFileName(path.display().to_string()))?;
        Self::from_file_name(file_name)
    }

    /// Metadata as record fields, without confidence.
    pub fn to_fields(&self) -> FieldMap {
        [
            ("fName", &self.name),
            ("fID", &self.patient_id),
            ("fEye", &self.eye),
            ("fExamDate", &self.exam_date),
            ("fExamTime", &self.exam_time),
            ("fSex", &self.sex),
            ("fDOB", &self.birth_date),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), ExtractedField::text(value.as_str())))
        .collect()
    }
}

/// Identifier used to name debug crops: `<folder>___<file name up to the first "__">`.
pub fn patient_base(folder: &str, path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let head = file_name.split("__").next().unwrap_or(&file_name);
    format!("{}___{}", folder, head)
}
