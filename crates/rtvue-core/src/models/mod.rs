//! Data models: configuration and extraction records.

pub mod config;
pub mod record;

pub use config::{DatasetFormat, ExtractionConfig, OcrConfig, OutputConfig, RtvueConfig};
pub use record::{CONFIDENCE_SUFFIX, ExtractedField, EyeRecord, EyeSide, FieldMap, SourceRecord};
