//! Core library for RTVue corneal-topography report OCR.
//!
//! This crate provides:
//! - Region catalog for the two known report layouts
//! - Layout detection from a single probe region
//! - Per-region preparation and recognition behind a pluggable OCR adapter
//! - Eye-side partitioning of two-eye reports
//! - Aggregation of per-image records into typed per-folder tables

pub mod catalog;
pub mod error;
pub mod extraction;
pub mod models;
pub mod ocr;

pub use catalog::{Category, FieldSpec, RegionSet, Template, TemplateId};
pub use error::{Result, RtvueError};
pub use extraction::{
    aggregate, partition, Dataset, FolderDatasets, Pipeline, ProcessedFile, RecordAggregator,
    TemplateDetector,
};
pub use models::{ExtractedField, EyeRecord, EyeSide, FieldMap, RtvueConfig, SourceRecord};
pub use ocr::{RecognitionRequest, TextRecognizer, TextSpan};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
