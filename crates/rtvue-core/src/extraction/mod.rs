//! Field extraction: layout detection, region extraction, eye-side
//! partitioning and folder aggregation.

pub mod aggregate;
mod crops;
mod detector;
mod extractor;
mod metadata;
pub mod partition;
pub mod patterns;
mod pipeline;

pub use aggregate::{Cell, Column, ColumnType, Dataset, FolderDatasets, RecordAggregator, aggregate};
pub use crops::{CropSink, DirCropSink, NullCropSink, crop_file_name, sanitize_value};
pub use detector::{FALLBACK_TEMPLATE, TemplateDetector};
pub use extractor::{ExtractionMode, RegionExtractor};
pub use metadata::{FileMetadata, patient_base};
pub use partition::{is_two_eye, partition, side_of};
pub use pipeline::{Pipeline, ProcessedFile};
