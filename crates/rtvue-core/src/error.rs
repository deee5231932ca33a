//! Error types for the rtvue-core library.

use thiserror::Error;

/// Main error type for the rtvue library.
#[derive(Error, Debug)]
pub enum RtvueError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Template detection error.
    #[error("detection error: {0}")]
    Detection(#[from] DetectionError),

    /// File name metadata error.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Dataset export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Region preparation failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// Region lies outside the image.
    #[error("region {name} ({x},{y} {width}x{height}) is outside the {image_width}x{image_height} image")]
    RegionOutOfBounds {
        name: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// Errors raised while probing an image for its layout.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// The probe region could not be prepared or recognized.
    #[error("probe failed: {0}")]
    Probe(#[from] OcrError),
}

/// Errors related to report file name parsing.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The file name has fewer tokens than the naming scheme requires.
    #[error("file name {name:?} has {found} '_' separated tokens, expected at least {expected}")]
    TooFewTokens {
        name: String,
        found: usize,
        expected: usize,
    },

    /// The path has no usable file name.
    #[error("path has no file name: {0}")]
    NoFileName(String),
}

/// Errors related to writing aggregated datasets.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Writing the output file failed.
    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    /// The output path already exists or was written earlier in the run.
    #[error("output {path} already exists")]
    Exists { path: String },

    /// Serializing a dataset failed.
    #[error("failed to serialize dataset {dataset}: {reason}")]
    Serialize { dataset: String, reason: String },
}

/// Result type for the rtvue library.
pub type Result<T> = std::result::Result<T, RtvueError>;
