//! Per-image pipeline: layout detection followed by the three extraction passes.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use serde::Serialize;
use tracing::{info, warn};

use super::crops::CropSink;
use super::detector::TemplateDetector;
use super::extractor::{ExtractionMode, RegionExtractor};
use super::metadata::{FileMetadata, patient_base};
use crate::catalog::{self, Category, TemplateId};
use crate::models::config::ExtractionConfig;
use crate::models::record::{FieldMap, SourceRecord};
use crate::ocr::TextRecognizer;

/// Outcome of processing one image file.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub folder: String,
    /// Detected layout, `None` when the image could not be read.
    pub template: Option<TemplateId>,
    pub fields: FieldMap,
    /// Why the file yielded a partial record.
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

impl ProcessedFile {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_record(self) -> SourceRecord {
        SourceRecord::new(self.folder, self.fields)
    }
}

/// Extraction pipeline over one recognizer.
pub struct Pipeline<R> {
    extractor: RegionExtractor<R>,
    config: ExtractionConfig,
}

impl<R: TextRecognizer> Pipeline<R> {
    pub fn new(recognizer: R, config: ExtractionConfig) -> Self {
        Self {
            extractor: RegionExtractor::new(recognizer, &config),
            config,
        }
    }

    pub fn with_crop_sink(mut self, sink: Box<dyn CropSink>) -> Self {
        self.extractor = self.extractor.with_crop_sink(sink);
        self
    }

    pub fn extractor(&self) -> &RegionExtractor<R> {
        &self.extractor
    }

    /// Detector sharing this pipeline's recognizer and preprocessing.
    pub fn detector(&self) -> TemplateDetector<'_, R> {
        TemplateDetector::new(
            self.extractor.recognizer(),
            self.extractor.preprocessor(),
            self.config.map_min_glyph_size,
        )
    }

    /// Detect the layout and run the info, exam and map passes.
    pub fn extract_image(
        &self,
        image: &DynamicImage,
        patient_base: Option<&str>,
    ) -> (TemplateId, FieldMap) {
        let template = self.detector().detect(image);
        let mut fields = FieldMap::new();

        for category in Category::ALL {
            let regions = catalog::regions_for(template, category);
            let mode = ExtractionMode::for_category(category);
            let pass = match patient_base {
                Some(base) => self.extractor.extract_with_crops(image, regions, mode, base),
                None => self.extractor.extract(image, regions, mode),
            };
            fields.merge(pass);
        }

        (template, fields)
    }

    /// Process one image file. Never fails: problems are reported in the
    /// returned record, which may be partial.
    pub fn process_file(&self, path: &Path, folder: &str) -> ProcessedFile {
        let start = Instant::now();
        let mut fields = FieldMap::new();

        if self.config.include_file_metadata {
            match FileMetadata::from_path(path) {
                Ok(meta) => fields.merge(meta.to_fields()),
                Err(e) => warn!("No file-name metadata for {}: {}", path.display(), e),
            }
        }

        let (template, error) = match image::open(path) {
            Ok(image) => {
                let base = patient_base(folder, path);
                let (template, extracted) = self.extract_image(&image, Some(&base));
                fields.merge(extracted);
                (Some(template), None)
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                (None, Some(e.to_string()))
            }
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Processed {} ({} fields, {} ms)",
            path.display(),
            fields.len(),
            processing_time_ms
        );

        ProcessedFile {
            path: path.to_path_buf(),
            folder: folder.to_string(),
            template,
            fields,
            error,
            processing_time_ms,
        }
    }
}
