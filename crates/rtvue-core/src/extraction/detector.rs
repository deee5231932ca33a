//! Layout detection.
//!
//! The two-eye layout prints a pachymetry value at the OD optical centre; on the
//! single-eye layout the same pixels hold no digits. One digit-only recognition
//! of that box decides the layout.

use image::DynamicImage;
use tracing::{debug, warn};

use crate::catalog::{self, TemplateId};
use crate::error::DetectionError;
use crate::ocr::{Preparation, RecognitionRequest, RegionPreprocessor, TextRecognizer};

/// Layout assumed when the probe cannot be evaluated.
///
/// There is no confidence threshold on the probe, so an unreadable two-eye
/// report is silently treated as single-eye.
pub const FALLBACK_TEMPLATE: TemplateId = TemplateId::Two;

/// Classifies report images into one of the known layouts.
pub struct TemplateDetector<'a, R: ?Sized> {
    recognizer: &'a R,
    preprocessor: &'a RegionPreprocessor,
    min_glyph_size: u32,
}

impl<'a, R: TextRecognizer + ?Sized> TemplateDetector<'a, R> {
    pub fn new(recognizer: &'a R, preprocessor: &'a RegionPreprocessor, min_glyph_size: u32) -> Self {
        Self {
            recognizer,
            preprocessor,
            min_glyph_size,
        }
    }

    /// Probe the image: template one iff the probe yields non-empty text.
    pub fn probe(&self, image: &DynamicImage) -> Result<TemplateId, DetectionError> {
        let spec = catalog::probe_region();
        let region = self.preprocessor.prepare(image, &spec, Preparation::RAW)?;

        let request = RecognitionRequest {
            allowlist: spec.allowlist(),
            min_glyph_size: self.min_glyph_size,
            paragraph: false,
        };
        let spans = self.recognizer.recognize(&region, &request)?;

        let template = if spans.iter().any(|s| !s.text.is_empty()) {
            TemplateId::One
        } else {
            TemplateId::Two
        };

        debug!("Probe returned {} spans, template {}", spans.len(), template);
        Ok(template)
    }

    /// Probe the image, falling back to [`FALLBACK_TEMPLATE`] on any error.
    pub fn detect(&self, image: &DynamicImage) -> TemplateId {
        match self.probe(image) {
            Ok(template) => template,
            Err(e) => {
                warn!(
                    "Layout probe failed ({}), assuming template {}",
                    e, FALLBACK_TEMPLATE
                );
                FALLBACK_TEMPLATE
            }
        }
    }
}
