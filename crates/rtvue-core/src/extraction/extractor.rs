//! Region extraction: crop, prepare and recognize every region of a set.

use image::DynamicImage;
use tracing::{debug, warn};

use crate::catalog::{Category, FieldSpec, RegionSet};
use crate::error::OcrError;
use crate::models::config::ExtractionConfig;
use crate::models::record::{ExtractedField, FieldMap};
use crate::ocr::{Preparation, RecognitionRequest, RegionPreprocessor, TextRecognizer};

use super::crops::{CropSink, NullCropSink};

/// Preparation and recognition profile of an extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Header text: grayscale, blur, paragraph grouping, no confidence.
    Info,
    /// Scalar values: grayscale, binarize, blur, per-span confidence.
    Exam,
    /// Map samples: magnification only, larger minimum box size.
    Map,
}

impl ExtractionMode {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Info => ExtractionMode::Info,
            Category::Exam => ExtractionMode::Exam,
            Category::Map => ExtractionMode::Map,
        }
    }

    pub fn preparation(self) -> Preparation {
        match self {
            ExtractionMode::Info => Preparation {
                grayscale: true,
                binarize: false,
                blur: true,
            },
            ExtractionMode::Exam => Preparation {
                grayscale: true,
                binarize: true,
                blur: true,
            },
            ExtractionMode::Map => Preparation::RAW,
        }
    }

    /// Group multi-token text into one result.
    pub fn paragraph(self) -> bool {
        matches!(self, ExtractionMode::Info)
    }

    /// Record the recognizer's confidence.
    pub fn tracks_confidence(self) -> bool {
        !matches!(self, ExtractionMode::Info)
    }
}

/// Runs the recognizer over each region of a [`RegionSet`].
pub struct RegionExtractor<R> {
    recognizer: R,
    preprocessor: RegionPreprocessor,
    text_min_glyph_size: u32,
    map_min_glyph_size: u32,
    crop_sink: Box<dyn CropSink>,
}

impl<R: TextRecognizer> RegionExtractor<R> {
    pub fn new(recognizer: R, config: &ExtractionConfig) -> Self {
        Self {
            recognizer,
            preprocessor: RegionPreprocessor::from_config(config),
            text_min_glyph_size: config.text_min_glyph_size,
            map_min_glyph_size: config.map_min_glyph_size,
            crop_sink: Box::new(NullCropSink),
        }
    }

    /// Send prepared crops of recognized values to a sink.
    pub fn with_crop_sink(mut self, sink: Box<dyn CropSink>) -> Self {
        self.crop_sink = sink;
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn preprocessor(&self) -> &RegionPreprocessor {
        &self.preprocessor
    }

    pub fn min_glyph_size(&self, mode: ExtractionMode) -> u32 {
        match mode {
            ExtractionMode::Map => self.map_min_glyph_size,
            ExtractionMode::Info | ExtractionMode::Exam => self.text_min_glyph_size,
        }
    }

    /// Extract every region. The result holds one entry per region, in region
    /// order; regions that fail yield an empty value.
    pub fn extract(&self, image: &DynamicImage, regions: &RegionSet, mode: ExtractionMode) -> FieldMap {
        self.run(image, regions, mode, None)
    }

    /// Like [`extract`](Self::extract), also handing each recognized crop to the
    /// crop sink under `patient_base`.
    pub fn extract_with_crops(
        &self,
        image: &DynamicImage,
        regions: &RegionSet,
        mode: ExtractionMode,
        patient_base: &str,
    ) -> FieldMap {
        self.run(image, regions, mode, Some(patient_base))
    }

    fn run(
        &self,
        image: &DynamicImage,
        regions: &RegionSet,
        mode: ExtractionMode,
        patient_base: Option<&str>,
    ) -> FieldMap {
        let mut fields = FieldMap::new();

        for spec in regions {
            let field = match self.extract_field(image, spec, mode) {
                Ok(Some((field, crop))) => {
                    if let Some(base) = patient_base {
                        if let Err(e) = self.crop_sink.save(base, &spec.name, &field.value, &crop) {
                            warn!("Failed to save crop for {}: {}", spec.name, e);
                        }
                    }
                    field
                }
                Ok(None) => ExtractedField::empty(mode.tracks_confidence()),
                Err(e) => {
                    warn!("Extraction of {} failed: {}", spec.name, e);
                    ExtractedField::empty(mode.tracks_confidence())
                }
            };

            debug!(
                "{} = {:?} (confidence {:?})",
                spec.name, field.value, field.confidence
            );
            fields.insert(spec.name.clone(), field);
        }

        fields
    }

    /// Recognize one region. `Ok(None)` means the recognizer returned nothing.
    fn extract_field(
        &self,
        image: &DynamicImage,
        spec: &FieldSpec,
        mode: ExtractionMode,
    ) -> Result<Option<(ExtractedField, DynamicImage)>, OcrError> {
        let prepared = self.preprocessor.prepare(image, spec, mode.preparation())?;

        let request = RecognitionRequest {
            allowlist: spec.allowlist(),
            min_glyph_size: self.min_glyph_size(mode),
            paragraph: mode.paragraph(),
        };

        let spans = self.recognizer.recognize(&prepared, &request)?;
        let Some(first) = spans.into_iter().next() else {
            return Ok(None);
        };

        let field = if mode.tracks_confidence() {
            ExtractedField::scored(first.text, first.confidence)
        } else {
            ExtractedField::text(first.text)
        };

        Ok(Some((field, prepared)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::catalog::DIGITS;
    use crate::ocr::testing::ScriptedRecognizer;
    use image::RgbImage;
    use pretty_assertions::assert_eq;

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(200, 100))
    }

    fn regions() -> RegionSet {
        RegionSet::from_specs(vec![
            FieldSpec::new("Patient", [0, 0, 40, 10], ""),
            FieldSpec::new("SSI_OD", [50, 0, 30, 10], ".0123456789"),
            FieldSpec::new("CO_POD", [100, 0, 45, 15], DIGITS),
        ])
    }

    fn extractor(recognizer: ScriptedRecognizer) -> RegionExtractor<ScriptedRecognizer> {
        RegionExtractor::new(recognizer, &ExtractionConfig::default())
    }

    #[test]
    fn test_info_mode_has_no_confidence() {
        let ex = extractor(ScriptedRecognizer::new().text("Doe", 0.9).text("98", 0.8));
        let fields = ex.extract(&image(), &regions(), ExtractionMode::Info);

        assert_eq!(fields.get("Patient"), Some(&ExtractedField::text("Doe")));
        assert_eq!(fields.get("SSI_OD"), Some(&ExtractedField::text("98")));
        assert_eq!(fields.get("CO_POD"), Some(&ExtractedField::text("")));
    }

    #[test]
    fn test_empty_result_yields_zero_confidence() {
        let ex = extractor(ScriptedRecognizer::new().nothing().nothing().nothing());
        let fields = ex.extract(&image(), &regions(), ExtractionMode::Map);

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("CO_POD"), Some(&ExtractedField::scored("", 0.0)));
    }

    #[test]
    fn test_failure_does_not_stop_iteration() {
        let ex = extractor(
            ScriptedRecognizer::new()
                .fail("model crashed")
                .text("98.5", 0.75)
                .text("512", 1.0),
        );
        let fields = ex.extract(&image(), &regions(), ExtractionMode::Exam);

        assert_eq!(fields.get("Patient"), Some(&ExtractedField::scored("", 0.0)));
        assert_eq!(fields.get("SSI_OD"), Some(&ExtractedField::scored("98.5", 0.75)));
        assert_eq!(fields.get("CO_POD"), Some(&ExtractedField::scored("512", 1.0)));
    }

    #[test]
    fn test_out_of_bounds_region_is_empty() {
        let regions = RegionSet::from_specs(vec![
            FieldSpec::new("Far", [500, 500, 10, 10], DIGITS),
            FieldSpec::new("Near", [0, 0, 10, 10], DIGITS),
        ]);
        let ex = extractor(ScriptedRecognizer::new().text("7", 0.5));
        let fields = ex.extract(&image(), &regions, ExtractionMode::Map);

        assert_eq!(fields.get("Far"), Some(&ExtractedField::scored("", 0.0)));
        assert_eq!(fields.get("Near"), Some(&ExtractedField::scored("7", 0.5)));
        // The far region never reached the recognizer
        assert_eq!(ex.recognizer().calls().len(), 1);
    }

    #[test]
    fn test_request_parameters_per_mode() {
        let ex = extractor(ScriptedRecognizer::new());
        ex.extract(&image(), &regions(), ExtractionMode::Info);
        ex.extract(&image(), &regions(), ExtractionMode::Map);

        let calls = ex.recognizer().calls();
        assert_eq!(calls.len(), 6);

        // Unrestricted field gets no allowlist
        assert_eq!(calls[0].allowlist, None);
        assert_eq!(calls[1].allowlist.as_deref(), Some(".0123456789"));
        assert!(calls[0].paragraph);
        assert_eq!(calls[0].min_glyph_size, 2);
        // Magnified x4
        assert_eq!(calls[0].dimensions, (160, 40));

        assert!(!calls[5].paragraph);
        assert_eq!(calls[5].min_glyph_size, 5);
        assert_eq!(calls[5].allowlist.as_deref(), Some(DIGITS));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let script = || {
            ScriptedRecognizer::new()
                .text("Doe", 0.9)
                .nothing()
                .text("512", 0.99)
        };
        let first = extractor(script()).extract(&image(), &regions(), ExtractionMode::Exam);
        let second = extractor(script()).extract(&image(), &regions(), ExtractionMode::Exam);
        assert_eq!(first, second);
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        saved: Rc<RefCell<Vec<String>>>,
    }

    impl CropSink for RecordingSink {
        fn save(
            &self,
            patient_base: &str,
            field: &str,
            value: &str,
            _: &DynamicImage,
        ) -> crate::error::Result<()> {
            self.saved
                .borrow_mut()
                .push(format!("{}|{}|{}", patient_base, field, value));
            Ok(())
        }
    }

    #[test]
    fn test_crops_only_for_recognized_regions() {
        let sink = RecordingSink::default();
        let ex = extractor(ScriptedRecognizer::new().text("Doe", 0.9).nothing().text("", 0.1))
            .with_crop_sink(Box::new(sink.clone()));

        ex.extract_with_crops(&image(), &regions(), ExtractionMode::Info, "P");

        assert_eq!(
            *sink.saved.borrow(),
            vec!["P|Patient|Doe".to_string(), "P|CO_POD|".to_string()]
        );
    }

    struct FailingSink;

    impl CropSink for FailingSink {
        fn save(&self, _: &str, _: &str, _: &str, _: &DynamicImage) -> crate::error::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn test_crop_sink_failure_keeps_fields() {
        let ex = extractor(
            ScriptedRecognizer::new()
                .text("Doe", 0.9)
                .text("98.5", 0.75)
                .text("512", 1.0),
        )
        .with_crop_sink(Box::new(FailingSink));

        let fields = ex.extract_with_crops(&image(), &regions(), ExtractionMode::Exam, "P");

        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("Patient"), Some(&ExtractedField::scored("Doe", 0.9)));
        assert_eq!(fields.get("SSI_OD"), Some(&ExtractedField::scored("98.5", 0.75)));
        assert_eq!(fields.get("CO_POD"), Some(&ExtractedField::scored("512", 1.0)));
    }
}
