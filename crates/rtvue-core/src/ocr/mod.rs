//! OCR adapter seam and region preparation.
//!
//! The extraction engine only talks to a [`TextRecognizer`]: it hands over a
//! prepared region plus recognition parameters and consumes the returned text
//! spans. [`PureOcrEngine`] is the bundled implementation.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;
#[cfg(test)]
pub(crate) mod testing;

pub use preprocessing::{Preparation, RegionPreprocessor};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A recognized text span with its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextSpan {
    pub fn new(bbox: [f32; 8], text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
        }
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    /// Longer side of the axis-aligned bounding rectangle.
    pub fn longest_side(&self) -> f32 {
        let (min_x, min_y, max_x, max_y) = self.rect();
        (max_x - min_x).max(max_y - min_y)
    }
}

/// Parameters of one recognition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognitionRequest<'a> {
    /// Characters the output may contain; `None` leaves the output unrestricted.
    pub allowlist: Option<&'a str>,

    /// Text boxes whose longer side is below this many pixels are discarded.
    pub min_glyph_size: u32,

    /// Merge all spans of the region into a single paragraph span.
    pub paragraph: bool,
}

/// Text recognition backend.
pub trait TextRecognizer {
    /// Recognize text in a prepared image region.
    fn recognize(
        &self,
        region: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<TextSpan>, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(
        &self,
        region: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<TextSpan>, OcrError> {
        (**self).recognize(region, request)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(
        &self,
        region: &DynamicImage,
        request: &RecognitionRequest<'_>,
    ) -> Result<Vec<TextSpan>, OcrError> {
        (**self).recognize(region, request)
    }
}

/// Keep only allowlisted characters. `None` keeps the text unchanged.
pub fn apply_allowlist(text: &str, allowlist: Option<&str>) -> String {
    match allowlist {
        Some(allowed) => text.chars().filter(|c| allowed.contains(*c)).collect(),
        None => text.to_string(),
    }
}

/// Apply a request to raw spans: drop boxes whose longer side is under
/// `min_glyph_size`, filter characters, drop spans left empty and merge into
/// one span in paragraph mode.
pub fn filter_spans(spans: Vec<TextSpan>, request: &RecognitionRequest<'_>) -> Vec<TextSpan> {
    let spans: Vec<TextSpan> = spans
        .into_iter()
        .filter(|s| s.longest_side() >= request.min_glyph_size as f32)
        .filter_map(|mut s| {
            s.text = apply_allowlist(&s.text, request.allowlist);
            (!s.text.is_empty()).then_some(s)
        })
        .collect();

    if request.paragraph {
        merge_paragraph(spans).into_iter().collect()
    } else {
        spans
    }
}

/// Merge spans (already in reading order) into one span covering all of them.
pub fn merge_paragraph(spans: Vec<TextSpan>) -> Option<TextSpan> {
    if spans.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for span in &spans {
        let (x1, y1, x2, y2) = span.rect();
        min_x = min_x.min(x1);
        min_y = min_y.min(y1);
        max_x = max_x.max(x2);
        max_y = max_y.max(y2);
    }

    let confidence = spans.iter().map(|s| s.confidence).sum::<f32>() / spans.len() as f32;
    let text = spans
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Some(TextSpan {
        bbox: [min_x, min_y, max_x, min_y, max_x, max_y, min_x, max_y],
        text,
        confidence,
    })
}
