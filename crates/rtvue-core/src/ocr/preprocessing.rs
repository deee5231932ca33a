//! Region preparation for OCR.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::trace;

use crate::catalog::FieldSpec;
use crate::error::OcrError;
use crate::models::config::ExtractionConfig;

/// Which preparation steps a region goes through after cropping and magnification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preparation {
    /// Convert to 8-bit grayscale.
    pub grayscale: bool,
    /// Threshold to pure black and white (implies grayscale).
    pub binarize: bool,
    /// Apply a box blur (implies grayscale).
    pub blur: bool,
}

impl Preparation {
    /// Magnification only.
    pub const RAW: Preparation = Preparation {
        grayscale: false,
        binarize: false,
        blur: false,
    };
}

/// Crops, magnifies and filters report regions.
pub struct RegionPreprocessor {
    /// Integer magnification factor.
    magnification: u32,
    /// Binarization threshold.
    binarize_threshold: u8,
    /// Box-blur radius.
    blur_radius: u32,
}

impl RegionPreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            magnification: config.magnification.max(1),
            binarize_threshold: config.binarize_threshold,
            blur_radius: config.blur_radius,
        }
    }

    /// Set magnification factor.
    pub fn with_magnification(mut self, magnification: u32) -> Self {
        self.magnification = magnification.max(1);
        self
    }

    /// Crop, magnify and filter one region.
    pub fn prepare(
        &self,
        image: &DynamicImage,
        spec: &FieldSpec,
        preparation: Preparation,
    ) -> Result<DynamicImage, OcrError> {
        let cropped = self.crop(image, spec)?;
        let magnified = self.magnify(&cropped);

        if !(preparation.grayscale || preparation.binarize || preparation.blur) {
            return Ok(magnified);
        }

        let mut gray = magnified.to_luma8();
        if preparation.binarize {
            gray = binarize(&gray, self.binarize_threshold);
        }
        if preparation.blur && self.blur_radius > 0 {
            gray = box_blur(&gray, self.blur_radius);
        }

        trace!(
            "Prepared region {}: {}x{}",
            spec.name,
            gray.width(),
            gray.height()
        );

        Ok(DynamicImage::ImageLuma8(gray))
    }

    /// Cut the declared rectangle out of the image, clamped to its bounds.
    pub fn crop(&self, image: &DynamicImage, spec: &FieldSpec) -> Result<DynamicImage, OcrError> {
        let (image_width, image_height) = image.dimensions();

        if spec.x >= image_width || spec.y >= image_height || spec.width == 0 || spec.height == 0 {
            return Err(OcrError::RegionOutOfBounds {
                name: spec.name.clone(),
                x: spec.x,
                y: spec.y,
                width: spec.width,
                height: spec.height,
                image_width,
                image_height,
            });
        }

        let width = spec.width.min(image_width - spec.x);
        let height = spec.height.min(image_height - spec.y);

        Ok(image.crop_imm(spec.x, spec.y, width, height))
    }

    /// Scale by the magnification factor.
    pub fn magnify(&self, image: &DynamicImage) -> DynamicImage {
        if self.magnification == 1 {
            return image.clone();
        }
        let (width, height) = image.dimensions();
        image.resize_exact(
            width * self.magnification,
            height * self.magnification,
            image::imageops::FilterType::Lanczos3,
        )
    }
}

impl Default for RegionPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pixels below the threshold become black, all others white.
pub fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let output = if pixel[0] < threshold { 0 } else { 255 };
        result.put_pixel(x, y, Luma([output]));
    }

    result
}

/// Mean filter over a `(2r + 1)²` window. Samples outside the image take the
/// nearest edge pixel.
pub fn box_blur(image: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    let r = radius as i64;
    let count = ((2 * r + 1) * (2 * r + 1)) as u32;

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;

            for dy in -r..=r {
                let ly = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                for dx in -r..=r {
                    let lx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                    sum += image.get_pixel(lx, ly)[0] as u32;
                }
            }

            let mean = ((sum + count / 2) / count) as u8;
            result.put_pixel(x, y, Luma([mean]));
        }
    }

    result
}
