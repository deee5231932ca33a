//! Debug artifacts: the prepared crop behind every recognized value.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use super::patterns::{PATH_SEPARATORS, UNSAFE_FILE_CHARS};
use crate::error::Result;

/// Receives prepared region crops together with what was read from them.
pub trait CropSink {
    fn save(
        &self,
        patient_base: &str,
        field: &str,
        value: &str,
        crop: &DynamicImage,
    ) -> Result<()>;
}

/// Discards every crop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCropSink;

impl CropSink for NullCropSink {
    fn save(&self, _: &str, _: &str, _: &str, _: &DynamicImage) -> Result<()> {
        Ok(())
    }
}

/// Writes crops as JPEG files into a directory.
#[derive(Debug, Clone)]
pub struct DirCropSink {
    dir: PathBuf,
}

impl DirCropSink {
    /// Create the sink, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CropSink for DirCropSink {
    fn save(
        &self,
        patient_base: &str,
        field: &str,
        value: &str,
        crop: &DynamicImage,
    ) -> Result<()> {
        let path = self.dir.join(crop_file_name(patient_base, field, value));

        // JPEG has no alpha channel
        if crop.color().has_alpha() {
            DynamicImage::ImageRgb8(crop.to_rgb8()).save_with_format(&path, ImageFormat::Jpeg)?;
        } else {
            crop.save_with_format(&path, ImageFormat::Jpeg)?;
        }

        debug!("Saved crop {}", path.display());
        Ok(())
    }
}

/// Make a recognized value safe to embed in a file name.
pub fn sanitize_value(value: &str) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    let value = PATH_SEPARATORS.replace_all(value, "-");
    UNSAFE_FILE_CHARS.replace_all(&value, "_").into_owned()
}

/// `<patient_base>_<field>_value_<sanitized value>.jpg`
pub fn crop_file_name(patient_base: &str, field: &str, value: &str) -> String {
    format!(
        "{}_{}_value_{}.jpg",
        patient_base,
        field,
        sanitize_value(value)
    )
}
