//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the rtvue pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RtvueConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Region preparation and recognition parameters.
    pub extraction: ExtractionConfig,

    /// Output locations and naming.
    pub output: OutputConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of dropping them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }

    pub fn recognition_path(&self) -> PathBuf {
        self.model_dir.join(&self.recognition_model)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(&self.dictionary)
    }

    /// Whether every model file exists.
    pub fn models_present(&self) -> bool {
        self.detection_path().exists()
            && self.recognition_path().exists()
            && self.dictionary_path().exists()
    }
}

/// Region preparation and recognition parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Integer magnification applied to every cropped region.
    pub magnification: u32,

    /// Binarization threshold for scalar exam values (pixels below become black).
    pub binarize_threshold: u8,

    /// Box-blur radius for header and exam regions (0 disables).
    pub blur_radius: u32,

    /// Minimum longer side, in pixels, of text boxes kept in header and exam regions.
    pub text_min_glyph_size: u32,

    /// Minimum longer side, in pixels, of text boxes kept in map samples and the layout probe.
    pub map_min_glyph_size: u32,

    /// Prepend metadata parsed from the file name to each record.
    pub include_file_metadata: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            magnification: 4,
            binarize_threshold: 200,
            blur_radius: 1,
            text_min_glyph_size: 2,
            map_min_glyph_size: 5,
            include_file_metadata: true,
        }
    }
}

/// Output format of aggregated datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DatasetFormat::Csv => "csv",
            DatasetFormat::Json => "json",
        }
    }
}

/// Output locations and naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the aggregated datasets.
    pub output_dir: PathBuf,

    /// Directory receiving the prepared region crops.
    pub crops_dir: PathBuf,

    /// Write prepared region crops for inspection.
    pub save_crops: bool,

    /// Suffix placed between the folder name and the timestamp.
    pub file_suffix: String,

    /// Dataset file format.
    pub format: DatasetFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            crops_dir: PathBuf::from("recortes"),
            save_crops: true,
            file_suffix: "RTVue".to_string(),
            format: DatasetFormat::Csv,
        }
    }
}

impl RtvueConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
