//! Configuration structures for receipt capture.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extract::patterns::{DEFAULT_PRICE_PATTERN, DEFAULT_SEPARATOR_PATTERN, DEFAULT_SKIP_KEYWORDS};

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Line item extraction configuration.
    pub extraction: ExtractionConfig,

    /// Tabular export configuration.
    pub export: ExportConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,
}

/// Line item extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lines containing any of these (case-insensitive) are not items.
    pub skip_keywords: Vec<String>,

    /// Regex matching a price on an OCR line.
    pub price_pattern: String,

    /// Regex matching separator runs (dot leaders, `@`, tabs) in item names.
    pub separator_pattern: String,

    /// Stamp scanned items with the capture time.
    pub stamp_capture_time: bool,

    /// Sort extracted items by descending price for display.
    pub sort_by_price: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            skip_keywords: DEFAULT_SKIP_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            price_pattern: DEFAULT_PRICE_PATTERN.to_string(),
            separator_pattern: DEFAULT_SEPARATOR_PATTERN.to_string(),
            stamp_capture_time: true,
            sort_by_price: false,
        }
    }
}

/// Tabular export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Append SUBTOTAL, TAX and TOTAL rows.
    pub include_trailers: bool,

    /// File name prefix (`<prefix>_<YYYYMMDD>.csv`).
    pub file_prefix: String,

    /// Default output directory.
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_trailers: false,
            file_prefix: "receipt".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
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

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,

    /// Vertical distance (pixels) within which text boxes share a line.
    pub line_height: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
            line_height: 20.0,
        }
    }
}

impl OcrConfig {
    /// Whether the detection and recognition models exist in `model_dir`.
    pub fn models_present(&self) -> bool {
        self.model_dir.join(&self.detection_model).exists()
            && self.model_dir.join(&self.recognition_model).exists()
    }
}

impl RcptConfig {
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
