//! Configuration structures for the splitting pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the invsplit pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Identifier extraction thresholds.
    pub extraction: ExtractionConfig,

    /// PDF rasterization configuration.
    pub pdf: PdfConfig,

    /// Decoder and OCR back-end configuration.
    pub decoders: DecoderConfig,

    /// Output assembly configuration.
    pub output: OutputConfig,
}

/// Identifier extraction configuration.
///
/// The floors and ceilings here have shifted between deployments, so none of
/// them are hard-coded in the extractors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Decoded codes shorter than this are treated as false positives.
    pub min_code_length: usize,

    /// Minimum digits after a primary invoice label in free text.
    pub primary_min_digits: usize,

    /// Minimum digits after a secondary label in a targeted region.
    pub secondary_min_digits: usize,

    /// Maximum digits captured after a label in a targeted region.
    pub max_label_digits: usize,

    /// Minimum length of an unlabeled digit run.
    pub bare_min_digits: usize,

    /// Rewrite `-` as `0` in header and QR numbers instead of dropping it.
    pub hyphen_as_zero: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_code_length: 6,
            primary_min_digits: 10,
            secondary_min_digits: 8,
            max_label_digits: 13,
            bare_min_digits: 8,
            hyphen_as_zero: true,
        }
    }
}

/// How PDF pages are turned into images.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RasterizerKind {
    /// Render with poppler's `pdftoppm`.
    Poppler,
    /// Take the scanned image embedded in each page.
    Embedded,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Rasterization strategy.
    pub rasterizer: RasterizerKind,

    /// JPEG quality used when writing output documents (1-100).
    pub jpeg_quality: u8,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            rasterizer: RasterizerKind::Poppler,
            jpeg_quality: 85,
        }
    }
}

/// Which OCR back-end reads printed text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// External `tesseract` binary.
    Tesseract,
    /// PaddleOCR models through `pure-onnx-ocr`.
    Onnx,
}

/// Decoder and OCR configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Path or name of the `zbarimg` binary.
    pub zbar_path: PathBuf,

    /// Path or name of the `tesseract` binary.
    pub tesseract_path: PathBuf,

    /// Tesseract language code.
    pub ocr_language: String,

    /// Tesseract page segmentation mode.
    pub tesseract_psm: u8,

    /// OCR back-end selection.
    pub ocr_backend: OcrBackend,

    /// Directory holding `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            zbar_path: PathBuf::from("zbarimg"),
            tesseract_path: PathBuf::from("tesseract"),
            ocr_language: "eng".to_string(),
            tesseract_psm: 6,
            ocr_backend: OcrBackend::Tesseract,
            model_dir: PathBuf::from("models"),
        }
    }
}

/// Output assembly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one PDF per bucket.
    pub directory: PathBuf,

    /// Prefix for output file names.
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            file_prefix: "invoice_".to_string(),
        }
    }
}

impl SplitConfig {
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
