//! Text recognition with the `tesseract` command line tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::models::Crop;

use super::tools::{resolve, run, stage_png};
use super::{Result, TextRecognizer};

/// Recognizer backed by tesseract. Crops are converted to grayscale first.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractRecognizer {
    /// Locate `tesseract` and fix language and page segmentation mode.
    pub fn new(binary: &Path, language: &str, psm: u8) -> Result<Self> {
        let binary = resolve(binary)?;
        debug!(
            "Using tesseract at {} (lang={}, psm={})",
            binary.display(),
            language,
            psm
        );
        Ok(Self {
            binary,
            language: language.to_string(),
            psm,
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn ocr_text(&self, crop: &Crop) -> Result<String> {
        let staged = stage_png(crop, true)?;

        let output = run(
            Command::new(&self.binary)
                .arg(staged.path())
                .arg("stdout")
                .arg("-l")
                .arg(&self.language)
                .arg("--psm")
                .arg(self.psm.to_string()),
            "tesseract",
        )?;

        if !output.status.success() {
            return Err(DecodeError::ToolFailed {
                tool: "tesseract".to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        trace!("OCR {} crop: {:?}", crop.kind.as_str(), text);
        Ok(text)
    }
}
