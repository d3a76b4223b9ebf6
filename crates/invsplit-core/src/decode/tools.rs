//! Discovery and invocation helpers for external tools.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::ImageFormat;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::trace;

use crate::error::DecodeError;
use crate::models::{Crop, SplitConfig};

use super::Result;

/// Availability of one external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    /// Tool name as configured.
    pub name: String,
    /// What the pipeline uses it for.
    pub purpose: &'static str,
    /// Resolved location, if found.
    pub path: Option<PathBuf>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Report which external tools the configured pipeline can find.
pub fn check_tools(config: &SplitConfig) -> Vec<ToolStatus> {
    let probe = |tool: &Path, purpose: &'static str| ToolStatus {
        name: tool.display().to_string(),
        purpose,
        path: which::which(tool).ok(),
    };

    vec![
        probe(Path::new("pdftoppm"), "page rasterization"),
        probe(&config.decoders.zbar_path, "QR and barcode decoding"),
        probe(&config.decoders.tesseract_path, "text recognition"),
    ]
}

/// Resolve a tool name or path to an executable.
pub(crate) fn resolve(tool: &Path) -> Result<PathBuf> {
    which::which(tool).map_err(|_| DecodeError::ToolMissing(tool.display().to_string()))
}

/// Write a crop to a temporary PNG. The file is removed when dropped.
pub(crate) fn stage_png(crop: &Crop, grayscale: bool) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("invsplit-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| DecodeError::Staging(e.to_string()))?;

    let saved = if grayscale {
        crop.image.grayscale().save_with_format(file.path(), ImageFormat::Png)
    } else {
        crop.image.save_with_format(file.path(), ImageFormat::Png)
    };
    saved.map_err(|e| DecodeError::Staging(e.to_string()))?;

    trace!(
        "Staged {} crop {}x{} at {}",
        crop.kind.as_str(),
        crop.image.width(),
        crop.image.height(),
        file.path().display()
    );

    Ok(file)
}

/// Run a command, mapping spawn failures to [`DecodeError::ToolFailed`].
pub(crate) fn run(command: &mut Command, tool: &str) -> Result<Output> {
    command.output().map_err(|e| DecodeError::ToolFailed {
        tool: tool.to_string(),
        status: -1,
        stderr: e.to_string(),
    })
}
