//! Page rendering through poppler's `pdftoppm`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use super::{Rasterizer, Result};
use crate::error::PdfError;
use crate::models::Page;

/// Renders pages with `pdftoppm -r <dpi> -png` into a temporary directory.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    binary: PathBuf,
}

impl PopplerRasterizer {
    /// Use `pdftoppm` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
        }
    }

    /// Use a specific `pdftoppm` binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for PopplerRasterizer {
    fn rasterize(&self, path: &Path, dpi: u32) -> Result<Vec<Page>> {
        let binary = which::which(&self.binary)
            .map_err(|_| PdfError::Renderer(format!("{} not found", self.binary.display())))?;

        let workdir = tempfile::tempdir().map_err(|e| PdfError::Renderer(e.to_string()))?;
        let stem = workdir.path().join("page");

        debug!("Rendering {} at {} DPI", path.display(), dpi);
        let output = Command::new(&binary)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(path)
            .arg(&stem)
            .output()
            .map_err(|e| PdfError::Renderer(format!("failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::Parse(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let rendered = rendered_pages(workdir.path())?;
        if rendered.is_empty() {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(rendered.len());
        for (index, file) in rendered.iter().enumerate() {
            trace!("Loading {}", file.display());
            let image = image::open(file).map_err(|e| PdfError::Rasterize {
                page: index as u32 + 1,
                reason: e.to_string(),
            })?;
            pages.push(Page::new(image));
        }

        debug!("Rendered {} pages", pages.len());
        Ok(pages)
    }
}

/// PNG files written by `pdftoppm`, in page order.
///
/// Page numbers are zero-padded to a common width, so name order is page order.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| PdfError::Renderer(e.to_string()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<String> = rendered_pages(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn test_missing_binary() {
        let rasterizer = PopplerRasterizer::new().with_binary("no-such-pdftoppm-xyz");
        let err = rasterizer.rasterize(Path::new("in.pdf"), 300).unwrap_err();
        assert!(matches!(err, PdfError::Renderer(_)));
    }
}
