//! PDF input and output.
//!
//! Input PDFs are turned into [`Page`] images by a [`Rasterizer`]; output
//! buckets are written back out as image-only PDFs by [`PdfWriter`].

mod extractor;
mod poppler;
mod writer;

pub use extractor::EmbeddedImageRasterizer;
pub use poppler::PopplerRasterizer;
pub use writer::{sanitize_filename, OutputNamer, PdfWriter};

use std::path::Path;

use crate::error::PdfError;
use crate::models::{Page, PdfConfig, RasterizerKind};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns every page of a PDF into an image, in page order.
pub trait Rasterizer {
    fn rasterize(&self, path: &Path, dpi: u32) -> Result<Vec<Page>>;
}

/// Build the rasterizer selected in the configuration.
pub fn rasterizer_for(config: &PdfConfig) -> Box<dyn Rasterizer> {
    match config.rasterizer {
        RasterizerKind::Poppler => Box::new(PopplerRasterizer::new()),
        RasterizerKind::Embedded => Box::new(EmbeddedImageRasterizer::new()),
    }
}
