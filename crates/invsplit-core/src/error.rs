//! Error types for the invsplit-core library.

use thiserror::Error;

/// Main error type for the invsplit library.
#[derive(Error, Debug)]
pub enum SplitError {
    /// PDF loading, rasterization or writing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// A decoder or OCR collaborator failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The caller handed the engine input it cannot work with.
    #[error("invalid input: {0}")]
    Contract(#[from] ContractError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Whole-run contract violations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContractError {
    /// The page sequence was empty.
    #[error("no pages to segment")]
    NoPages,

    /// A page has zero width or height.
    #[error("page {index} has invalid dimensions {width}x{height}")]
    InvalidDimensions { index: usize, width: u32, height: u32 },
}

/// Errors raised by barcode, QR and OCR collaborators.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// An external tool could not be found on PATH or at its configured location.
    #[error("tool not found: {0}")]
    ToolMissing(String),

    /// An external tool ran but reported failure.
    #[error("{tool} exited with status {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// Failed to write the crop handed to an external tool.
    #[error("failed to stage crop image: {0}")]
    Staging(String),

    /// OCR model could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to rasterize a page.
    #[error("failed to rasterize page {page}: {reason}")]
    Rasterize { page: u32, reason: String },

    /// The external page renderer is missing or failed.
    #[error("page renderer failed: {0}")]
    Renderer(String),

    /// Failed to assemble an output PDF.
    #[error("failed to write PDF: {0}")]
    Write(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the invsplit library.
pub type Result<T> = std::result::Result<T, SplitError>;
