//! Core library for splitting scanned invoice batches.
//!
//! This crate provides:
//! - Page rasterization (poppler or embedded scan images)
//! - Fixed page regions and crops for the decoders
//! - QR, barcode and OCR collaborators behind small traits
//! - Identifier and page-number extraction rules
//! - Signal fusion and the cross-page segmentation state machine
//! - Per-bucket PDF output and run reports

pub mod decode;
pub mod error;
pub mod models;
pub mod pdf;
pub mod regions;
pub mod resolver;
pub mod rules;
pub mod segment;

#[cfg(test)]
mod testing;

pub use decode::{check_tools, Decoders, ToolStatus};
pub use error::{ContractError, DecodeError, PdfError, Result, SplitError};
pub use models::{BucketKey, Identifier, Page, SplitConfig};
pub use pdf::{rasterizer_for, OutputNamer, PdfWriter, Rasterizer};
pub use regions::{Region, RegionKind};
pub use resolver::{SignalResolver, SignalSource};
pub use segment::{BatchReport, Bucket, PageProgress, Report, Segmentation, Segmenter};

/// Build a segmenter from configuration, resolving external tools up front.
pub fn segmenter_from_config(config: &SplitConfig) -> Result<Segmenter> {
    let decoders = Decoders::from_config(&config.decoders)?;
    let resolver = SignalResolver::new(decoders, &config.extraction)?;
    Ok(Segmenter::new(resolver))
}
