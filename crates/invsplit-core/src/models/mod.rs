//! Data models for pages, identifiers and configuration.

pub mod config;
pub mod page;

pub use config::{DecoderConfig, ExtractionConfig, OcrBackend, OutputConfig, PdfConfig, RasterizerKind, SplitConfig};
pub use page::{BucketKey, Crop, Identifier, Page};
