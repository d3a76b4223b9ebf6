//! Decoder collaborators: QR, 1D barcode and OCR.
//!
//! The engine talks to these only through the traits below. Back-ends run
//! external tools (`zbarimg`, `tesseract`) or PaddleOCR models and receive
//! their settings explicitly from [`DecoderConfig`].

mod tesseract;
mod tools;
mod zbar;

#[cfg(feature = "native")]
mod onnx;

pub use tesseract::TesseractRecognizer;
pub use tools::{check_tools, ToolStatus};
pub use zbar::ZbarDecoder;

#[cfg(feature = "native")]
pub use onnx::OnnxRecognizer;

use crate::error::DecodeError;
use crate::models::{Crop, DecoderConfig, OcrBackend};

/// Result type for decoder operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Reads QR codes. Returns every decoded text line, in no particular order.
pub trait QrDecoder {
    fn decode_qr(&self, crop: &Crop) -> Result<Vec<String>>;
}

/// Reads 1D barcodes. Returns the first decoded payload, if any.
pub trait BarcodeDecoder {
    fn decode_barcode(&self, crop: &Crop) -> Result<Option<String>>;
}

/// Reads printed text. An empty string means nothing was recognized.
pub trait TextRecognizer {
    fn ocr_text(&self, crop: &Crop) -> Result<String>;
}

/// The set of collaborators a resolver consults.
pub struct Decoders {
    pub qr: Box<dyn QrDecoder>,
    pub barcode: Box<dyn BarcodeDecoder>,
    pub ocr: Box<dyn TextRecognizer>,
}

impl Decoders {
    /// Bundle explicit collaborators.
    pub fn new(
        qr: Box<dyn QrDecoder>,
        barcode: Box<dyn BarcodeDecoder>,
        ocr: Box<dyn TextRecognizer>,
    ) -> Self {
        Self { qr, barcode, ocr }
    }

    /// Build the configured back-ends, resolving external tools up front.
    pub fn from_config(config: &DecoderConfig) -> Result<Self> {
        let zbar = ZbarDecoder::new(&config.zbar_path)?;

        let ocr: Box<dyn TextRecognizer> = match config.ocr_backend {
            OcrBackend::Tesseract => Box::new(TesseractRecognizer::new(
                &config.tesseract_path,
                &config.ocr_language,
                config.tesseract_psm,
            )?),
            #[cfg(feature = "native")]
            OcrBackend::Onnx => Box::new(OnnxRecognizer::from_dir(&config.model_dir)?),
            #[cfg(not(feature = "native"))]
            OcrBackend::Onnx => {
                return Err(DecodeError::ModelLoad(
                    "ONNX OCR requires the `native` feature".to_string(),
                ));
            }
        };

        Ok(Self {
            qr: Box::new(zbar.clone()),
            barcode: Box::new(zbar),
            ocr,
        })
    }
}
