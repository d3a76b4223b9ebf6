//! Text recognition with PaddleOCR models through `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::DecodeError;
use crate::models::Crop;

use super::{Result, TextRecognizer};

/// Rows closer than this many pixels are read as one line.
const ROW_HEIGHT: f64 = 20.0;

/// Recognizer backed by `pure-onnx-ocr` (pure Rust, no external runtime).
pub struct OnnxRecognizer {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl OnnxRecognizer {
    /// Load `det.onnx`, `latin_rec.onnx` and `latin_dict.txt` from a directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| DecodeError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine })
    }
}

impl TextRecognizer for OnnxRecognizer {
    fn ocr_text(&self, crop: &Crop) -> Result<String> {
        let start = Instant::now();

        let results = self
            .engine
            .run_from_image(&crop.image)
            .map_err(|e| DecodeError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        // Reading order: row band first, then left to right.
        let mut lines: Vec<((i64, f64), String)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                (((y / ROW_HEIGHT) as i64, x), r.text.replace("[UNK]", " "))
            })
            .collect();
        lines.sort_by(|a, b| {
            a.0 .0
                .cmp(&b.0 .0)
                .then(a.0 .1.partial_cmp(&b.0 .1).unwrap_or(std::cmp::Ordering::Equal))
        });

        debug!(
            "pure-onnx-ocr read {} regions from {} crop in {}ms",
            lines.len(),
            crop.kind.as_str(),
            start.elapsed().as_millis()
        );

        Ok(lines
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .take(4)
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)))
}
