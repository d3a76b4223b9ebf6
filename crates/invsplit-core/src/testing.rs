//! Scripted collaborators for unit tests.
//!
//! Test pages are small grayscale images filled with their page id, so a
//! decoder can tell from any crop which page it is looking at.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use image::{DynamicImage, GrayImage, Luma};

use crate::decode::{BarcodeDecoder, Decoders, QrDecoder, Result, TextRecognizer};
use crate::error::DecodeError;
use crate::models::{Crop, Page};
use crate::regions::RegionKind;

/// A 100x100 page identified by `id`.
pub fn page(id: u8) -> Page {
    Page::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
        100,
        100,
        Luma([id]),
    )))
}

/// Pages `1..=count`.
pub fn pages(count: u8) -> Vec<Page> {
    (1..=count).map(page).collect()
}

fn page_id(crop: &Crop) -> u8 {
    crop.image.to_luma8().get_pixel(0, 0)[0]
}

#[derive(Default)]
struct Script {
    qr: HashMap<u8, Vec<String>>,
    barcode: HashMap<u8, String>,
    text: HashMap<(u8, RegionKind), String>,
    failing: HashSet<u8>,
    ocr_calls: Cell<usize>,
}

impl Script {
    fn check(&self, crop: &Crop) -> Result<u8> {
        let id = page_id(crop);
        if self.failing.contains(&id) {
            return Err(DecodeError::Recognition(format!("scripted failure on page {}", id)));
        }
        Ok(id)
    }
}

/// Canned decoder responses keyed by page id.
#[derive(Default)]
pub struct ScriptedDecoders {
    script: Rc<Script>,
}

impl ScriptedDecoders {
    pub fn new() -> Self {
        Self::default()
    }

    fn script_mut(&mut self) -> &mut Script {
        Rc::get_mut(&mut self.script).expect("script is edited before decoders are built")
    }

    /// QR lines for a page.
    pub fn qr(mut self, page: u8, lines: &[&str]) -> Self {
        self.script_mut()
            .qr
            .insert(page, lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Barcode payload for a page.
    pub fn barcode(mut self, page: u8, payload: &str) -> Self {
        self.script_mut().barcode.insert(page, payload.to_string());
        self
    }

    /// OCR text for one region of a page.
    pub fn text(mut self, page: u8, kind: RegionKind, text: &str) -> Self {
        self.script_mut().text.insert((page, kind), text.to_string());
        self
    }

    /// Footer text carrying "Página N de M".
    pub fn page_number(self, page: u8, number: u32) -> Self {
        self.text(
            page,
            RegionKind::FooterPageNumber,
            &format!("Página {} de 9", number),
        )
    }

    /// Make every decoder call for a page fail.
    pub fn fail(mut self, page: u8) -> Self {
        self.script_mut().failing.insert(page);
        self
    }

    /// Number of OCR calls made so far.
    pub fn ocr_calls(&self) -> usize {
        self.script.ocr_calls.get()
    }

    /// Collaborators answering from this script.
    pub fn decoders(&self) -> Decoders {
        Decoders::new(
            Box::new(Scripted(self.script.clone())),
            Box::new(Scripted(self.script.clone())),
            Box::new(Scripted(self.script.clone())),
        )
    }
}

struct Scripted(Rc<Script>);

impl QrDecoder for Scripted {
    fn decode_qr(&self, crop: &Crop) -> Result<Vec<String>> {
        let id = self.0.check(crop)?;
        Ok(self.0.qr.get(&id).cloned().unwrap_or_default())
    }
}

impl BarcodeDecoder for Scripted {
    fn decode_barcode(&self, crop: &Crop) -> Result<Option<String>> {
        let id = self.0.check(crop)?;
        Ok(self.0.barcode.get(&id).cloned())
    }
}

impl TextRecognizer for Scripted {
    fn ocr_text(&self, crop: &Crop) -> Result<String> {
        self.0.ocr_calls.set(self.0.ocr_calls.get() + 1);
        let id = self.0.check(crop)?;
        Ok(self.0.text.get(&(id, crop.kind)).cloned().unwrap_or_default())
    }
}
