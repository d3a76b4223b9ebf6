//! Page images taken straight from the scanned PDF with lopdf.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{Rasterizer, Result};
use crate::error::PdfError;
use crate::models::Page;

/// Uses the largest image XObject on each page as the page image.
///
/// Scanners emit one full-page image per page, so this avoids rendering
/// altogether. The DPI argument is ignored; images keep their native size.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedImageRasterizer;

impl EmbeddedImageRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Load a document, decrypting it if it only has an empty password.
    fn load(path: &Path) -> Result<Document> {
        let mut doc = Document::load(path).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }

    fn page_image(&self, doc: &Document, page_id: ObjectId) -> Option<DynamicImage> {
        let resources = page_resources(doc, page_id)?;
        let xobjects = resources.get(b"XObject").ok()?;
        let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) else {
            return None;
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| doc.dereference(obj).ok())
            .filter_map(|(_, obj)| decode_image(doc, obj))
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
    }
}

impl Rasterizer for EmbeddedImageRasterizer {
    fn rasterize(&self, path: &Path, _dpi: u32) -> Result<Vec<Page>> {
        let doc = Self::load(path)?;

        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(PdfError::NoPages);
        }
        debug!("Extracting images from {} pages", page_ids.len());

        let mut pages = Vec::with_capacity(page_ids.len());
        for (number, page_id) in page_ids {
            let image = self
                .page_image(&doc, page_id)
                .ok_or_else(|| PdfError::Rasterize {
                    page: number,
                    reason: "no decodable image on page".to_string(),
                })?;
            trace!("Page {}: {}x{}", number, image.width(), image.height());
            pages.push(Page::new(image));
        }

        Ok(pages)
    }
}

/// Resources of a page, following `Parent` links for inherited ones.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            trace!("Decoding {}x{} JPEG", width, height);
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    raw_image(data, width, height, color_space)
}

fn raw_image(mut data: Vec<u8>, width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode raw image: {} bytes for {}x{} {}",
                data.len(),
                width,
                height,
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfWriter;
    use image::Luma;

    #[test]
    fn test_raw_gray_and_rgb() {
        let gray = raw_image(vec![7; 6], 3, 2, b"DeviceGray").unwrap();
        assert_eq!((gray.width(), gray.height()), (3, 2));
        assert!(matches!(gray, DynamicImage::ImageLuma8(_)));

        let rgb = raw_image(vec![1; 18], 3, 2, b"DeviceRGB").unwrap();
        assert!(matches!(rgb, DynamicImage::ImageRgb8(_)));

        assert!(raw_image(vec![1; 5], 3, 2, b"DeviceGray").is_none());
        assert!(raw_image(vec![1; 18], 3, 2, b"DeviceCMYK").is_none());
    }

    #[test]
    fn test_reads_back_written_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");

        let pages: Vec<Page> = [40u8, 200u8]
            .into_iter()
            .map(|v| Page::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 96, Luma([v])))))
            .collect();
        PdfWriter::new(150, 90).write(pages.iter(), &path).unwrap();

        let read = EmbeddedImageRasterizer::new().rasterize(&path, 300).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!((read[0].width(), read[0].height()), (64, 96));

        // JPEG is lossy; the two pages stay clearly apart.
        let first = read[0].image().to_luma8().get_pixel(10, 10)[0];
        let second = read[1].image().to_luma8().get_pixel(10, 10)[0];
        assert!(first < 100 && second > 150);
    }

    #[test]
    fn test_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.pdf");
        std::fs::write(&path, b"plain text").unwrap();

        let err = EmbeddedImageRasterizer::new().rasterize(&path, 300).unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }
}
