//! Output assembly: one image-only PDF per bucket.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::{debug, info};

use super::Result;
use crate::error::PdfError;
use crate::models::{BucketKey, Page};

/// Writes pages as full-page JPEG images.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    dpi: u32,
    jpeg_quality: u8,
}

impl PdfWriter {
    /// `dpi` is the resolution the pages were rasterized at and sets the page size.
    pub fn new(dpi: u32, jpeg_quality: u8) -> Self {
        Self {
            dpi: dpi.max(1),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Write `pages` in order to a new PDF at `path`.
    pub fn write<'a>(&self, pages: impl IntoIterator<Item = &'a Page>, path: &Path) -> Result<()> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();

        for page in pages {
            let (image_stream, width, height) = self.image_xobject(page)?;
            let image_id = doc.add_object(image_stream);

            let width_pt = width as f32 * 72.0 / self.dpi as f32;
            let height_pt = height as f32 * 72.0 / self.dpi as f32;

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            Object::Real(width_pt),
                            Object::Integer(0),
                            Object::Integer(0),
                            Object::Real(height_pt),
                            Object::Integer(0),
                            Object::Integer(0),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content
                .encode()
                .map_err(|e| PdfError::Write(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width_pt),
                    Object::Real(height_pt),
                ],
            });
            kids.push(Object::Reference(page_id));
        }

        if kids.is_empty() {
            return Err(PdfError::NoPages);
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc.save(path).map_err(|e| PdfError::Write(e.to_string()))?;
        debug!("Wrote {} pages to {}", count, path.display());
        Ok(())
    }

    /// Encode a page as a DCT image XObject.
    fn image_xobject(&self, page: &Page) -> Result<(Stream, u32, u32)> {
        let (image, color_space) = match page.image() {
            DynamicImage::ImageLuma8(gray) => (DynamicImage::ImageLuma8(gray.clone()), "DeviceGray"),
            other => (DynamicImage::ImageRgb8(other.to_rgb8()), "DeviceRGB"),
        };

        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), self.jpeg_quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| PdfError::Write(e.to_string()))?;

        let (width, height) = (image.width(), image.height());
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);

        Ok((stream, width, height))
    }
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Assigns output file names, suffixing keys seen again within one batch.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    prefix: String,
    seen: HashMap<String, usize>,
}

impl OutputNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seen: HashMap::new(),
        }
    }

    /// `<prefix><key>.pdf` the first time, `<prefix><key>_<n>.pdf` for the n-th.
    pub fn file_name(&mut self, key: &BucketKey) -> String {
        let safe = sanitize_filename(&key.to_string());
        let count = self.seen.entry(safe.clone()).or_insert(0);
        *count += 1;

        let name = if *count > 1 {
            format!("{}{}_{}.pdf", self.prefix, safe, count)
        } else {
            format!("{}{}.pdf", self.prefix, safe)
        };
        info!("Output {} -> {}", key, name);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identifier;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("2065815440"), "2065815440");
        assert_eq!(sanitize_filename(" A/B:C d.pdf "), "A_B_C_d.pdf");
        assert_eq!(sanitize_filename("Página-1"), "P_gina-1");
    }

    #[test]
    fn test_repeated_keys_get_suffix() {
        let key = BucketKey::Identifier(Identifier::normalize("123456789").unwrap());
        let mut namer = OutputNamer::new("invoice_");

        assert_eq!(namer.file_name(&key), "invoice_123456789.pdf");
        assert_eq!(namer.file_name(&BucketKey::Unassigned), "invoice_UNASSIGNED.pdf");
        assert_eq!(namer.file_name(&key), "invoice_123456789_2.pdf");
        assert_eq!(namer.file_name(&key), "invoice_123456789_3.pdf");
    }

    #[test]
    fn test_write_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let pages = vec![
            Page::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 600, Luma([255])))),
            Page::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 600, Rgb([10, 20, 30])))),
        ];

        PdfWriter::new(300, 85).write(pages.iter(), &path).unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_write_nothing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfWriter::new(300, 85)
            .write(std::iter::empty(), &dir.path().join("empty.pdf"))
            .unwrap_err();
        assert!(matches!(err, PdfError::NoPages));
    }
}
