//! Fixed page regions known to carry invoice fields.
//!
//! Regions are fractions of the page size, measured on the scanned invoice
//! layout at 300 DPI. Pixel rectangles are truncated to whole pixels and
//! clamped to the page.

use serde::{Deserialize, Serialize};

/// Page regions consulted while resolving a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Upper right block with `No.` and `Ref. Int`.
    HeaderIdentifier,
    /// Footer line with "Página N de M".
    FooterPageNumber,
    /// Top band of the page, read when targeted regions give nothing.
    TopReference,
    /// Bottom band of the page, read after the top band.
    BottomInvoice,
    /// Footer block with `No. FAC`.
    InvoiceNumber,
    /// Lower left corner holding the QR code.
    QrCode,
    /// Footer strip holding the 1D barcode.
    Barcode,
}

impl RegionKind {
    /// All region kinds.
    pub const ALL: [RegionKind; 7] = [
        RegionKind::HeaderIdentifier,
        RegionKind::FooterPageNumber,
        RegionKind::TopReference,
        RegionKind::BottomInvoice,
        RegionKind::InvoiceNumber,
        RegionKind::QrCode,
        RegionKind::Barcode,
    ];

    /// Fractional bounds `(x0, y0, x1, y1)` of this region.
    pub fn fractions(&self) -> (f64, f64, f64, f64) {
        match self {
            RegionKind::HeaderIdentifier => (0.70, 0.06, 0.98, 0.13),
            RegionKind::FooterPageNumber => (0.55, 0.93, 0.98, 0.99),
            RegionKind::TopReference => (0.0, 0.0, 1.0, 0.30),
            RegionKind::BottomInvoice => (0.0, 0.70, 1.0, 1.0),
            RegionKind::InvoiceNumber => (0.25, 0.85, 0.50, 0.93),
            RegionKind::QrCode => (0.05, 0.80, 0.30, 0.98),
            RegionKind::Barcode => (0.25, 0.85, 0.56, 0.93),
        }
    }

    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::HeaderIdentifier => "header",
            RegionKind::FooterPageNumber => "footer_page_number",
            RegionKind::TopReference => "top",
            RegionKind::BottomInvoice => "bottom",
            RegionKind::InvoiceNumber => "invoice_number",
            RegionKind::QrCode => "qr",
            RegionKind::Barcode => "barcode",
        }
    }
}

/// A pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Compute the pixel rectangle of `kind` on a `width` x `height` page.
///
/// Dimensions must be positive; the segmenter rejects zero-sized pages
/// before any region is located.
pub fn locate(width: u32, height: u32, kind: RegionKind) -> Region {
    debug_assert!(width > 0 && height > 0, "page dimensions must be positive");

    let (fx0, fy0, fx1, fy1) = kind.fractions();
    let (x0, x1) = span(width, fx0, fx1);
    let (y0, y1) = span(height, fy0, fy1);

    Region { x0, y0, x1, y1 }
}

fn span(extent: u32, start: f64, end: f64) -> (u32, u32) {
    let to_px = |f: f64| ((extent as f64 * f) as u32).min(extent);

    let mut lo = to_px(start);
    let mut hi = to_px(end);

    // Never hand out an empty crop.
    if hi <= lo {
        if lo >= extent {
            lo = extent.saturating_sub(1);
        }
        hi = lo + 1;
    }

    (lo, hi)
}
