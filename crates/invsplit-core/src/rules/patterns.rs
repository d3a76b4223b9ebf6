//! Fixed regex patterns. Patterns whose digit counts are configurable are
//! compiled by [`super::IdentifierRules`] instead.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Compact header number, e.g. "No. 206-581544"
    pub static ref HEADER_COMPACT: Regex = Regex::new(
        r"(?i)No\.?\s*(\d{3}-\d{5,7})"
    ).unwrap();

    // QR payload field, e.g. "NumFac: 206-581544"
    pub static ref QR_NUMFAC: Regex = Regex::new(
        r"(?i)NumFac\s*:\s*([0-9\-]+)"
    ).unwrap();

    // Barcode payload carrying a labeled number, e.g. "NumFac=2065815440"
    pub static ref BARCODE_NUMFAC: Regex = Regex::new(
        r"(?i)NumFac[:=]?(\d{5,})"
    ).unwrap();

    // Hyphenated number without label, e.g. "206-581544"
    pub static ref HYPHENATED: Regex = Regex::new(
        r"\b(\d{3,}-\d{3,})\b"
    ).unwrap();

    // "Página 2 de 3", "Pagina l de 3", "Page 2 of 3", "Pág. 2 de 3"
    pub static ref PAGE_OF: Regex = Regex::new(
        r"(?i:p[áa]gina|page|p[áa]g\.?)\s*([0-9Il]+)\s*(?i:de|of)\s*([0-9Il]+)"
    ).unwrap();
}
