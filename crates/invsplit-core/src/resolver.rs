//! Signal fusion: one identifier per page from QR, barcode and OCR.
//!
//! Sources are consulted in a fixed priority order and the first confident
//! value wins:
//!
//! 1. `NumFac` field of a QR code in the lower left corner.
//! 2. Payload of a 1D barcode in the footer strip.
//! 3. OCR of the header and footer blocks. Every extractor that matches casts
//!    a vote and the most frequent value wins, ties going to the first one
//!    seen. If no extractor matches, the top band and then the bottom band are
//!    read as free text.
//!
//! Values shorter than the configured minimum code length are treated as
//! misreads at every tier.

use serde::Serialize;
use tracing::{debug, trace};

use crate::decode::Decoders;
use crate::error::Result;
use crate::models::{ExtractionConfig, Identifier, Page};
use crate::regions::RegionKind;
use crate::rules::{extract_page_of, normalize_ocr, IdentifierRules};

/// Which tier produced a page's identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Qr,
    Barcode,
    OcrVote,
    TopRegion,
    BottomRegion,
}

/// A resolved identifier and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub identifier: Identifier,
    pub source: SignalSource,
}

/// Resolves identifiers and page numbers for single pages.
pub struct SignalResolver {
    decoders: Decoders,
    rules: IdentifierRules,
    min_code_length: usize,
}

impl SignalResolver {
    /// Create a resolver over the given collaborators.
    pub fn new(decoders: Decoders, config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            decoders,
            rules: IdentifierRules::new(config)?,
            min_code_length: config.min_code_length,
        })
    }

    /// Resolve the page's identifier, or `None` when every tier comes up empty.
    pub fn resolve(&self, page: &Page) -> Result<Option<Identifier>> {
        Ok(self.resolve_detailed(page)?.map(|r| r.identifier))
    }

    /// Like [`resolve`](Self::resolve), also reporting the winning tier.
    pub fn resolve_detailed(&self, page: &Page) -> Result<Option<Resolved>> {
        if let Some(identifier) = self.from_qr(page)? {
            return Ok(Some(Resolved {
                identifier,
                source: SignalSource::Qr,
            }));
        }

        if let Some(identifier) = self.from_barcode(page)? {
            return Ok(Some(Resolved {
                identifier,
                source: SignalSource::Barcode,
            }));
        }

        self.from_ocr(page)
    }

    /// Read the footer page number, if printed and legible.
    pub fn page_number(&self, page: &Page) -> Result<Option<u32>> {
        let text = self.read_text(page, RegionKind::FooterPageNumber)?;
        match extract_page_of(&text) {
            Some((number, count)) => {
                trace!("Footer page number: {} of {:?}", number, count);
                Ok(Some(number))
            }
            None => Ok(None),
        }
    }

    fn from_qr(&self, page: &Page) -> Result<Option<Identifier>> {
        let lines = self.decoders.qr.decode_qr(&page.crop(RegionKind::QrCode))?;
        if lines.is_empty() {
            return Ok(None);
        }

        let candidate = self.rules.from_qr_lines(&lines);
        Ok(self.confident(candidate, "QR"))
    }

    fn from_barcode(&self, page: &Page) -> Result<Option<Identifier>> {
        let payload = self
            .decoders
            .barcode
            .decode_barcode(&page.crop(RegionKind::Barcode))?;

        let candidate = payload.as_deref().and_then(|p| self.rules.from_barcode(p));
        Ok(self.confident(candidate, "barcode"))
    }

    fn from_ocr(&self, page: &Page) -> Result<Option<Resolved>> {
        let header_text = self.read_text(page, RegionKind::HeaderIdentifier)?;
        let invoice_text = self.read_text(page, RegionKind::InvoiceNumber)?;

        let candidates: Vec<Identifier> = [
            self.rules.header_number(&header_text),
            self.rules.reference(&header_text),
            self.rules.invoice_number(&invoice_text),
        ]
        .into_iter()
        .flatten()
        .filter(|id| id.len() >= self.min_code_length)
        .collect();

        debug!("OCR candidates: {:?}", candidates);

        if let Some(identifier) = majority(&candidates) {
            return Ok(Some(Resolved {
                identifier,
                source: SignalSource::OcrVote,
            }));
        }

        for (kind, source) in [
            (RegionKind::TopReference, SignalSource::TopRegion),
            (RegionKind::BottomInvoice, SignalSource::BottomRegion),
        ] {
            let text = self.read_text(page, kind)?;
            let candidate = self.rules.from_text(&text);
            if let Some(identifier) = self.confident(candidate, kind.as_str()) {
                return Ok(Some(Resolved { identifier, source }));
            }
        }

        Ok(None)
    }

    fn read_text(&self, page: &Page, kind: RegionKind) -> Result<String> {
        let raw = self.decoders.ocr.ocr_text(&page.crop(kind))?;
        Ok(normalize_ocr(&raw))
    }

    fn confident(&self, candidate: Option<Identifier>, source: &str) -> Option<Identifier> {
        match candidate {
            Some(id) if id.len() >= self.min_code_length => Some(id),
            Some(id) => {
                debug!(
                    "Discarding short {} value {} (< {} chars)",
                    source, id, self.min_code_length
                );
                None
            }
            None => None,
        }
    }
}

/// Most frequent value; ties go to the value seen first.
pub fn majority(candidates: &[Identifier]) -> Option<Identifier> {
    let mut best: Option<(&Identifier, usize)> = None;

    for (i, candidate) in candidates.iter().enumerate() {
        // Count each distinct value once, at its first occurrence.
        if candidates[..i].contains(candidate) {
            continue;
        }
        let count = candidates.iter().filter(|c| *c == candidate).count();
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((candidate, count));
        }
    }

    best.map(|(id, _)| id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page, ScriptedDecoders};
    use pretty_assertions::assert_eq;

    fn id(value: &str) -> Identifier {
        Identifier::normalize(value).unwrap()
    }

    fn resolver(script: &ScriptedDecoders) -> SignalResolver {
        SignalResolver::new(script.decoders(), &ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_majority_vote() {
        let votes = vec![id("123456789"), id("123456789"), id("999999999")];
        assert_eq!(majority(&votes), Some(id("123456789")));
    }

    #[test]
    fn test_majority_tie_keeps_first_seen() {
        let votes = vec![id("999999999"), id("123456789")];
        assert_eq!(majority(&votes), Some(id("999999999")));

        let votes = vec![id("111111111"), id("222222222"), id("222222222"), id("111111111")];
        assert_eq!(majority(&votes), Some(id("111111111")));

        assert_eq!(majority(&[]), None);
    }

    #[test]
    fn test_qr_beats_barcode() {
        let script = ScriptedDecoders::new()
            .qr(1, &["NumFac: 2065815440"])
            .barcode(1, "9999999999");

        let resolved = resolver(&script).resolve_detailed(&page(1)).unwrap().unwrap();
        assert_eq!(resolved.identifier, id("2065815440"));
        assert_eq!(resolved.source, SignalSource::Qr);
        assert_eq!(script.ocr_calls(), 0);
    }

    #[test]
    fn test_barcode_used_when_qr_has_no_numfac() {
        let script = ScriptedDecoders::new()
            .qr(1, &["https://example.com/invoice"])
            .barcode(1, "2065815440");

        let resolved = resolver(&script).resolve_detailed(&page(1)).unwrap().unwrap();
        assert_eq!(resolved.identifier, id("2065815440"));
        assert_eq!(resolved.source, SignalSource::Barcode);
    }

    #[test]
    fn test_short_qr_value_falls_back_to_barcode() {
        // "12-3" reads as 1203, under the minimum code length.
        let script = ScriptedDecoders::new()
            .qr(1, &["NumFac: 12-3"])
            .barcode(1, "2065815440");

        let resolved = resolver(&script).resolve_detailed(&page(1)).unwrap().unwrap();
        assert_eq!(resolved.identifier, id("2065815440"));
        assert_eq!(resolved.source, SignalSource::Barcode);
    }

    #[test]
    fn test_short_barcode_falls_back_to_ocr() {
        let script = ScriptedDecoders::new()
            .barcode(1, "1234")
            .text(1, RegionKind::InvoiceNumber, "No. FAC: 55566677");

        let resolved = resolver(&script).resolve_detailed(&page(1)).unwrap().unwrap();
        assert_eq!(resolved.identifier, id("55566677"));
        assert_eq!(resolved.source, SignalSource::OcrVote);
    }

    #[test]
    fn test_ocr_majority_across_regions() {
        let script = ScriptedDecoders::new()
            .text(
                1,
                RegionKind::HeaderIdentifier,
                "No. 123-456789\nRef. Int. 1230456789",
            )
            .text(1, RegionKind::InvoiceNumber, "No. FAC 999999999");

        // Header compact reads 1230456789 (hyphen as zero) and agrees with Ref. Int.
        assert_eq!(
            resolver(&script).resolve(&page(1)).unwrap(),
            Some(id("1230456789"))
        );
    }

    #[test]
    fn test_ocr_normalizes_before_matching() {
        let script = ScriptedDecoders::new()
            .text(1, RegionKind::HeaderIdentifier, "Ref.1nt. 12345678");

        assert_eq!(
            resolver(&script).resolve(&page(1)).unwrap(),
            Some(id("12345678"))
        );
    }

    #[test]
    fn test_top_then_bottom_fallback() {
        let script = ScriptedDecoders::new()
            .text(1, RegionKind::TopReference, "Factura No 1234567890")
            .text(1, RegionKind::BottomInvoice, "No. FAC 5555555555")
            .text(2, RegionKind::BottomInvoice, "No. FAC 5555555555");
        let resolver = resolver(&script);

        let top = resolver.resolve_detailed(&page(1)).unwrap().unwrap();
        assert_eq!(top.identifier, id("1234567890"));
        assert_eq!(top.source, SignalSource::TopRegion);

        let bottom = resolver.resolve_detailed(&page(2)).unwrap().unwrap();
        assert_eq!(bottom.identifier, id("5555555555"));
        assert_eq!(bottom.source, SignalSource::BottomRegion);
    }

    #[test]
    fn test_nothing_found() {
        let script = ScriptedDecoders::new().barcode(1, "12");
        assert_eq!(resolver(&script).resolve(&page(1)).unwrap(), None);
    }

    #[test]
    fn test_collaborator_failure_propagates() {
        let script = ScriptedDecoders::new().fail(1);
        assert!(resolver(&script).resolve(&page(1)).is_err());
    }

    #[test]
    fn test_page_number_from_footer() {
        let script = ScriptedDecoders::new()
            .text(1, RegionKind::FooterPageNumber, "Pag1na 2 de 4");
        assert_eq!(resolver(&script).page_number(&page(1)).unwrap(), Some(2));
        assert_eq!(resolver(&script).page_number(&page(2)).unwrap(), None);
    }
}
