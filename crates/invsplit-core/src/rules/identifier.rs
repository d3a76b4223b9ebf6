//! Invoice identifier extraction.
//!
//! Each convention printed on the invoices gets its own extractor. The
//! region-targeted extractors (header, reference, invoice number) feed the
//! OCR vote; the free-text chain is used on the wide top and bottom bands
//! when the targeted regions produce nothing.

use regex::Regex;
use tracing::trace;

use crate::error::{Result, SplitError};
use crate::models::{ExtractionConfig, Identifier};

use super::patterns::{BARCODE_NUMFAC, HEADER_COMPACT, HYPHENATED, QR_NUMFAC};
use super::{ExtractionMatch, FieldExtractor};

/// Longest barcode payload still considered an identifier.
const MAX_BARCODE_PAYLOAD: usize = 40;

/// Identifier conventions known to the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// `No. 206-581544` in the header block.
    HeaderCompact,
    /// `Ref. Int. 12345678` in the header block.
    Reference,
    /// `No. FAC 12345678` in the footer block.
    InvoiceNumber,
    /// `No. FAC` / `Factura No` with the long primary digit floor.
    PrimaryInvoice,
    /// `Ref. Int` with the long primary digit floor.
    PrimaryReference,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::HeaderCompact => "header_compact",
            LabelKind::Reference => "reference",
            LabelKind::InvoiceNumber => "invoice_number",
            LabelKind::PrimaryInvoice => "primary_invoice",
            LabelKind::PrimaryReference => "primary_reference",
        }
    }
}

/// Extracts the digits following one label convention.
#[derive(Debug, Clone)]
pub struct LabelExtractor {
    kind: LabelKind,
    patterns: Vec<Regex>,
    hyphen_as_zero: bool,
}

impl LabelExtractor {
    fn new(kind: LabelKind, patterns: Vec<Regex>) -> Self {
        Self {
            kind,
            patterns,
            hyphen_as_zero: false,
        }
    }

    fn with_hyphen_as_zero(mut self, enabled: bool) -> Self {
        self.hyphen_as_zero = enabled;
        self
    }

    fn to_identifier(&self, raw: &str) -> Option<Identifier> {
        if self.hyphen_as_zero {
            Identifier::normalize(&raw.replace('-', "0"))
        } else {
            Identifier::normalize(raw)
        }
    }
}

impl FieldExtractor for LabelExtractor {
    type Output = ExtractionMatch<Identifier>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let (Some(full_match), Some(group)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if let Some(id) = self.to_identifier(group.as_str()) {
                    results.push(
                        ExtractionMatch::new(id, self.kind.as_str(), full_match.as_str())
                            .with_position(full_match.start(), full_match.end()),
                    );
                }
            }
        }

        results
    }
}

/// All identifier extractors, compiled from the configured thresholds.
#[derive(Debug, Clone)]
pub struct IdentifierRules {
    header: LabelExtractor,
    reference: LabelExtractor,
    invoice_number: LabelExtractor,
    primary_invoice: LabelExtractor,
    primary_reference: LabelExtractor,
    bare_digits: Regex,
    hyphen_as_zero: bool,
}

impl IdentifierRules {
    /// Compile the extractors for the given thresholds.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        if config.secondary_min_digits == 0 || config.secondary_min_digits > config.max_label_digits {
            return Err(SplitError::Config(format!(
                "secondary_min_digits ({}) must be between 1 and max_label_digits ({})",
                config.secondary_min_digits, config.max_label_digits
            )));
        }
        if config.primary_min_digits == 0 || config.bare_min_digits == 0 {
            return Err(SplitError::Config(
                "digit floors must be at least 1".to_string(),
            ));
        }

        let targeted = format!(
            r"\s*[:\-]?\s*(\d{{{},{}}})",
            config.secondary_min_digits, config.max_label_digits
        );
        let primary = format!(r"\s*[:\-]?\s*(\d{{{},}})", config.primary_min_digits);

        let header = LabelExtractor::new(LabelKind::HeaderCompact, vec![HEADER_COMPACT.clone()])
            .with_hyphen_as_zero(config.hyphen_as_zero);
        let reference = LabelExtractor::new(
            LabelKind::Reference,
            vec![compile(&format!(r"(?i)Ref\.?\s*Int\.?{}", targeted))?],
        );
        let invoice_number = LabelExtractor::new(
            LabelKind::InvoiceNumber,
            vec![compile(&format!(r"(?i)No\.?\s*FAC\.?{}", targeted))?],
        );
        let primary_invoice = LabelExtractor::new(
            LabelKind::PrimaryInvoice,
            vec![
                compile(&format!(r"(?i)No\.?\s*FAC\.?{}", primary))?,
                compile(&format!(r"(?i)Factura\s*N[oº°]?\.?{}", primary))?,
            ],
        );
        let primary_reference = LabelExtractor::new(
            LabelKind::PrimaryReference,
            vec![compile(&format!(r"(?i)Ref\.?\s*Int\.?{}", primary))?],
        );
        let bare_digits = compile(&format!(r"\b\d{{{},}}\b", config.bare_min_digits))?;

        Ok(Self {
            header,
            reference,
            invoice_number,
            primary_invoice,
            primary_reference,
            bare_digits,
            hyphen_as_zero: config.hyphen_as_zero,
        })
    }

    /// Header compact number (`No. NNN-NNNNNN`), hyphen rewritten per config.
    pub fn header_number(&self, text: &str) -> Option<Identifier> {
        self.header.extract(text).map(|m| m.value)
    }

    /// Internal reference (`Ref. Int`) from a targeted region.
    pub fn reference(&self, text: &str) -> Option<Identifier> {
        self.reference.extract(text).map(|m| m.value)
    }

    /// Invoice number (`No. FAC`) from a targeted region.
    pub fn invoice_number(&self, text: &str) -> Option<Identifier> {
        self.invoice_number.extract(text).map(|m| m.value)
    }

    /// Free-text chain: primary labels, then the reference label, then a bare
    /// digit run, then a hyphenated number.
    pub fn from_text(&self, text: &str) -> Option<Identifier> {
        for extractor in [&self.primary_invoice, &self.primary_reference] {
            if let Some(m) = extractor.extract(text) {
                trace!("Free text matched {} rule: {:?}", m.rule, m.source);
                return Some(m.value);
            }
        }

        if let Some(m) = self.bare_digits.find(text) {
            trace!("Free text matched bare digits: {}", m.as_str());
            return Identifier::normalize(m.as_str());
        }

        HYPHENATED
            .captures(text)
            .and_then(|caps| Identifier::normalize(&caps[1]))
    }

    /// `NumFac:` value from the lines of a decoded QR code.
    pub fn from_qr_lines(&self, lines: &[String]) -> Option<Identifier> {
        let joined = lines.join("\n");
        let caps = QR_NUMFAC.captures(&joined)?;
        let raw = caps[1].replace(' ', "");

        if self.hyphen_as_zero {
            Identifier::normalize(&raw.replace('-', "0"))
        } else {
            Identifier::normalize(&raw)
        }
    }

    /// Identifier from a 1D barcode payload.
    ///
    /// Payloads are expected to be the bare number; a `NumFac` label is
    /// unwrapped when present. Long or multi-line payloads belong to other
    /// symbols and are rejected.
    pub fn from_barcode(&self, payload: &str) -> Option<Identifier> {
        let trimmed = payload.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_BARCODE_PAYLOAD || trimmed.contains('\n') {
            return None;
        }

        let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some(caps) = BARCODE_NUMFAC.captures(&compact) {
            return Identifier::normalize(&caps[1]);
        }

        Identifier::normalize(&compact)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SplitError::Config(format!("invalid pattern {}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules() -> IdentifierRules {
        IdentifierRules::new(&ExtractionConfig::default()).unwrap()
    }

    fn id(value: &str) -> Option<Identifier> {
        Identifier::normalize(value)
    }

    #[test]
    fn test_header_hyphen_becomes_zero() {
        let rules = rules();
        assert_eq!(rules.header_number("FACTURA No. 206-581544"), id("2060581544"));
        assert_eq!(rules.header_number("No 206-5815"), None);
    }

    #[test]
    fn test_header_hyphen_dropped_when_disabled() {
        let config = ExtractionConfig {
            hyphen_as_zero: false,
            ..Default::default()
        };
        let rules = IdentifierRules::new(&config).unwrap();
        assert_eq!(rules.header_number("No. 206-581544"), id("206581544"));
    }

    #[test]
    fn test_reference_digit_window() {
        let rules = rules();
        assert_eq!(rules.reference("Ref. Int.: 12345678"), id("12345678"));
        assert_eq!(rules.reference("Ref.Int - 1234567"), None);
        // Captures at most thirteen digits.
        assert_eq!(
            rules.reference("Ref Int 123456789012345"),
            id("1234567890123")
        );
    }

    #[test]
    fn test_invoice_number_label() {
        let rules = rules();
        assert_eq!(rules.invoice_number("No. FAC: 987654321"), id("987654321"));
        assert_eq!(rules.invoice_number("no fac 12345678"), id("12345678"));
        assert_eq!(rules.invoice_number("Total 987654321"), None);
    }

    #[test]
    fn test_free_text_priority() {
        let rules = rules();

        // Primary label beats an earlier bare run.
        let text = "Cliente 55555555\nFactura No: 1234567890";
        assert_eq!(rules.from_text(text), id("1234567890"));

        // Primary labels need ten digits; fall through to the bare run.
        assert_eq!(rules.from_text("No. FAC 123456789"), id("123456789"));

        // Reference label with ten digits.
        assert_eq!(rules.from_text("Ref. Int. 9876543210"), id("9876543210"));

        // Hyphenated as the last resort, hyphen removed.
        assert_eq!(rules.from_text("Doc 206-581544"), id("206581544"));

        assert_eq!(rules.from_text("sin datos 1234"), None);
    }

    #[test]
    fn test_qr_numfac() {
        let rules = rules();
        let lines = vec![
            "NitFac: 900123456".to_string(),
            "NumFac: 206-581544".to_string(),
        ];
        assert_eq!(rules.from_qr_lines(&lines), id("2060581544"));
        assert_eq!(rules.from_qr_lines(&["https://example.com".to_string()]), None);
        assert_eq!(rules.from_qr_lines(&[]), None);
    }

    #[test]
    fn test_barcode_payload() {
        let rules = rules();
        assert_eq!(rules.from_barcode(" 2065815440 "), id("2065815440"));
        assert_eq!(rules.from_barcode("NumFac=2065815440"), id("2065815440"));
        assert_eq!(rules.from_barcode(""), None);
        assert_eq!(rules.from_barcode(&"9".repeat(41)), None);
        assert_eq!(rules.from_barcode("12\n34"), None);
    }

    #[test]
    fn test_extract_all_reports_positions() {
        let rules = rules();
        let matches = rules.invoice_number.extract_all("No FAC 11111111 / No FAC 22222222");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].rule, "invoice_number");
        assert_eq!(matches[0].position, Some((0, 15)));
        assert_eq!(matches[1].value.as_str(), "22222222");
    }

    #[test]
    fn test_invalid_thresholds() {
        let config = ExtractionConfig {
            secondary_min_digits: 14,
            ..Default::default()
        };
        assert!(matches!(
            IdentifierRules::new(&config),
            Err(SplitError::Config(_))
        ));
    }
}
