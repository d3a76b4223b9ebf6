//! Cleanup of OCR misreads before pattern matching.

/// Literal rewrites applied in order. Earlier entries may produce text that a
/// later entry matches, so the order is part of the contract.
pub const OCR_FIXES: &[(&str, &str)] = &[
    ("N0.", "No."),
    ("N0 ", "No "),
    ("Ref.1nt", "Ref.Int"),
    ("Ref 1nt", "Ref Int"),
    ("1nt.", "Int."),
    ("F4C", "FAC"),
    ("FAC.:", "FAC:"),
    ("Pag1na", "Pagina"),
    ("Pág1na", "Página"),
];

/// Rewrite known OCR confusions in labels.
pub fn normalize_ocr(text: &str) -> String {
    OCR_FIXES
        .iter()
        .fold(text.to_string(), |acc, (wrong, right)| acc.replace(wrong, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_fixes() {
        assert_eq!(normalize_ocr("N0. 206-581544"), "No. 206-581544");
        assert_eq!(normalize_ocr("Ref.1nt. 1234567890"), "Ref.Int. 1234567890");
        assert_eq!(normalize_ocr("Ref 1nt: 12345678"), "Ref Int: 12345678");
        assert_eq!(normalize_ocr("Pág1na 2 de 3"), "Página 2 de 3");
    }

    #[test]
    fn test_order_enables_later_fix() {
        // F4C becomes FAC first, then FAC.: collapses.
        assert_eq!(normalize_ocr("N0 F4C.: 1234567890"), "No FAC: 1234567890");
    }

    #[test]
    fn test_digits_untouched() {
        assert_eq!(normalize_ocr("1234 5678 9012"), "1234 5678 9012");
        assert_eq!(normalize_ocr(""), "");
    }
}
