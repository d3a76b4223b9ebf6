//! "Page N of M" extraction from footer text.

use super::patterns::PAGE_OF;

/// Extract the current page number from a "page N of M" phrase.
///
/// OCR often reads the digit one as `I` or `l`; those are rewritten inside
/// the numeral before parsing. Anything still non-numeric yields `None`.
pub fn extract_page_number(text: &str) -> Option<u32> {
    extract_page_of(text).map(|(page, _)| page)
}

/// Extract both the page number and the page count, if the count parses.
pub fn extract_page_of(text: &str) -> Option<(u32, Option<u32>)> {
    let caps = PAGE_OF.captures(text)?;
    let page = parse_numeral(&caps[1])?;
    Some((page, parse_numeral(&caps[2])))
}

fn parse_numeral(raw: &str) -> Option<u32> {
    let repaired: String = raw
        .chars()
        .map(|c| if c == 'I' || c == 'l' { '1' } else { c })
        .collect();
    repaired.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_footer() {
        assert_eq!(extract_page_number("Página 2 de 5"), Some(2));
        assert_eq!(extract_page_number("PAGINA 12 DE 14"), Some(12));
        assert_eq!(extract_page_number("Pág. 3 de 3"), Some(3));
    }

    #[test]
    fn test_english_footer() {
        assert_eq!(extract_page_number("Page 4 of 9"), Some(4));
    }

    #[test]
    fn test_letter_for_digit_repair() {
        assert_eq!(extract_page_number("Página l de 3"), Some(1));
        assert_eq!(extract_page_number("Pagina I2 de 14"), Some(12));
        assert_eq!(extract_page_of("Pagina 1 de l0"), Some((1, Some(10))));
    }

    #[test]
    fn test_no_phrase() {
        assert_eq!(extract_page_number(""), None);
        assert_eq!(extract_page_number("Total a pagar 1.234"), None);
        assert_eq!(extract_page_number("Página de 3"), None);
    }
}
