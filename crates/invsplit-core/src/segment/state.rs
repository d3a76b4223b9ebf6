//! Cross-page segmentation state.

use tracing::info;

use crate::models::{BucketKey, Identifier};

/// Running state of one segmentation run.
#[derive(Debug, Clone, Default)]
pub struct SegmentationState {
    current_identifier: Option<Identifier>,
    previous_identifier: Option<Identifier>,
    last_page_number: Option<u32>,
}

/// Where a page goes and what number it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Bucket receiving the page.
    pub key: BucketKey,
    /// Page number after continuity repair.
    pub page_number: u32,
    /// True when this page opened a document.
    pub starts_document: bool,
}

impl SegmentationState {
    /// Fresh state for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the document currently being filled.
    pub fn current_identifier(&self) -> Option<&Identifier> {
        self.current_identifier.as_ref()
    }

    /// Apply one page's resolved identifier and footer page number.
    pub fn advance(&mut self, identifier: Option<Identifier>, page_number: Option<u32>) -> Transition {
        // A new document restarts numbering, so clear before repairing.
        let starts_document = match &identifier {
            Some(id) if self.previous_identifier.as_ref() != Some(id) => {
                self.last_page_number = None;
                true
            }
            _ => false,
        };

        let page_number = match (page_number, self.last_page_number) {
            (Some(n), _) => n,
            // A misread footer can leave u32::MAX behind.
            (None, Some(last)) => last.saturating_add(1),
            (None, None) => 1,
        };
        self.last_page_number = Some(page_number);

        let key = match identifier {
            Some(id) => {
                if starts_document {
                    info!("New document {}", id);
                }
                self.current_identifier = Some(id.clone());
                self.previous_identifier = Some(id.clone());
                BucketKey::Identifier(id)
            }
            None => self
                .current_identifier
                .clone()
                .map(BucketKey::Identifier)
                .unwrap_or(BucketKey::Unassigned),
        };

        Transition {
            key,
            page_number,
            starts_document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(value: &str) -> Option<Identifier> {
        Identifier::normalize(value)
    }

    fn key(value: &str) -> BucketKey {
        BucketKey::Identifier(Identifier::normalize(value).unwrap())
    }

    #[test]
    fn test_continuity_repair() {
        let mut state = SegmentationState::new();
        assert_eq!(state.advance(id("111111"), Some(1)).page_number, 1);
        assert_eq!(state.advance(None, None).page_number, 2);
        assert_eq!(state.advance(None, Some(3)).page_number, 3);
    }

    #[test]
    fn test_first_page_without_number_is_one() {
        let mut state = SegmentationState::new();
        let t = state.advance(None, None);
        assert_eq!(t.page_number, 1);
        assert_eq!(t.key, BucketKey::Unassigned);
        assert!(!t.starts_document);
    }

    #[test]
    fn test_identifier_change_resets_numbering() {
        let mut state = SegmentationState::new();
        state.advance(id("AAAAAA"), Some(1));
        state.advance(id("AAAAAA"), Some(2));

        let t = state.advance(id("BBBBBB"), None);
        assert_eq!(t.page_number, 1);
        assert_eq!(t.key, key("BBBBBB"));
        assert!(t.starts_document);
    }

    #[test]
    fn test_same_identifier_continues_document() {
        let mut state = SegmentationState::new();
        assert!(state.advance(id("AAAAAA"), None).starts_document);

        let t = state.advance(id("AAAAAA"), None);
        assert!(!t.starts_document);
        assert_eq!(t.page_number, 2);
    }

    #[test]
    fn test_missing_identifier_keeps_current() {
        let mut state = SegmentationState::new();
        assert_eq!(state.advance(None, Some(1)).key, BucketKey::Unassigned);
        state.advance(id("AAAAAA"), Some(1));

        let t = state.advance(None, None);
        assert_eq!(t.key, key("AAAAAA"));
        assert_eq!(t.page_number, 2);

        // Recovering the same identifier after a miss is not a new document.
        let t = state.advance(id("AAAAAA"), None);
        assert!(!t.starts_document);
        assert_eq!(t.page_number, 3);
        assert_eq!(state.current_identifier(), id("AAAAAA").as_ref());
    }

    #[test]
    fn test_repair_after_huge_footer_number_saturates() {
        let mut state = SegmentationState::new();
        assert_eq!(state.advance(id("1111111111"), Some(u32::MAX)).page_number, u32::MAX);

        let t = state.advance(None, None);
        assert_eq!(t.page_number, u32::MAX);
        assert_eq!(t.key, key("1111111111"));
    }
}
