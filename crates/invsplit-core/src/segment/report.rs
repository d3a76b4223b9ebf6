//! Run reports.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::BucketKey;

/// Page count of one output bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Bucket key as printed (`UNASSIGNED` and `ERROR` for sentinels).
    pub key: String,
    /// Pages in the bucket.
    pub pages: usize,
}

/// Outcome counters of one segmentation run.
///
/// Built up by the segmenter while it runs and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    total_pages: usize,
    documents_with_code: usize,
    documents_without_code: usize,
    total_documents: usize,
    errors: Vec<String>,
    documents: Vec<DocumentSummary>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cancelled: bool,
}

impl Report {
    pub(crate) fn start() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub(crate) fn record_page(&mut self, has_code: bool) {
        self.total_pages += 1;
        if has_code {
            self.documents_with_code += 1;
        } else {
            self.documents_without_code += 1;
        }
    }

    pub(crate) fn record_error(&mut self, message: String) {
        self.total_pages += 1;
        self.errors.push(message);
    }

    pub(crate) fn finish<'a>(
        &mut self,
        buckets: impl Iterator<Item = (&'a BucketKey, usize)>,
        cancelled: bool,
    ) {
        self.documents = buckets
            .map(|(key, pages)| DocumentSummary {
                key: key.to_string(),
                pages,
            })
            .collect();
        self.total_documents = self.documents.len();
        self.cancelled = cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Pages processed, including failed ones.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Pages on which an identifier was determined.
    pub fn documents_with_code(&self) -> usize {
        self.documents_with_code
    }

    /// Pages on which no identifier was determined.
    pub fn documents_without_code(&self) -> usize {
        self.documents_without_code
    }

    /// Number of output buckets.
    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    /// One message per failed page, in page order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Page count per bucket, in first-seen order.
    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// True if the run stopped early on request.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Totals across several runs, one per input file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_pdfs: usize,
    pub total_pages: usize,
    pub total_documents: usize,
    pub documents_with_code: usize,
    pub documents_without_code: usize,
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file's report. Errors are prefixed with the file name.
    pub fn absorb(&mut self, source: &str, report: &Report) {
        self.total_pdfs += 1;
        self.total_pages += report.total_pages();
        self.total_documents += report.total_documents();
        self.documents_with_code += report.documents_with_code();
        self.documents_without_code += report.documents_without_code();
        self.errors
            .extend(report.errors().iter().map(|e| format!("{}: {}", source, e)));
    }

    /// Record a file that could not be processed at all.
    pub fn record_failure(&mut self, source: &str, error: &str) {
        self.total_pdfs += 1;
        self.errors.push(format!("{}: {}", source, error));
    }

    /// Human-readable summary block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "====== BATCH REPORT ======");
        let _ = writeln!(out, "PDFs processed:          {}", self.total_pdfs);
        let _ = writeln!(out, "Pages processed:         {}", self.total_pages);
        let _ = writeln!(out, "Documents written:       {}", self.total_documents);
        let _ = writeln!(out, "Pages with code:         {}", self.documents_with_code);
        let _ = writeln!(out, "Pages without code:      {}", self.documents_without_code);
        let _ = writeln!(out, "Errors:                  {}", self.errors.len());
        let _ = writeln!(out, "==========================");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identifier;

    #[test]
    fn test_counters() {
        let mut report = Report::start();
        report.record_page(true);
        report.record_page(false);
        report.record_error("page 3: boom".to_string());

        let key = BucketKey::Identifier(Identifier::normalize("123456").unwrap());
        report.finish([(&key, 1), (&BucketKey::Error, 1)].into_iter(), false);

        assert_eq!(report.total_pages(), 3);
        assert_eq!(report.documents_with_code(), 1);
        assert_eq!(report.documents_without_code(), 1);
        assert_eq!(report.total_documents(), 2);
        assert_eq!(report.documents()[1].key, "ERROR");
        assert!(report.started_at() <= report.finished_at());
    }

    #[test]
    fn test_batch_absorb() {
        let mut report = Report::start();
        report.record_page(true);
        report.record_error("page 2: boom".to_string());
        report.finish(std::iter::empty(), false);

        let mut batch = BatchReport::new();
        batch.absorb("a.pdf", &report);
        batch.record_failure("b.pdf", "not a PDF");

        assert_eq!(batch.total_pdfs, 2);
        assert_eq!(batch.total_pages, 2);
        assert_eq!(
            batch.errors,
            vec!["a.pdf: page 2: boom".to_string(), "b.pdf: not a PDF".to_string()]
        );
        assert!(batch.render().contains("Errors:                  2"));
    }
}
