//! Page segmentation: routes every page of a batch into an output bucket.
//!
//! Pages are visited strictly in order. Each page is resolved to an optional
//! identifier and footer page number, then folded into a
//! [`SegmentationState`] that repairs missing page numbers and carries the
//! current invoice across pages without a legible identifier. A page whose
//! collaborators fail lands in the `ERROR` bucket and leaves the state alone.

mod report;
mod state;

pub use report::{BatchReport, DocumentSummary, Report};
pub use state::{SegmentationState, Transition};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{ContractError, Result};
use crate::models::{BucketKey, Page};
use crate::resolver::{Resolved, SignalResolver, SignalSource};

/// One page placed in a bucket.
#[derive(Debug, Clone, Copy)]
pub struct BucketEntry<'p> {
    /// Page number after continuity repair.
    pub page_number: u32,
    /// Zero-based position in the input sequence.
    pub page_index: usize,
    /// The page itself.
    pub page: &'p Page,
}

/// Pages sharing one key.
#[derive(Debug, Clone)]
pub struct Bucket<'p> {
    pub key: BucketKey,
    pub entries: Vec<BucketEntry<'p>>,
}

impl<'p> Bucket<'p> {
    fn new(key: BucketKey) -> Self {
        Self {
            key,
            entries: Vec::new(),
        }
    }

    /// Pages in output order.
    pub fn pages(&self) -> impl Iterator<Item = &'p Page> + '_ {
        self.entries.iter().map(|e| e.page)
    }

    /// Page numbers in output order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.page_number).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a run: ordered buckets plus the report.
#[derive(Debug, Clone)]
pub struct Segmentation<'p> {
    buckets: Vec<Bucket<'p>>,
    report: Report,
}

impl<'p> Segmentation<'p> {
    /// Buckets in the order their keys were first seen.
    pub fn buckets(&self) -> &[Bucket<'p>] {
        &self.buckets
    }

    /// Look up a bucket by key.
    pub fn bucket(&self, key: &BucketKey) -> Option<&Bucket<'p>> {
        self.buckets.iter().find(|b| &b.key == key)
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_parts(self) -> (Vec<Bucket<'p>>, Report) {
        (self.buckets, self.report)
    }
}

/// Per-page outcome handed to progress callbacks.
#[derive(Debug, Clone)]
pub struct PageProgress {
    /// Zero-based page index.
    pub index: usize,
    /// Pages in the run.
    pub total: usize,
    /// Bucket the page went to.
    pub key: BucketKey,
    /// Page number assigned to the page.
    pub page_number: u32,
    /// Tier that produced the identifier, if any.
    pub source: Option<SignalSource>,
    /// Failure message for pages routed to `ERROR`.
    pub error: Option<String>,
}

/// What one page yielded before it is folded into the state.
struct Observation {
    resolved: Option<Resolved>,
    page_number: Option<u32>,
}

/// Buckets keyed for lookup, kept in first-seen order.
#[derive(Default)]
struct BucketSet<'p> {
    buckets: Vec<Bucket<'p>>,
    index: HashMap<BucketKey, usize>,
}

impl<'p> BucketSet<'p> {
    fn push(&mut self, key: BucketKey, entry: BucketEntry<'p>) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.buckets.push(Bucket::new(key.clone()));
                self.index.insert(key, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        self.buckets[slot].entries.push(entry);
    }

    fn finish(mut self) -> Vec<Bucket<'p>> {
        // sort_by_key is stable: equal page numbers keep arrival order.
        for bucket in &mut self.buckets {
            bucket.entries.sort_by_key(|e| e.page_number);
        }
        self.buckets
    }
}

/// Splits a page sequence into per-invoice buckets.
pub struct Segmenter {
    resolver: SignalResolver,
    cancel: Option<Arc<AtomicBool>>,
}

impl Segmenter {
    /// Create a segmenter around a resolver.
    pub fn new(resolver: SignalResolver) -> Self {
        Self {
            resolver,
            cancel: None,
        }
    }

    /// Stop between pages once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Segment the pages.
    pub fn segment<'p>(&self, pages: &'p [Page]) -> Result<Segmentation<'p>> {
        self.segment_with_progress(pages, |_| {})
    }

    /// Segment the pages, reporting each page's outcome as it is decided.
    pub fn segment_with_progress<'p, F>(
        &self,
        pages: &'p [Page],
        mut progress: F,
    ) -> Result<Segmentation<'p>>
    where
        F: FnMut(&PageProgress),
    {
        validate(pages)?;

        let start = Instant::now();
        let total = pages.len();
        info!("Segmenting {} pages", total);

        let mut state = SegmentationState::new();
        let mut report = Report::start();
        let mut buckets = BucketSet::default();
        let mut cancelled = false;

        for (index, page) in pages.iter().enumerate() {
            if self.is_cancelled() {
                warn!("Cancelled after {} of {} pages", index, total);
                cancelled = true;
                break;
            }

            let event = match self.observe(page) {
                Ok(observation) => {
                    let source = observation.resolved.as_ref().map(|r| r.source);
                    let identifier = observation.resolved.map(|r| r.identifier);
                    report.record_page(identifier.is_some());

                    let transition = state.advance(identifier, observation.page_number);
                    debug!(
                        "Page {}: {} p.{} ({:?})",
                        index + 1,
                        transition.key,
                        transition.page_number,
                        source
                    );

                    buckets.push(
                        transition.key.clone(),
                        BucketEntry {
                            page_number: transition.page_number,
                            page_index: index,
                            page,
                        },
                    );

                    PageProgress {
                        index,
                        total,
                        key: transition.key,
                        page_number: transition.page_number,
                        source,
                        error: None,
                    }
                }
                Err(e) => {
                    let page_number = (index + 1) as u32;
                    let message = format!("page {}: {}", page_number, e);
                    warn!("{}", message);
                    report.record_error(message.clone());

                    buckets.push(
                        BucketKey::Error,
                        BucketEntry {
                            page_number,
                            page_index: index,
                            page,
                        },
                    );

                    PageProgress {
                        index,
                        total,
                        key: BucketKey::Error,
                        page_number,
                        source: None,
                        error: Some(message),
                    }
                }
            };

            progress(&event);
        }

        let buckets = buckets.finish();
        report.finish(buckets.iter().map(|b| (&b.key, b.len())), cancelled);

        info!(
            "Segmented {} pages into {} buckets in {:?} ({} errors)",
            report.total_pages(),
            report.total_documents(),
            start.elapsed(),
            report.errors().len()
        );

        Ok(Segmentation { buckets, report })
    }

    fn observe(&self, page: &Page) -> Result<Observation> {
        let resolved = self.resolver.resolve_detailed(page)?;
        let page_number = self.resolver.page_number(page)?;
        Ok(Observation {
            resolved,
            page_number,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

fn validate(pages: &[Page]) -> std::result::Result<(), ContractError> {
    if pages.is_empty() {
        return Err(ContractError::NoPages);
    }

    for (index, page) in pages.iter().enumerate() {
        if page.width() == 0 || page.height() == 0 {
            return Err(ContractError::InvalidDimensions {
                index,
                width: page.width(),
                height: page.height(),
            });
        }
    }

    Ok(())
}
