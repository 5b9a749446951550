//! Summary types and errors
//!
//! This module defines the aggregated view of the record log that the markdown
//! exporter renders, and the errors output operations can return.

use crate::storage::{ComponentRecord, StorageError};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Site-wide aggregation of component records
#[derive(Debug, Clone, Default)]
pub struct SiteSummary {
    /// RFC 3339 timestamp of generation
    pub generated_at: String,

    /// Host the records were crawled from
    pub host: String,

    /// Number of records aggregated
    pub pages: usize,

    /// URLs pending in the last snapshot
    pub pending: usize,

    /// URLs in the last visited snapshot
    pub visited: usize,

    /// Records without a title
    pub untitled: usize,

    /// Class counts summed over every page's histogram
    pub top_classes: Vec<(String, usize)>,

    /// Heading texts by number of occurrences
    pub top_headings: Vec<(String, usize)>,

    pub top_buttons: Vec<(String, usize)>,

    /// Texts of anchors linking to absolute https targets
    pub top_links: Vec<(String, usize)>,

    pub top_image_alts: Vec<(String, usize)>,

    /// (page URL, card text) pairs
    pub card_samples: Vec<(String, String)>,
}

impl SiteSummary {
    /// Aggregates records into a summary
    ///
    /// Every ranked list keeps at most `top` entries; ties keep first-seen order.
    pub fn from_records(records: &[ComponentRecord], top: usize) -> Self {
        let mut classes = Tally::default();
        let mut headings = Tally::default();
        let mut buttons = Tally::default();
        let mut links = Tally::default();
        let mut image_alts = Tally::default();
        let mut card_samples = Vec::new();

        for record in records {
            for (class, count) in &record.top_classes {
                classes.add(class, *count);
            }
            for heading in &record.headings {
                headings.add(heading, 1);
            }
            for button in &record.buttons {
                buttons.add(button, 1);
            }
            for link in &record.links {
                links.add(link, 1);
            }
            for alt in &record.image_alts {
                image_alts.add(alt, 1);
            }
            for card in &record.cards {
                if card_samples.len() < top {
                    card_samples.push((record.url.clone(), card.clone()));
                }
            }
        }

        Self {
            pages: records.len(),
            untitled: records.iter().filter(|r| r.title.is_none()).count(),
            top_classes: classes.top(top),
            top_headings: headings.top(top),
            top_buttons: buttons.top(top),
            top_links: links.top(top),
            top_image_alts: image_alts.top(top),
            card_samples,
            ..Self::default()
        }
    }
}

/// Counter that remembers first-seen order for tie breaking
#[derive(Default)]
struct Tally {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, key: &str, count: usize) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), count));
            }
        }
    }

    fn top(mut self, n: usize) -> Vec<(String, usize)> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries.truncate(n);
        self.entries
    }
}
