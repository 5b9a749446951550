//! Statistics generation from crawl data
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::Storage;
use crate::HarvestError;
use std::collections::HashSet;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Whether a state snapshot exists
    pub has_snapshot: bool,

    /// URLs waiting in the frontier snapshot
    pub pending: usize,

    /// URLs in the visited snapshot
    pub visited: usize,

    /// Lines in the record log
    pub records: usize,

    /// Files in the raw document store
    pub raw_documents: usize,

    /// Distinct class names across all records
    pub distinct_classes: usize,

    /// Records with at least one card-like block
    pub pages_with_cards: usize,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to read
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - A state file is unreadable or corrupt
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, HarvestError> {
    let snapshot = storage.load_snapshot()?;
    let records = storage.read_records()?;

    let distinct_classes = records
        .iter()
        .flat_map(|r| r.top_classes.iter().map(|(class, _)| class.as_str()))
        .collect::<HashSet<_>>()
        .len();

    let pages_with_cards = records.iter().filter(|r| !r.cards.is_empty()).count();

    Ok(CrawlStatistics {
        has_snapshot: snapshot.is_some(),
        pending: snapshot.as_ref().map_or(0, |s| s.frontier.len()),
        visited: snapshot.as_ref().map_or(0, |s| s.visited.len()),
        records: records.len(),
        raw_documents: storage.count_raw_documents()?,
        distinct_classes,
        pages_with_cards,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `budget` - The configured page budget, for progress
pub fn print_statistics(stats: &CrawlStatistics, budget: usize) {
    println!("=== Crawl Statistics ===\n");

    if !stats.has_snapshot {
        println!("No saved crawl state.\n");
    }

    println!("Crawl State:");
    println!("  Pending URLs: {}", stats.pending);
    println!("  Visited URLs: {}", stats.visited);
    println!();

    println!("Stored Data:");
    println!("  Component records: {}", stats.records);
    println!("  Raw documents: {}", stats.raw_documents);
    println!("  Distinct classes: {}", stats.distinct_classes);
    println!("  Pages with card-like blocks: {}", stats.pages_with_cards);
    println!();

    let progress = if budget > 0 {
        (stats.records as f64 / budget as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Budget: {:.1}% ({} / {} pages recorded)",
        progress, stats.records, budget
    );
}
