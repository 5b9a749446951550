//! Output module for generating crawl summaries and reports
//!
//! This module handles:
//! - Aggregating the component record log into a site summary
//! - Writing that summary as markdown
//! - Reporting crawl statistics

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use summary::{OutputError, OutputResult, SiteSummary};

use crate::storage::Storage;
use std::path::{Path, PathBuf};

/// File name of the markdown summary inside the extracts directory
pub const SUMMARY_FILE: &str = "summary.md";

/// Generates a site summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `host` - The crawled host, shown in the report header
/// * `top` - How many entries each ranked list keeps
///
/// # Returns
///
/// * `Ok(SiteSummary)` - Successfully generated summary
/// * `Err(OutputError)` - The state files or record log could not be read
pub fn generate_summary(
    storage: &dyn Storage,
    host: &str,
    top: usize,
) -> OutputResult<SiteSummary> {
    let records = storage.read_records()?;
    let snapshot = storage.load_snapshot()?.unwrap_or_default();

    let mut summary = SiteSummary::from_records(&records, top);
    summary.generated_at = chrono::Utc::now().to_rfc3339();
    summary.host = host.to_string();
    summary.pending = snapshot.frontier.len();
    summary.visited = snapshot.visited.len();

    Ok(summary)
}

/// Generates the summary and writes it to `<extracts_dir>/summary.md`
///
/// Returns the path written.
pub fn export_summary(
    storage: &dyn Storage,
    host: &str,
    top: usize,
    extracts_dir: &Path,
) -> OutputResult<PathBuf> {
    let summary = generate_summary(storage, host, top)?;
    let path = extracts_dir.join(SUMMARY_FILE);
    generate_markdown_summary(&summary, &path)?;

    tracing::info!(
        "Wrote summary of {} page(s) to {}",
        summary.pages,
        path.display()
    );
    Ok(path)
}
