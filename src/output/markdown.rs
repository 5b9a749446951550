//! Markdown summary generation
//!
//! This module renders the site-wide aggregation of component records as a
//! human-readable markdown report.

use crate::output::summary::{OutputError, OutputResult, SiteSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary to `output_path`
///
/// # Arguments
///
/// * `summary` - The aggregated summary
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &SiteSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    File::create(output_path)
        .and_then(|mut file| file.write_all(markdown.as_bytes()))
        .map_err(|source| OutputError::Write {
            path: output_path.display().to_string(),
            source,
        })
}

/// Formats a summary as markdown
pub fn format_markdown_summary(summary: &SiteSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# UI Harvest Summary\n\n");

    md.push_str("## Crawl Information\n\n");
    md.push_str(&format!("- **Host**: {}\n", summary.host));
    md.push_str(&format!("- **Generated**: {}\n", summary.generated_at));
    md.push_str(&format!("- **Pages Recorded**: {}\n", summary.pages));
    md.push_str(&format!("- **Pages Without Title**: {}\n", summary.untitled));
    md.push_str(&format!("- **Visited URLs**: {}\n", summary.visited));
    md.push_str(&format!("- **Pending URLs**: {}\n\n", summary.pending));

    push_ranked(&mut md, "Top Classes", "Class", &summary.top_classes);
    push_ranked(&mut md, "Frequent Headings", "Heading", &summary.top_headings);
    push_ranked(&mut md, "Frequent Buttons", "Button", &summary.top_buttons);
    push_ranked(&mut md, "Frequent Link Texts", "Link Text", &summary.top_links);
    push_ranked(&mut md, "Frequent Image Alt Texts", "Alt Text", &summary.top_image_alts);

    if !summary.card_samples.is_empty() {
        md.push_str("## Card-like Blocks\n\n");
        md.push_str("| Page | Text |\n");
        md.push_str("|------|------|\n");
        for (url, text) in &summary.card_samples {
            md.push_str(&format!("| {} | {} |\n", url, escape_cell(text)));
        }
        md.push('\n');
    }

    md
}

fn push_ranked(md: &mut String, title: &str, column: &str, rows: &[(String, usize)]) {
    if rows.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    md.push_str(&format!("| {} | Count |\n", column));
    md.push_str("|------|-------|\n");
    for (text, count) in rows {
        md.push_str(&format!("| {} | {} |\n", escape_cell(text), count));
    }
    md.push('\n');
}

/// Keeps table cells on one line and pipe-safe
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
