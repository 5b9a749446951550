//! HTML extraction of links and UI components
//!
//! This module handles parsing fetched HTML to extract:
//! - Same-host links to follow
//! - A component record (title, headings, buttons, CTA anchors, image alts,
//!   class histogram, card-like blocks)
//!
//! Extraction never fails. Malformed markup yields whatever the parser recovered, and a
//! missing value is an empty field.

use crate::config::ExtractionConfig;
use crate::storage::ComponentRecord;
use crate::url::normalize_url;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Extracts canonical same-host links in first-seen order
///
/// Every `<a href>` is resolved against `base_url` and normalized; off-host and
/// non-http(s) targets are dropped silently.
///
/// # Example
///
/// ```
/// use ui_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/events/">Events</a><a href="/events#top">Again</a>"#;
/// let base = Url::parse("https://example.test/").unwrap();
/// let links = extract_links(&base, html, "example.test");
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.test/events");
/// ```
pub fn extract_links(base_url: &Url, html: &str, allowed_host: &str) -> Vec<Url> {
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in select_all(&document, "a[href]") {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match normalize_url(href, Some(base_url), allowed_host) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            Err(e) => tracing::trace!("Dropping link {}: {}", href, e),
        }
    }

    links
}

/// Builds the component record for one page
///
/// # Arguments
///
/// * `url` - Canonical URL of the page (post-redirect)
/// * `html` - The raw document
/// * `limits` - Sample caps and card keywords
pub fn extract_components(url: &Url, html: &str, limits: &ExtractionConfig) -> ComponentRecord {
    let document = Html::parse_document(html);

    let headings = select_all(&document, "h1, h2, h3")
        .into_iter()
        .filter_map(|h| non_empty(element_text(h, "")))
        .collect();

    let buttons = select_all(&document, "button")
        .into_iter()
        .filter_map(|b| non_empty(element_text(b, "")))
        .take(limits.sample_limit)
        .collect();

    let links = select_all(&document, "a")
        .into_iter()
        .filter(|a| {
            a.value()
                .attr("href")
                .map_or(false, |href| href.starts_with("https://"))
        })
        .filter_map(|a| non_empty(element_text(a, "")))
        .take(limits.sample_limit)
        .collect();

    let image_alts = select_all(&document, "img[alt]")
        .into_iter()
        .filter_map(|img| img.value().attr("alt"))
        .filter_map(|alt| non_empty(alt.trim().to_string()))
        .take(limits.sample_limit)
        .collect();

    ComponentRecord {
        url: url.to_string(),
        title: extract_title(&document),
        headings,
        buttons,
        links,
        image_alts,
        top_classes: class_histogram(&document, limits.top_classes),
        cards: card_blocks(&document, limits),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    select_all(document, "title")
        .into_iter()
        .next()
        .and_then(|title| non_empty(element_text(title, "")))
}

/// Counts class tokens across all elements, most frequent first
///
/// Ties keep the order in which the classes first appeared.
fn class_histogram(document: &Html, top: usize) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for element in select_all(document, "[class]") {
        for class in element.value().classes() {
            match index.get(class) {
                Some(&i) => order[i].1 += 1,
                None => {
                    index.insert(class.to_string(), order.len());
                    order.push((class.to_string(), 1));
                }
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.truncate(top);
    order
}

fn card_blocks(document: &Html, limits: &ExtractionConfig) -> Vec<String> {
    let keywords: Vec<String> = limits
        .card_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    select_all(document, "div[class]")
        .into_iter()
        .filter(|div| {
            div.value().classes().any(|class| {
                let class = class.to_lowercase();
                keywords.iter().any(|k| class.contains(k.as_str()))
            })
        })
        .map(|div| truncate_chars(&element_text(div, " "), limits.card_text_chars))
        .take(limits.card_limit)
        .collect()
}

/// Collects matches for a selector; an unparseable selector matches nothing
fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Joins the element's trimmed, non-empty text nodes with `separator`
fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
