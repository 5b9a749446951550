//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching, one attempt per URL
//! - HTML extraction of links and UI components
//! - Request scheduling and rate limiting
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use extractor::{extract_components, extract_links};
pub use fetcher::{build_http_client, fetch_url, is_html, FetchResult, ACCEPT_HTML, MAX_REDIRECTS};
pub use scheduler::{FetchCompletion, FetchScheduler};
