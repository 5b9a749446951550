//! Robots.txt handling module
//!
//! This module fetches the crawled host's robots.txt once per run and answers whether a
//! path may be fetched. A robots.txt that cannot be retrieved degrades to an open policy.

mod parser;

pub use parser::RobotsRules;

use reqwest::{Client, StatusCode};
use url::Url;

/// Fetches and parses robots.txt for the origin of `site_url`
///
/// Failures are logged and never fatal: a transport error or a non-200 response yields
/// [`RobotsRules::allow_all`].
pub async fn fetch_robots(client: &Client, site_url: &Url) -> RobotsRules {
    let robots_url = match site_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", site_url, e);
            return RobotsRules::allow_all();
        }
    };

    tracing::debug!("Fetching robots.txt from {}", robots_url);

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}; allowing all paths", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::warn!(
            "{} returned HTTP {}; allowing all paths",
            robots_url,
            response.status().as_u16()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let rules = RobotsRules::parse(&body);
            tracing::info!(
                "Loaded robots.txt with {} disallow rule(s)",
                rules.disallow_rules().len()
            );
            rules
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}; allowing all paths", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}

/// Checks if a URL's path is allowed by the ruleset
pub fn is_allowed(rules: &RobotsRules, url: &Url) -> bool {
    rules.is_allowed(url.path())
}
