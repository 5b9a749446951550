//! Rate-limited fetch scheduling
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Respecting the minimum delay before every request

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// A finished fetch, tagged with the URL that was dispatched
#[derive(Debug)]
pub struct FetchCompletion {
    /// The URL handed to the scheduler (before redirects)
    pub url: Url,

    pub result: FetchResult,
}

/// Runs fetches under a concurrency limit and a per-slot delay
///
/// At most `concurrency` fetches run at once. Each one holds its slot for the delay and
/// then the request, so one slot never issues requests closer together than the delay.
/// Clones share the same slots.
#[derive(Debug, Clone)]
pub struct FetchScheduler {
    client: Client,

    /// Slots available to in-flight fetches
    permits: Arc<Semaphore>,

    concurrency: usize,

    delay: Duration,
}

impl FetchScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client used for every fetch
    /// * `concurrency` - Maximum fetches in flight (treated as at least 1)
    /// * `delay` - Minimum delay before each request
    pub fn new(client: Client, concurrency: usize, delay: Duration) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            client,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            delay,
        }
    }

    pub fn from_config(client: Client, config: &CrawlerConfig) -> Self {
        Self::new(client, config.concurrency, config.rate_limit())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits for a slot, sleeps the delay, then fetches `url` once
    pub async fn fetch(&self, url: Url) -> FetchCompletion {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return FetchCompletion {
                    url,
                    result: FetchResult::NetworkError {
                        error: "Scheduler closed".to_string(),
                    },
                }
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::debug!("Fetching {}", url);
        let result = fetch_url(&self.client, &url).await;

        FetchCompletion { url, result }
    }
}
