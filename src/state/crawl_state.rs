//! Frontier queue and visited set
//!
//! `CrawlState` is an owned value: the coordinator holds the only instance during a run
//! and hands a [`CrawlSnapshot`] to storage when it checkpoints.

use crate::storage::CrawlSnapshot;
use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Pending and dispatched canonical URLs
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    /// FIFO of URLs waiting to be dispatched
    frontier: VecDeque<Url>,

    /// Membership index for `frontier`
    queued: HashSet<Url>,

    /// URLs that have been dispatched, whatever the outcome
    visited: HashSet<Url>,
}

impl CrawlState {
    /// Creates an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state whose frontier holds the normalized seeds
    ///
    /// Seeds rejected by the normalizer are logged and skipped.
    pub fn seeded(seeds: &[String], allowed_host: &str) -> Self {
        let mut state = Self::new();
        state.offer_seeds(seeds, allowed_host);
        state
    }

    /// Rebuilds state from a snapshot, re-normalizing every entry
    pub fn from_snapshot(snapshot: &CrawlSnapshot, allowed_host: &str) -> Self {
        let mut state = Self::new();

        for raw in &snapshot.visited {
            match normalize_url(raw, None, allowed_host) {
                Ok(url) => {
                    state.visited.insert(url);
                }
                Err(e) => tracing::warn!("Dropping visited entry {}: {}", raw, e),
            }
        }

        for raw in &snapshot.frontier {
            match normalize_url(raw, None, allowed_host) {
                Ok(url) => {
                    state.enqueue(url);
                }
                Err(e) => tracing::warn!("Dropping frontier entry {}: {}", raw, e),
            }
        }

        state
    }

    /// Enqueues every seed that is not already queued or visited
    ///
    /// Returns how many seeds were added.
    pub fn offer_seeds(&mut self, seeds: &[String], allowed_host: &str) -> usize {
        let mut added = 0;
        for seed in seeds {
            match normalize_url(seed, None, allowed_host) {
                Ok(url) => {
                    if self.enqueue(url) {
                        added += 1;
                    }
                }
                Err(e) => tracing::warn!("Skipping seed {}: {}", seed, e),
            }
        }
        added
    }

    /// Copies the state into its persisted form
    ///
    /// The frontier keeps FIFO order; visited is sorted so snapshots diff cleanly.
    pub fn to_snapshot(&self) -> CrawlSnapshot {
        let mut visited: Vec<String> = self.visited.iter().map(|u| u.to_string()).collect();
        visited.sort();

        CrawlSnapshot {
            frontier: self.frontier.iter().map(|u| u.to_string()).collect(),
            visited,
        }
    }

    /// Appends a URL unless it is already queued or visited
    pub fn enqueue(&mut self, url: Url) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.frontier.push_back(url);
        true
    }

    /// Removes the oldest pending URL
    pub fn pop_frontier(&mut self) -> Option<Url> {
        let url = self.frontier.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    /// Records a URL as dispatched; returns false if it already was
    pub fn mark_visited(&mut self, url: Url) -> bool {
        self.visited.insert(url)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn frontier_is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Pending URLs in dispatch order
    pub fn frontier(&self) -> impl Iterator<Item = &Url> {
        self.frontier.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "example.test";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_seeded_normalizes_and_dedups() {
        let seeds = vec![
            "https://example.test/".to_string(),
            "https://example.test/#top".to_string(),
            "https://example.test/events/".to_string(),
            "https://elsewhere.org/".to_string(),
        ];
        let state = CrawlState::seeded(&seeds, HOST);

        let frontier: Vec<String> = state.frontier().map(|u| u.to_string()).collect();
        assert_eq!(
            frontier,
            vec!["https://example.test/", "https://example.test/events"]
        );
        assert_eq!(state.visited_len(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut state = CrawlState::new();
        state.enqueue(url("https://example.test/a"));
        state.enqueue(url("https://example.test/b"));
        state.enqueue(url("https://example.test/c"));

        assert_eq!(state.pop_frontier(), Some(url("https://example.test/a")));
        assert_eq!(state.pop_frontier(), Some(url("https://example.test/b")));
        assert_eq!(state.pop_frontier(), Some(url("https://example.test/c")));
        assert_eq!(state.pop_frontier(), None);
    }

    #[test]
    fn test_enqueue_rejects_queued_and_visited() {
        let mut state = CrawlState::new();
        assert!(state.enqueue(url("https://example.test/a")));
        assert!(!state.enqueue(url("https://example.test/a")));

        state.mark_visited(url("https://example.test/b"));
        assert!(!state.enqueue(url("https://example.test/b")));
        assert_eq!(state.frontier_len(), 1);
    }

    #[test]
    fn test_popped_url_can_be_requeued_until_visited() {
        let mut state = CrawlState::new();
        state.enqueue(url("https://example.test/a"));
        let popped = state.pop_frontier().unwrap();
        assert!(!state.queued.contains(&popped));

        state.mark_visited(popped.clone());
        assert!(!state.enqueue(popped));
    }

    #[test]
    fn test_mark_visited_reports_first_insert() {
        let mut state = CrawlState::new();
        assert!(state.mark_visited(url("https://example.test/a")));
        assert!(!state.mark_visited(url("https://example.test/a")));
        assert_eq!(state.visited_len(), 1);
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_order() {
        let mut state = CrawlState::new();
        state.enqueue(url("https://example.test/z"));
        state.enqueue(url("https://example.test/a"));
        state.mark_visited(url("https://example.test/m"));
        state.mark_visited(url("https://example.test/b"));

        let snapshot = state.to_snapshot();
        assert_eq!(
            snapshot.frontier,
            vec!["https://example.test/z", "https://example.test/a"]
        );
        assert_eq!(
            snapshot.visited,
            vec!["https://example.test/b", "https://example.test/m"]
        );

        let restored = CrawlState::from_snapshot(&snapshot, HOST);
        assert_eq!(restored.to_snapshot(), snapshot);
    }

    #[test]
    fn test_from_snapshot_drops_visited_from_frontier() {
        let snapshot = CrawlSnapshot {
            frontier: vec![
                "https://example.test/a".to_string(),
                "https://example.test/b".to_string(),
            ],
            visited: vec!["https://example.test/a".to_string()],
        };
        let state = CrawlState::from_snapshot(&snapshot, HOST);
        let frontier: Vec<String> = state.frontier().map(|u| u.to_string()).collect();
        assert_eq!(frontier, vec!["https://example.test/b"]);
    }

    #[test]
    fn test_offer_seeds_skips_visited() {
        let mut state = CrawlState::new();
        state.mark_visited(url("https://example.test/"));
        let added = state.offer_seeds(
            &[
                "https://example.test/".to_string(),
                "https://example.test/about".to_string(),
            ],
            HOST,
        );
        assert_eq!(added, 1);
        assert_eq!(state.frontier_len(), 1);
    }
}
