//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Loading a saved snapshot or seeding a fresh frontier
//! - Dispatching fetches to a bounded pool of worker tasks
//! - Applying fetch results: storage, extraction and link discovery
//! - Periodic and final checkpoints
//! - Handling interrupts
//!
//! Worker tasks only fetch. Every mutation of the frontier, the visited set and the page
//! counters happens here, on the coordinator's task.

use crate::config::Config;
use crate::crawler::extractor::{extract_components, extract_links};
use crate::crawler::fetcher::{build_http_client, FetchResult};
use crate::crawler::scheduler::{FetchCompletion, FetchScheduler};
use crate::robots::{fetch_robots, is_allowed, RobotsRules};
use crate::state::{CrawlState, RunPhase};
use crate::storage::{open_storage, FileStorage, Storage};
use crate::url::normalize_url;
use crate::HarvestError;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use url::Url;

/// Outcome of one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages stored and recorded during this run
    pub saved: usize,

    /// Size of the visited set at the end of the run
    pub visited: usize,

    /// URLs still pending at the end of the run
    pub frontier: usize,

    /// Dispatched URLs that did not produce a page
    pub failed: usize,

    /// URLs skipped because robots.txt disallows them
    pub robots_skipped: usize,

    /// True if the run ended because of an interrupt
    pub interrupted: bool,

    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    storage: FileStorage,
    scheduler: FetchScheduler,
    state: CrawlState,
    robots: RobotsRules,
    phase: RunPhase,
    saved: usize,
    failed: usize,
    robots_skipped: usize,
    was_interrupted: bool,
    /// Visited insertions since the last checkpoint
    unsaved_marks: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Whether to ignore any saved snapshot and start from the seeds
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Storage could not be opened, the snapshot is corrupt, or the
    ///   HTTP client could not be built
    pub fn new(config: Config, fresh: bool) -> Result<Self, HarvestError> {
        let storage = open_storage(&config.output)?;
        let host = config.site.allowed_host.as_str();
        let seeds = &config.site.seeds;

        let state = if fresh {
            tracing::info!("Fresh start requested, ignoring any saved state");
            CrawlState::seeded(seeds, host)
        } else {
            match storage.load_snapshot()? {
                Some(snapshot) => {
                    let mut state = CrawlState::from_snapshot(&snapshot, host);
                    tracing::info!(
                        "Resuming crawl: {} pending, {} visited",
                        state.frontier_len(),
                        state.visited_len()
                    );
                    if state.frontier_is_empty() {
                        let added = state.offer_seeds(seeds, host);
                        if added > 0 {
                            tracing::info!("Frontier was empty, re-offered {} seed(s)", added);
                        }
                    }
                    state
                }
                None => {
                    tracing::info!("No saved state, seeding frontier from {} seed(s)", seeds.len());
                    CrawlState::seeded(seeds, host)
                }
            }
        };

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let scheduler = FetchScheduler::from_config(client, &config.crawler);

        Ok(Self {
            config,
            storage,
            scheduler,
            state,
            robots: RobotsRules::allow_all(),
            phase: RunPhase::Idle,
            saved: 0,
            failed: 0,
            robots_skipped: 0,
            was_interrupted: false,
            unsaved_marks: 0,
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the main crawl loop
    ///
    /// The loop fills the worker pool from the frontier, then waits for either a fetch to
    /// complete or `shutdown` to flip to true. It ends when nothing is in flight and no more
    /// work may be dispatched: the frontier is empty, the page budget is reached, or an
    /// interrupt was received. A final checkpoint is written before returning `Ok`.
    ///
    /// Persistence errors end the run immediately with no further checkpoint.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlReport, HarvestError> {
        let started = Instant::now();
        self.transition(RunPhase::Running)?;

        tracing::info!(
            "Starting crawl of {} (budget {} pages, concurrency {}, delay {:?})",
            self.config.site.allowed_host,
            self.config.crawler.max_pages,
            self.scheduler.concurrency(),
            self.scheduler.delay()
        );

        self.robots = self.load_robots().await;

        let mut in_flight: JoinSet<FetchCompletion> = JoinSet::new();
        let finished = match self.crawl_loop(&mut in_flight, &mut shutdown).await {
            Ok(()) => self.checkpoint(),
            Err(e) => {
                in_flight.abort_all();
                Err(e)
            }
        };
        if let Err(e) = finished {
            self.transition(RunPhase::Stopped)?;
            tracing::error!("Crawl stopped: {}", e);
            return Err(e);
        }

        self.transition(RunPhase::Stopped)?;

        let report = CrawlReport {
            saved: self.saved,
            visited: self.state.visited_len(),
            frontier: self.state.frontier_len(),
            failed: self.failed,
            robots_skipped: self.robots_skipped,
            interrupted: self.was_interrupted,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Crawl finished: {} saved, {} failed, {} disallowed, {} visited, {} pending, {:.1}s",
            report.saved,
            report.failed,
            report.robots_skipped,
            report.visited,
            report.frontier,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    async fn crawl_loop(
        &mut self,
        in_flight: &mut JoinSet<FetchCompletion>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), HarvestError> {
        let mut shutdown_open = true;

        loop {
            if self.phase == RunPhase::Running && *shutdown.borrow() {
                tracing::warn!(
                    "Interrupt received, waiting for {} in-flight fetch(es)",
                    in_flight.len()
                );
                self.transition(RunPhase::Interrupted)?;
            }

            // Phase 1: fill worker pool
            if self.phase.is_dispatching() {
                self.dispatch(in_flight)?;
            }

            if in_flight.is_empty() {
                if self.phase == RunPhase::Running {
                    if self.saved >= self.config.crawler.max_pages {
                        tracing::info!("Page budget of {} reached", self.config.crawler.max_pages);
                    } else {
                        tracing::info!("Frontier is empty");
                    }
                    self.transition(RunPhase::Draining)?;
                }
                return Ok(());
            }

            // Phase 2: collect a completed fetch or react to the interrupt
            tokio::select! {
                joined = in_flight.join_next() => match joined {
                    Some(Ok(completion)) => self.apply(completion)?,
                    Some(Err(e)) => {
                        self.failed += 1;
                        tracing::warn!("Fetch task failed: {}", e);
                    }
                    None => {}
                },
                changed = shutdown.changed(), if shutdown_open && self.phase.is_dispatching() => {
                    if changed.is_err() {
                        shutdown_open = false;
                    }
                }
            }
        }
    }

    /// Dispatches frontier URLs while a slot is free and the budget allows
    ///
    /// Counting in-flight fetches against the budget means the number of saved pages can
    /// never exceed it, whatever order the fetches complete in.
    fn dispatch(&mut self, in_flight: &mut JoinSet<FetchCompletion>) -> Result<(), HarvestError> {
        let budget = self.config.crawler.max_pages;

        while in_flight.len() < self.scheduler.concurrency() && self.saved + in_flight.len() < budget
        {
            let Some(url) = self.state.pop_frontier() else {
                break;
            };

            if self.state.is_visited(&url) {
                continue;
            }

            if !is_allowed(&self.robots, &url) {
                tracing::debug!("Skipping {} (disallowed by robots.txt)", url);
                self.robots_skipped += 1;
                self.mark_visited(url)?;
                continue;
            }

            self.mark_visited(url.clone())?;

            let scheduler = self.scheduler.clone();
            in_flight.spawn(async move { scheduler.fetch(url).await });
        }

        Ok(())
    }

    /// Applies one fetch result to storage and crawl state
    fn apply(&mut self, completion: FetchCompletion) -> Result<(), HarvestError> {
        let FetchCompletion { url, result } = completion;

        let (final_url, body) = match result {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            FetchResult::ContentMismatch { content_type } => {
                self.failed += 1;
                tracing::warn!("Skipping {}: not HTML ({})", url, content_type);
                return Ok(());
            }
            FetchResult::HttpError { status_code } => {
                self.failed += 1;
                tracing::warn!("Skipping {}: HTTP {}", url, status_code);
                return Ok(());
            }
            FetchResult::NetworkError { error } => {
                self.failed += 1;
                tracing::warn!("Skipping {}: {}", url, error);
                return Ok(());
            }
        };

        let host = self.config.site.allowed_host.clone();

        let final_url = match normalize_url(final_url.as_str(), None, &host) {
            Ok(final_url) => final_url,
            Err(e) => {
                tracing::debug!("Dropping {}: redirect target {} rejected: {}", url, final_url, e);
                return Ok(());
            }
        };

        if final_url != url && !self.mark_visited(final_url.clone())? {
            tracing::debug!("Dropping {}: redirected to already visited {}", url, final_url);
            return Ok(());
        }

        self.storage.store_raw(&final_url, &body)?;
        let record = extract_components(&final_url, &body, &self.config.extraction);
        self.storage.append_record(&record)?;
        self.saved += 1;

        let mut discovered = 0;
        for link in extract_links(&final_url, &body, &host) {
            if self.state.enqueue(link) {
                discovered += 1;
            }
        }

        tracing::info!(
            "Saved {}/{}: {} (+{} links, {} pending, {} visited)",
            self.saved,
            self.config.crawler.max_pages,
            final_url,
            discovered,
            self.state.frontier_len(),
            self.state.visited_len()
        );

        Ok(())
    }

    /// Marks a URL visited, checkpointing every `checkpoint-interval` new entries
    fn mark_visited(&mut self, url: Url) -> Result<bool, HarvestError> {
        if !self.state.mark_visited(url) {
            return Ok(false);
        }

        self.unsaved_marks += 1;
        if self.unsaved_marks >= self.config.crawler.checkpoint_interval {
            self.checkpoint()?;
        }
        Ok(true)
    }

    fn checkpoint(&mut self) -> Result<(), HarvestError> {
        self.storage.checkpoint(&self.state.to_snapshot())?;
        self.unsaved_marks = 0;
        Ok(())
    }

    /// Fetches robots.txt from the origin of the first usable seed
    async fn load_robots(&self) -> RobotsRules {
        let host = &self.config.site.allowed_host;
        let origin = self
            .config
            .site
            .seeds
            .iter()
            .find_map(|seed| normalize_url(seed, None, host).ok());

        match origin {
            Some(origin) => fetch_robots(self.scheduler.client(), &origin).await,
            None => RobotsRules::allow_all(),
        }
    }

    fn transition(&mut self, next: RunPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Run phase {} -> {}", self.phase, next);
        if next == RunPhase::Interrupted {
            self.was_interrupted = true;
        }
        self.phase = next;
        Ok(())
    }
}

/// Runs a complete crawl with an interrupt listener installed
///
/// The first Ctrl+C stops dispatching; in-flight fetches finish and a final checkpoint is
/// written before this returns.
///
/// # Example
///
/// ```no_run
/// use ui_harvest::config::load_config;
/// use ui_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_crawl(config, false).await?;
/// println!("saved {} pages", report.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlReport, HarvestError> {
    let mut coordinator = Coordinator::new(config, fresh)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let listener = tokio::spawn(async move {
        if relay_interrupts(tokio::signal::ctrl_c, shutdown_tx).await {
            tracing::error!("Force quit requested, exiting without a final checkpoint");
            std::process::exit(130);
        }
    });

    let report = coordinator.run(shutdown_rx).await;
    listener.abort();
    report
}

/// Forwards the first interrupt to `shutdown_tx`
///
/// Returns true once a second interrupt arrives, meaning the caller should exit without
/// waiting for in-flight fetches. Returns false if the signal source fails.
async fn relay_interrupts<F, Fut>(mut next_interrupt: F, shutdown_tx: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }

    tracing::warn!("Received Ctrl+C, finishing in-flight fetches before exit (press again to force quit)");
    let _ = shutdown_tx.send(true);

    next_interrupt().await.is_ok()
}
