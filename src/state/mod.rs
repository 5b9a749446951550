//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the frontier queue and visited set, owned by the coordinator
//! - `RunPhase`: the coordinator's lifecycle (idle, running, draining, interrupted, stopped)

mod crawl_state;
mod run_phase;

// Re-export main types
pub use crawl_state::CrawlState;
pub use run_phase::RunPhase;
