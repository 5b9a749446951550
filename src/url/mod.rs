//! URL handling module for UI-Harvest
//!
//! This module provides URL normalization and host filtering. Every URL that enters
//! the frontier or the visited set has been through [`normalize_url`].

mod domain;
mod normalize;

// Re-export main functions
pub use domain::host_allowed;
pub use normalize::normalize_url;
