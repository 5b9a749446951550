use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variables that override `[crawler]` values
pub const ENV_MAX_PAGES: &str = "MAX_PAGES";
pub const ENV_CONCURRENCY: &str = "CONCURRENCY";
pub const ENV_RATE_LIMIT: &str = "RATE_LIMIT_SEC";

/// Loads and parses a configuration file from the given path
///
/// `MAX_PAGES`, `CONCURRENCY` and `RATE_LIMIT_SEC` from the process environment are
/// applied on top of the file before validation.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ui_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Page budget: {}", config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config = parse_config(&content)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;

    validate(&config)?;

    Ok(config)
}

/// Parses TOML content without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies crawler overrides looked up through `lookup`
///
/// The lookup is injected so callers (and tests) decide where overrides come from.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_MAX_PAGES) {
        config.crawler.max_pages = parse_override(ENV_MAX_PAGES, &value)?;
    }

    if let Some(value) = lookup(ENV_CONCURRENCY) {
        config.crawler.concurrency = parse_override(ENV_CONCURRENCY, &value)?;
    }

    if let Some(value) = lookup(ENV_RATE_LIMIT) {
        config.crawler.rate_limit_seconds = parse_override(ENV_RATE_LIMIT, &value)?;
    }

    Ok(())
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("{} has an invalid value: '{}'", key, value))
    })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a record log can be traced back to the configuration that
/// produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
