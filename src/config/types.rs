use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for UI-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of successfully saved pages after which the crawl stops
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Maximum number of fetches in flight at once
    pub concurrency: usize,

    /// Delay applied before every dispatch, per concurrency slot (seconds)
    #[serde(rename = "rate-limit-seconds")]
    pub rate_limit_seconds: f64,

    /// Total timeout for a single request (seconds)
    #[serde(rename = "request-timeout-seconds")]
    pub request_timeout_seconds: f64,

    /// Checkpoint the crawl state every N visited URLs
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
}

impl CrawlerConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs_f64(self.rate_limit_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_seconds)
    }
}

fn default_checkpoint_interval() -> usize {
    10
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// The single host being crawled and where the crawl starts
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Hosts equal to or ending with this value are crawlable
    #[serde(rename = "allowed-host")]
    pub allowed_host: String,

    /// Ordered seed URLs used when no snapshot exists
    pub seeds: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory; raw documents, snapshots and extracts live beneath it
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

impl OutputConfig {
    pub fn html_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("html")
    }

    pub fn state_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("state")
    }

    pub fn extracts_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("extracts")
    }
}

/// Bounds applied while extracting component records
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Cap for buttons, CTA anchors and image alt texts
    #[serde(rename = "sample-limit", default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Number of classes kept in the frequency histogram
    #[serde(rename = "top-classes", default = "default_top_classes")]
    pub top_classes: usize,

    /// Cap for card-like text blocks
    #[serde(rename = "card-limit", default = "default_card_limit")]
    pub card_limit: usize,

    /// Character budget for a single card-like block
    #[serde(rename = "card-text-chars", default = "default_card_text_chars")]
    pub card_text_chars: usize,

    /// Class-name fragments that mark a block as card-like
    #[serde(rename = "card-keywords", default = "default_card_keywords")]
    pub card_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_limit: default_sample_limit(),
            top_classes: default_top_classes(),
            card_limit: default_card_limit(),
            card_text_chars: default_card_text_chars(),
            card_keywords: default_card_keywords(),
        }
    }
}

fn default_sample_limit() -> usize {
    40
}

fn default_top_classes() -> usize {
    40
}

fn default_card_limit() -> usize {
    20
}

fn default_card_text_chars() -> usize {
    120
}

fn default_card_keywords() -> Vec<String> {
    ["card", "badge", "poap", "event"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}
