//! UI Harvest main entry point
//!
//! This is the command-line interface for the ui-harvest site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ui_harvest::config::{load_config_with_hash, validate, Config};
use ui_harvest::crawler::run_crawl;
use ui_harvest::normalize_url;
use ui_harvest::storage::{open_storage, Storage};

/// UI Harvest: a polite single-host crawler that records UI components
///
/// UI Harvest crawls one site while respecting robots.txt and a request rate limit,
/// stores every HTML page it fetches and records headings, buttons, link texts,
/// image alt texts, class usage and card-like blocks for each page. Interrupted
/// crawls resume from the last checkpoint.
#[derive(Parser, Debug)]
#[command(name = "ui-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite single-host UI component crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, ignoring saved frontier and visited state
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics from saved state and extracts, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Write a markdown summary of the recorded components, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,

    /// Override the page budget
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Override the number of concurrent fetches
    #[arg(long, value_name = "K")]
    concurrency: Option<usize>,

    /// Override the delay before each request, in seconds
    #[arg(long, value_name = "SECS")]
    rate_limit: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(anyhow::Error::new(e).context(format!("loading {}", cli.config.display())));
        }
    };

    apply_cli_overrides(&mut config, &cli).context("applying command-line overrides")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash, cli.fresh)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ui_harvest=info,warn"),
            1 => EnvFilter::new("ui_harvest=debug,info"),
            2 => EnvFilter::new("ui_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies --max-pages, --concurrency and --rate-limit, then re-validates
fn apply_cli_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(rate_limit) = cli.rate_limit {
        config.crawler.rate_limit_seconds = rate_limit;
    }
    validate(config)?;
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, config_hash: &str, fresh: bool) -> anyhow::Result<()> {
    println!("=== UI Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page budget: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!(
        "  Delay before each request: {:.2}s",
        config.crawler.rate_limit_seconds
    );
    println!(
        "  Request timeout: {:.1}s",
        config.crawler.request_timeout_seconds
    );
    println!(
        "  Checkpoint every {} visited URLs",
        config.crawler.checkpoint_interval
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Raw HTML: {}", config.output.html_dir().display());
    println!("  State: {}", config.output.state_dir().display());
    println!("  Extracts: {}", config.output.extracts_dir().display());

    println!("\nSite: {}", config.site.allowed_host);
    println!("Seeds ({}):", config.site.seeds.len());
    for seed in &config.site.seeds {
        match normalize_url(seed, None, &config.site.allowed_host) {
            Ok(url) => println!("  - {}", url),
            Err(e) => println!("  - {} (rejected: {})", seed, e),
        }
    }

    let storage = open_storage(&config.output)?;
    let resumes = !fresh && !storage.is_empty_state();

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
    if resumes {
        println!("✓ Would resume from saved state");
    } else {
        println!("✓ Would start from {} seed URL(s)", config.site.seeds.len());
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from saved state and extracts
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use ui_harvest::output::{load_statistics, print_statistics};

    println!("Data directory: {}\n", config.output.data_dir);

    let storage = open_storage(&config.output)?;
    let stats = load_statistics(&storage)?;

    print_statistics(&stats, config.crawler.max_pages);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    use ui_harvest::output::export_summary;

    println!("=== Exporting UI Summary ===\n");

    let storage = open_storage(&config.output)?;

    tracing::info!("Aggregating component records...");
    let path = export_summary(
        &storage,
        &config.site.allowed_host,
        config.extraction.top_classes,
        &config.output.extracts_dir(),
    )?;

    println!("✓ Summary exported to: {}", path.display());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume from saved state if present)");
    }

    tracing::info!(
        "Host: {}, seeds: {}",
        config.site.allowed_host,
        config.site.seeds.len()
    );

    match run_crawl(config, fresh).await {
        Ok(report) => {
            if report.interrupted {
                tracing::info!("Crawl interrupted, state saved; run again to resume");
            } else {
                tracing::info!("Crawl completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
