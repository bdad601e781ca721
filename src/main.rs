//! RIWEB crawler main entry point
//!
//! This is the command-line interface for the crawler.

use clap::Parser;
use riweb_crawler::config::{load_config_with_hash, Config};
use riweb_crawler::crawler::run_crawl;
use riweb_crawler::storage::{open_storage, PageStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// RIWEB crawler: a polite multi-worker web crawler
///
/// Starting from a single seed domain, the crawler follows links over plain
/// HTTP, honors robots.txt and keeps at most one connection per domain per
/// politeness window.
#[derive(Parser, Debug)]
#[command(name = "riweb-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite multi-worker web crawler", long_about = None)]
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

    /// Validate config and print it without crawling
    #[arg(long)]
    dry_run: bool,

    /// Stop once the frontier is exhausted instead of idling until Ctrl-C
    #[arg(long)]
    exit_when_idle: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config, cli.exit_when_idle).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("riweb_crawler=info,warn"),
            1 => EnvFilter::new("riweb_crawler=debug,info"),
            2 => EnvFilter::new("riweb_crawler=trace,debug"),
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

/// Handles the --dry-run mode: prints the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== RIWEB Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed domain: {}", config.crawler.seed_domain);
    println!(
        "  Seed prefix: {}",
        config.crawler.seed_prefix.as_deref().unwrap_or("(none)")
    );
    println!("  Workers: {}", config.crawler.workers);
    println!("  Pages per worker: {}", config.crawler.max_active_pages);
    println!("  Politeness window: {}ms", config.crawler.politeness_window);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nHTTP:");
    println!("  Port: {}", config.http.port);
    println!("  Timeout: {}ms", config.http.timeout);
    println!("  Max redirects: {}", config.http.max_redirects);
    println!("  Max response bytes: {}", config.http.max_response_bytes);

    println!("\nDNS:");
    println!("  Nameserver: {}:{}", config.dns.nameserver, config.dns.port);
    println!("  Recursion desired: {}", config.dns.recursion_desired);

    println!("\nOutput:");
    println!(
        "  Database: {}",
        config.output.database_path.as_deref().unwrap_or("(text not stored)")
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, exit_when_idle: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store: Option<Arc<dyn PageStore>> = match &config.output.database_path {
        Some(path) => {
            tracing::info!("Storing page text in {}", path);
            Some(Arc::new(open_storage(Path::new(path))?))
        }
        None => None,
    };

    tracing::info!(
        "Seed: http://{}{}",
        config.crawler.seed_domain,
        config.crawler.seed_prefix.as_deref().unwrap_or("/")
    );

    match run_crawl(config, store, exit_when_idle).await {
        Ok(stats) => {
            tracing::info!(
                "Crawl finished: {} pages completed, {} succeeded",
                stats.completed,
                stats.succeeded
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
