//! Shiori main entry point
//!
//! This is the command-line interface for the Shiori listing harvester.

use anyhow::Context;
use clap::Parser;
use shiori::config::load_config;
use shiori::crawler::{run_download_batch, run_vocab_crawl};
use shiori::session::Credentials;
use shiori::shutdown::{listen_for_ctrl_c, ShutdownHandle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shiori: a polite listing harvester
///
/// Shiori crawls paginated vocabulary listings into normalized CSV files and
/// can run a session-gated artwork download batch, spacing every request to
/// stay polite to the upstream hosts.
#[derive(Parser, Debug)]
#[command(name = "shiori")]
#[command(version = "1.0.0")]
#[command(about = "A polite listing harvester", long_about = None)]
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

    /// Crawl vocabulary listings and export CSV files (default workflow)
    #[arg(long)]
    words: bool,

    /// Run the authenticated artwork download batch
    #[arg(long)]
    artwork: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["words", "artwork"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let shutdown = ShutdownHandle::shared();
    listen_for_ctrl_c(shutdown.clone());

    // With no workflow flag, the anonymous vocabulary crawl runs
    let run_words = cli.words || !cli.artwork;

    if run_words {
        let summary = run_vocab_crawl(&config, &shutdown).await?;

        println!("\n=== Vocabulary crawl ===");
        for report in &summary.levels {
            println!(
                "  N{}: {} records, {} skips",
                report.level, report.records, report.skips
            );
        }
        println!(
            "✓ {} records exported ({} units skipped)",
            summary.total_records, summary.total_skips
        );
    }

    if cli.artwork {
        let credentials = match (&config.auth.username, &config.auth.password) {
            (Some(username), Some(password)) => Credentials {
                username: username.clone(),
                password: password.clone(),
            },
            _ => anyhow::bail!("artwork downloads need username and password under [auth]"),
        };

        let summary = run_download_batch(&config, credentials, &shutdown).await?;

        println!("\n=== Artwork downloads ===");
        println!(
            "✓ {}/{} downloaded, {} already present, {} skipped",
            summary.downloaded, summary.requested, summary.already_present, summary.skipped
        );
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
            0 => EnvFilter::new("shiori=info,warn"),
            1 => EnvFilter::new("shiori=debug,info"),
            2 => EnvFilter::new("shiori=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &shiori::config::Config) {
    println!("=== Shiori Dry Run ===\n");

    println!("Crawler:");
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!("  Page bound: {}", config.crawler.page_bound);
    println!(
        "  Page delay: {:.1}-{:.1}s",
        config.crawler.page_delay.min, config.crawler.page_delay.max
    );
    println!(
        "  Download delay: {:.1}-{:.1}s",
        config.crawler.download_delay.min, config.crawler.download_delay.max
    );

    println!("\nVocabulary levels ({}):", config.vocab.levels.len());
    for entry in &config.vocab.levels {
        println!(
            "  - N{} ({} known pages)",
            entry.level, entry.known_pages
        );
    }

    println!("\nRanking:");
    println!("  URL: {}?mode={}", config.ranking.url, config.ranking.mode);
    println!("  Limit: {} items", config.ranking.limit);
    println!(
        "  Credentials configured: {}",
        config.auth.username.is_some()
    );

    println!("\nOutput:");
    println!("  Words: {}", config.output.words_dir);
    println!("  Images: {}", config.output.images_dir);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} levels and up to {} artworks",
        config.vocab.levels.len(),
        config.ranking.limit
    );
}
