//! apfetch CLI
//!
//! Logs in to the portal, walks the configured saved search and stores new
//! items in the destination directory.

use std::path::PathBuf;
use std::time::Duration;

use apfetch::{
    error::Result,
    models::Config,
    pipeline::{CrawlOptions, Crawler},
    storage::LocalStorage,
};
use clap::Parser;

/// apfetch - saved-search content fetcher
#[derive(Parser, Debug)]
#[command(name = "apfetch", version, about = "Fetch new content from a saved search")]
struct Cli {
    /// Directory the fetched items are written to
    destination: PathBuf,

    /// Increase output verbosity (-v notices, -vv items, -vvv requests)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Hide all output
    #[arg(short, long)]
    quiet: bool,

    /// Number of records to fetch
    #[arg(short, long, default_value_t = 25)]
    limit: usize,

    /// YAML (or .toml) configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Type of content to fetch (matched case-insensitively as a regex)
    #[arg(short, long, default_value = "xml")]
    format: String,

    /// Number of seconds to wait between page fetches
    #[arg(short, long, default_value_t = 5)]
    pause: u64,
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => "off",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("apfetch={level}")),
    )
    .format_timestamp_secs()
    .init();
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity, cli.quiet);

    let config = Config::load(&cli.config)?;
    log::debug!("Loaded configuration from {}", cli.config.display());

    let storage = LocalStorage::open(&cli.destination, cli.format.as_str()).await?;
    let options = CrawlOptions {
        limit: cli.limit,
        format: cli.format,
        pause: Duration::from_secs(cli.pause),
    };

    let mut crawler = Crawler::new(&config, options, &storage)?;
    if cli.verbosity == 0 && !cli.quiet {
        crawler = crawler.on_fetched(|path| println!("{}", path.display()));
    }
    let report = crawler.crawl().await?;

    log::info!(
        "Finished in {}s ({} pages, {})",
        (report.finished_at - report.started_at).num_seconds(),
        report.pages_fetched,
        report.stop_reason
    );

    Ok(())
}
