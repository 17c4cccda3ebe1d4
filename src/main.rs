//! # CNA Harvester
//!
//! A polite, sequential scraper that walks Channel NewsAsia's paginated
//! Singapore-politics topic listing, extracts every linked article, and
//! stores the results in a local SQLite database.
//!
//! ## Features
//!
//! - Walks a fixed number of listing pages by rewriting the `page` query
//!   parameter, so a looping "next" link can never trap the run
//! - Extracts title, author, and timestamps through per-field fallback
//!   chains; a missing field becomes an empty string, never an error
//! - Strictly sequential fetching with a configurable pause between requests
//! - Inserts each article independently, so one bad row can't sink the batch
//!
//! ## Usage
//!
//! ```sh
//! cna_harvester -p 5 -d 2 -o news_articles.db
//! ```
//!
//! ## Architecture
//!
//! The run follows a pipeline:
//! 1. **Listing**: fetch each listing page and collect article links
//! 2. **Fetching**: download and extract each linked article in order
//! 3. **Storage**: insert the harvested rows into SQLite one at a time

use std::error::Error;

use clap::Parser;
use tracing::{debug, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod db;
mod fetch;
mod models;
mod scrapers;
mod utils;

use cli::{Cli, HarvestConfig};
use db::ArticleSink;
use fetch::PageFetcher;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("cna_harvester starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = HarvestConfig::resolve(args)?;
    info!(
        start_url = %config.start_url,
        max_pages = config.max_pages,
        delay_secs = config.delay.as_secs_f64(),
        db_path = %config.db_path.display(),
        "Resolved run configuration"
    );

    let sink = ArticleSink::open(&config.db_path).await?;

    let fetcher = match &config.capture_first_page {
        Some(path) => PageFetcher::with_capture(path.clone()),
        None => PageFetcher::new(),
    };

    // ---- Walk the listing and harvest articles ----
    let articles = scrapers::cna::harvest(
        &fetcher,
        &config.start_url,
        config.max_pages,
        config.delay,
    )
    .await?;
    info!(count = articles.len(), "Harvest finished");

    // ---- Store results ----
    let saved = sink.save(&articles).await;
    info!(
        saved,
        total = articles.len(),
        db = %config.db_path.display(),
        "Run complete"
    );

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
