//! Command line surface and resolved run configuration.
//!
//! Flags layer over an optional YAML config file, which layers over built-in
//! defaults. The resolved [`HarvestConfig`] is validated before the run
//! starts so a bad URL or a zero page count fails fast.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::scrapers::cna;

pub const DEFAULT_MAX_PAGES: u32 = 5;
pub const DEFAULT_DELAY_SECS: f64 = 2.0;
pub const DEFAULT_DB_PATH: &str = "news_articles.db";

/// Harvest Channel NewsAsia articles from a paginated topic listing
/// into a local SQLite database.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Listing URL to start from (must carry a `page` query parameter)
    #[arg(short = 'u', long)]
    pub start_url: Option<String>,

    /// Number of listing pages to walk
    #[arg(short = 'p', long)]
    pub max_pages: Option<u32>,

    /// Pause between requests, in seconds
    #[arg(short, long)]
    pub delay: Option<f64>,

    /// SQLite database file to write articles into
    #[arg(short = 'o', long)]
    pub db_path: Option<PathBuf>,

    /// Write the first fetched page's raw HTML to this file
    #[arg(long)]
    pub capture_first_page: Option<PathBuf>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Optional YAML file mirroring the run-shaping flags.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub start_url: Option<String>,
    pub max_pages: Option<u32>,
    pub delay: Option<f64>,
    pub db_path: Option<PathBuf>,
    pub capture_first_page: Option<PathBuf>,
}

/// Fully resolved and validated run configuration.
#[derive(Debug)]
pub struct HarvestConfig {
    pub start_url: Url,
    pub max_pages: u32,
    pub delay: Duration,
    pub db_path: PathBuf,
    pub capture_first_page: Option<PathBuf>,
}

impl HarvestConfig {
    /// Layer CLI flags over the optional config file over the defaults, then
    /// validate the result.
    pub fn resolve(cli: Cli) -> Result<Self, Box<dyn Error>> {
        let file = match &cli.config {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                let parsed: FileConfig = serde_yaml::from_str(&raw)?;
                debug!(path = %path.display(), "Loaded config file");
                parsed
            }
            None => FileConfig::default(),
        };

        let raw_url = cli
            .start_url
            .or(file.start_url)
            .unwrap_or_else(|| cna::DEFAULT_LISTING_URL.to_string());
        let start_url = Url::parse(&raw_url)?;
        if !start_url.query_pairs().any(|(k, _)| k == "page") {
            return Err(format!("start URL {start_url} has no `page` query parameter").into());
        }

        let max_pages = cli.max_pages.or(file.max_pages).unwrap_or(DEFAULT_MAX_PAGES);
        if max_pages == 0 {
            return Err("max-pages must be at least 1".into());
        }

        let delay_secs = cli.delay.or(file.delay).unwrap_or(DEFAULT_DELAY_SECS);
        let delay = Duration::try_from_secs_f64(delay_secs)
            .map_err(|e| format!("invalid delay {delay_secs}: {e}"))?;

        Ok(Self {
            start_url,
            max_pages,
            delay,
            db_path: cli
                .db_path
                .or(file.db_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            capture_first_page: cli.capture_first_page.or(file.capture_first_page),
        })
    }
}
