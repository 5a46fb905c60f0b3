//! Command-line interface definitions for the news sentiment scraper.
//!
//! Every flag is optional; anything not given falls back to the pipeline
//! config file and then to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one pipeline run.
///
/// # Examples
///
/// ```sh
/// # Run with defaults, creating the schema on first use
/// news_sentiment_scraper --init-schema
///
/// # Only scrape one Guardian feed and skip the Express
/// news_sentiment_scraper -c pipeline.yaml --guardian-feed https://www.theguardian.com/world/rss
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to the pipeline YAML config
    #[arg(short, long)]
    pub config: Option<String>,

    /// SQLite database path, overrides the config file
    #[arg(short, long, env = "NEWS_DATABASE_PATH")]
    pub database: Option<PathBuf>,

    /// Guardian RSS feed to scrape (repeatable), replaces the configured list
    #[arg(long)]
    pub guardian_feed: Vec<String>,

    /// Daily Express RSS feed to scrape (repeatable), replaces the configured list
    #[arg(long)]
    pub express_feed: Vec<String>,

    /// Path to the awful_aj config.yaml holding the LLM endpoint settings
    #[arg(long, env = "AWFUL_AJ_CONFIG")]
    pub llm_config: Option<String>,

    /// Create missing tables and seed the outlet/topic dimensions before running
    #[arg(long)]
    pub init_schema: bool,
}
