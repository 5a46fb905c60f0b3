//! # News Sentiment Scraper
//!
//! Scrapes politics and world news RSS feeds from The Guardian and the Daily
//! Express, asks an LLM which topics each article covers, scores sentiment for
//! the whole article and for each topic, and stores the result in SQLite for
//! downstream reporting.
//!
//! ## Usage
//!
//! ```sh
//! news_sentiment_scraper --init-schema -c pipeline.yaml
//! ```
//!
//! ## Architecture
//!
//! One invocation runs a single pass of the pipeline:
//! 1. **Extract**: read each outlet's feeds and scrape article bodies
//! 2. **Transform**: normalise publication dates and drop already-seen URLs
//! 3. **Analyse**: extract grounded topics through the LLM, score sentiment
//! 4. **Load**: write articles and article topics in one transaction
//!
//! Scheduling is left to whatever triggers the binary (cron, systemd timers, ...).

use awful_aj::{config_dir, template};
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analysis;
mod api;
mod cli;
mod config;
mod error;
mod load;
mod models;
mod pipeline;
mod scrapers;
mod transform;
mod utils;

use api::{AwfulAjClient, Backoff};
use cli::Cli;
use config::PipelineConfig;
use load::DatabaseManager;
use pipeline::NewsScraper;
use scrapers::{HttpFetcher, Outlet, express::Express, guardian::Guardian};

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

    info!("news_sentiment_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Pipeline config ----
    let mut pipeline_config = match &args.config {
        Some(path) => PipelineConfig::load(path).await?,
        None => PipelineConfig::default(),
    };
    pipeline_config.apply_cli(&args);

    // ---- Store ----
    let conn = load::connect(&pipeline_config.database_path).map_err(|e| {
        error!(path = %pipeline_config.database_path.display(), error = %e, "Cannot open database");
        e
    })?;
    if args.init_schema {
        load::init_schema(&conn)?;
        load::seed_dimensions(
            &conn,
            &[Guardian.outlet_name(), Express.outlet_name()],
            &pipeline_config.topics,
        )?;
    }
    let db = DatabaseManager::new(conn)?;
    info!(topics = db.get_valid_topics().len(), "Loaded dimension tables");

    // ---- Load LLM template & config ----
    let template = template::load_template(&pipeline_config.llm.template).await?;
    info!(template = %pipeline_config.llm.template, "Loaded template");
    let config_path = match &args.llm_config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml").to_string_lossy().into_owned(),
    };
    let llm_config = awful_aj::config::load_config(&config_path)?;
    info!(%config_path, "Loaded LLM configuration");

    let client = Backoff::new(
        AwfulAjClient {
            config: llm_config,
            template,
        },
        pipeline_config.llm.max_retries,
        Duration::from_secs(1),
    );
    let fetcher = HttpFetcher::new(pipeline_config.request_timeout())?;

    let mut scraper = NewsScraper::new(
        fetcher,
        client,
        db,
        pipeline_config.feeds.clone(),
        pipeline_config.concurrency,
    );

    if let Err(e) = scraper.run_with_timeout(pipeline_config.run_timeout()).await {
        error!(error = %e, "Pipeline run failed");
        return Err(e);
    }

    Ok(())
}
