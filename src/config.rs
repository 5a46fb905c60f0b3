//! Pipeline configuration.
//!
//! Settings come from an optional YAML file; every field has a default so an
//! empty file (or no file at all) is a valid configuration. Command-line flags
//! are applied on top with [`PipelineConfig::apply_cli`].
//!
//! ```yaml
//! database_path: news.sqlite
//! concurrency: 4
//! llm:
//!   template: news_topics
//!   max_retries: 3
//! feeds:
//!   guardian:
//!     - https://www.theguardian.com/world/rss
//!   express: []
//! ```

use crate::cli::Cli;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub database_path: PathBuf,
    /// Per-request timeout for feed and article downloads.
    pub request_timeout_secs: u64,
    /// Budget for the whole run, LLM calls included.
    pub run_timeout_secs: u64,
    /// Maximum number of article pages or LLM calls in flight.
    pub concurrency: usize,
    pub llm: LlmConfig,
    pub feeds: FeedConfig,
    /// Topic vocabulary written to the `topic` table by `--init-schema`.
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// awful_aj chat template name.
    pub template: String,
    pub max_retries: usize,
}

/// Feed URLs assigned to each outlet for this run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub guardian: Vec<String>,
    pub express: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("news.sqlite"),
            request_timeout_secs: 10,
            run_timeout_secs: 900,
            concurrency: 8,
            llm: LlmConfig::default(),
            feeds: FeedConfig::default(),
            topics: [
                "Politics", "Economy", "Immigration", "Health", "Education", "Crime", "Climate",
                "Energy", "Housing", "Defence", "Trade", "Tariffs", "Elections", "Technology",
                "Ukraine", "Israel", "China", "Europe", "United States", "Royal Family",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            template: "news_topics".to_string(),
            max_retries: 2,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            guardian: vec![
                "https://www.theguardian.com/politics/rss".to_string(),
                "https://www.theguardian.com/us-news/us-politics/rss".to_string(),
                "https://www.theguardian.com/world/rss".to_string(),
            ],
            express: vec![
                "https://www.express.co.uk/posts/rss/139/politics".to_string(),
                "https://www.express.co.uk/posts/rss/198/us".to_string(),
                "https://www.express.co.uk/posts/rss/78/world".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document; absent fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        let yaml = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(
            database = %config.database_path.display(),
            guardian_feeds = config.feeds.guardian.len(),
            express_feeds = config.feeds.express.len(),
            "Loaded pipeline configuration"
        );
        Ok(config)
    }

    /// Override file settings with whatever was given on the command line.
    ///
    /// Feed flags replace the configured list for that outlet only.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.database {
            self.database_path = path.clone();
        }
        if !cli.guardian_feed.is_empty() {
            self.feeds.guardian = cli.guardian_feed.clone();
        }
        if !cli.express_feed.is_empty() {
            self.feeds.express = cli.express_feed.clone();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}
