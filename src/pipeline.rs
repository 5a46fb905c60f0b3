//! One scrape → transform → analyse → load run.
//!
//! Each stage consumes only the previous stage's output. Per-record problems
//! shrink the batch; an LLM or database failure aborts the run before anything
//! is written.

use crate::analysis::TextAnalyser;
use crate::api::Ask;
use crate::config::FeedConfig;
use crate::load::DatabaseManager;
use crate::scrapers::{PageFetcher, express::Express, extract_feeds, guardian::Guardian};
use crate::transform::{SeenUrls, generate_articles};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

/// How far a run got, stage by stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub records_extracted: usize,
    pub articles_accepted: usize,
    pub articles_analysed: usize,
    pub articles_persisted: usize,
    pub topic_rows: usize,
}

/// Wires the outlets, the analyser and the store together for one invocation.
pub struct NewsScraper<F, A> {
    fetcher: F,
    analyser: TextAnalyser<A>,
    db: DatabaseManager,
    feeds: FeedConfig,
    concurrency: usize,
}

impl<F: PageFetcher, A: Ask> NewsScraper<F, A> {
    /// The analyser is restricted to the topic vocabulary currently in the store.
    pub fn new(fetcher: F, client: A, db: DatabaseManager, feeds: FeedConfig, concurrency: usize) -> Self {
        let analyser = TextAnalyser::new(client, db.get_valid_topics().to_vec());
        Self {
            fetcher,
            analyser,
            db,
            feeds,
            concurrency,
        }
    }

    #[instrument(level = "info", skip_all)]
    pub async fn run(&mut self) -> Result<RunSummary, Box<dyn Error>> {
        let mut summary = RunSummary::default();

        let mut raw = extract_feeds(&Guardian, &self.fetcher, &self.feeds.guardian, self.concurrency).await;
        raw.extend(extract_feeds(&Express, &self.fetcher, &self.feeds.express, self.concurrency).await);
        summary.records_extracted = raw.len();

        let seen = SeenUrls::new(self.db.get_article_urls()?);
        if seen.is_empty() {
            info!("Store holds no articles yet; every extracted record is new");
        }
        let (articles, seen) = generate_articles(raw, seen);
        summary.articles_accepted = articles.len();
        debug!(known_urls = seen.len(), "Dedup set after transform");

        if articles.is_empty() {
            info!("No new articles this run");
            return Ok(summary);
        }

        let analysed = self.analyser.analyze_all(articles, self.concurrency).await?;
        summary.articles_analysed = analysed.len();

        let persisted = self.db.insert_into_database(analysed)?;
        summary.articles_persisted = persisted.len();
        summary.topic_rows = persisted.iter().map(|a| a.analysis.topics.len()).sum();

        Ok(summary)
    }

    /// [`run`](Self::run) under an overall deadline; expiry fails the run.
    pub async fn run_with_timeout(&mut self, budget: Duration) -> Result<RunSummary, Box<dyn Error>> {
        let t0 = Instant::now();
        let summary = match timeout(budget, self.run()).await {
            Ok(result) => result?,
            Err(_) => {
                error!(?budget, "Pipeline run exceeded its time budget; aborting");
                return Err(format!("pipeline run exceeded {budget:?}").into());
            }
        };

        info!(
            extracted = summary.records_extracted,
            accepted = summary.articles_accepted,
            analysed = summary.articles_analysed,
            persisted = summary.articles_persisted,
            topic_rows = summary.topic_rows,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Pipeline run complete"
        );
        Ok(summary)
    }
}
