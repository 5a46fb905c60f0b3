//! Feed scraping shared by every news outlet.
//!
//! Each outlet only decides how article text is found in its HTML; feed
//! download, entry filtering, page fetching and error handling are shared.
//!
//! # Supported Outlets
//!
//! | Outlet | Module | Body selector |
//! |--------|--------|---------------|
//! | The Guardian | [`guardian`] | `p.dcr-16w5gq9` |
//! | Daily Express | [`express`] | `div[class="text-description"] p` |
//!
//! Adding an outlet means adding one [`Outlet`] implementation.
//!
//! # Failure Handling
//!
//! A page that times out, returns a non-2xx status, fails in transport or
//! yields only whitespace is logged and skipped. There is no retry; the next
//! scheduled run picks the entry up again since it was never persisted.

pub mod express;
pub mod guardian;
pub mod rss;

use crate::error::{FeedError, FetchError};
use crate::models::RawRecord;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Outlet-specific scraping strategy.
pub trait Outlet {
    /// Name of the outlet as stored in the `news_outlet` dimension.
    fn outlet_name(&self) -> &'static str;

    /// Concatenated article text of a parsed page; empty when the outlet's
    /// content containers are missing.
    fn extract_text(&self, document: &Html) -> String;

    /// Article body of a raw HTML page, `None` when nothing but whitespace was found.
    fn extract_body(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let text = self.extract_text(&document);
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Downloads a document as text.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build the shared client.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound for each request, connect and body included
    ///
    /// # Returns
    ///
    /// The fetcher, or the `reqwest` error if the TLS backend cannot be initialised.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
    /// let xml = fetcher.fetch("https://www.theguardian.com/politics/rss").await?;
    /// ```
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let classify = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Request { url: url.to_string(), source }
            }
        };

        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(classify)
    }
}

/// Download one feed and return its entries.
///
/// # Errors
///
/// [`FeedError::Fetch`] when the download fails, otherwise whatever
/// [`rss::parse_feed`] reports.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_feed<F: PageFetcher>(
    fetcher: &F,
    feed_url: &str,
) -> Result<Vec<rss::FeedEntry>, FeedError> {
    let xml = fetcher.fetch(feed_url).await?;
    let entries = rss::parse_feed(&xml, feed_url)?;
    info!(count = entries.len(), "Parsed feed entries");
    Ok(entries)
}

/// Fetch an article page and extract its body with the outlet's strategy.
async fn fetch_record<O, F>(outlet: &O, fetcher: &F, entry: rss::FeedEntry, url: String) -> Option<RawRecord>
where
    O: Outlet,
    F: PageFetcher,
{
    match fetcher.fetch(&url).await {
        Ok(html) => match outlet.extract_body(&html) {
            Some(body) => {
                debug!(%url, bytes = body.len(), "Extracted article body");
                Some(RawRecord {
                    headline: entry.title,
                    url,
                    published_date: entry.published,
                    news_outlet: outlet.outlet_name().to_string(),
                    body,
                })
            }
            None => {
                warn!(%url, outlet = outlet.outlet_name(), "Article body empty; skipping entry");
                None
            }
        },
        Err(e) => {
            warn!(%url, error = %e, "Article fetch failed; skipping entry");
            None
        }
    }
}

/// Scrape every article of every feed for one outlet.
///
/// Entries without a link are dropped. Page fetches run at most `concurrency`
/// at a time and the output keeps feed and entry order. A feed that cannot be
/// downloaded or parsed is logged and skipped.
///
/// # Arguments
///
/// * `outlet` - Strategy that names the outlet and finds the body in its pages
/// * `fetcher` - Downloads feeds and article pages
/// * `feed_urls` - Feeds assigned to this outlet for the run
/// * `concurrency` - Maximum article pages in flight (0 is treated as 1)
///
/// # Returns
///
/// One [`RawRecord`] per entry whose page was fetched and had a non-empty body.
///
/// # Example
///
/// ```ignore
/// let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
/// let records = extract_feeds(&Guardian, &fetcher, &config.feeds.guardian, 8).await;
/// ```
#[instrument(level = "info", skip_all, fields(outlet = outlet.outlet_name(), feeds = feed_urls.len()))]
pub async fn extract_feeds<O, F>(
    outlet: &O,
    fetcher: &F,
    feed_urls: &[String],
    concurrency: usize,
) -> Vec<RawRecord>
where
    O: Outlet,
    F: PageFetcher,
{
    let mut records = Vec::new();

    for feed_url in feed_urls {
        let entries = match fetch_feed(fetcher, feed_url).await {
            Ok(entries) => entries,
            Err(e) => {
                error!(%feed_url, error = %e, "Feed unavailable; skipping");
                continue;
            }
        };

        let linked = entries.into_iter().filter_map(|mut entry| match entry.link.take() {
            Some(url) => Some((entry, url)),
            None => {
                debug!(title = %entry.title, "Feed entry has no link; skipping");
                None
            }
        });

        let fetched: Vec<Option<RawRecord>> = stream::iter(linked)
            .map(|(entry, url)| fetch_record(outlet, fetcher, entry, url))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let before = records.len();
        records.extend(fetched.into_iter().flatten());
        info!(%feed_url, count = records.len() - before, "Extracted feed articles");
    }

    records
}
