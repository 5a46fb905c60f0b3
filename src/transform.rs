//! Conversion of raw scraped records into validated [`Article`]s.
//!
//! Records are dropped, never failed, when their publish date is not in a
//! known format or their URL has already been seen (persisted by an earlier
//! run or accepted earlier in this batch).

use crate::error::DateParseError;
use crate::models::{Article, RawRecord};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// RFC-822 style stamp with a numeric offset, e.g. `10 Apr 2024 14:30:00 +0000`.
///
/// The leading day name (`Wed, `) is stripped before parsing and never checked
/// against the date.
const NUMERIC_OFFSET_FORMAT: &str = "%d %b %Y %H:%M:%S %z";
/// The same stamp without its zone, which is parsed separately as an abbreviation.
const NAMED_ZONE_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// UTC offsets, in hours, of the zone abbreviations feeds are known to emit.
const ZONE_ABBREVIATIONS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("GMT", 0),
    ("Z", 0),
    ("BST", 1),
    ("CET", 1),
    ("CEST", 2),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

/// Drop an optional `Xxx, ` day-name prefix.
fn strip_weekday(raw: &str) -> &str {
    match raw.split_once(',') {
        Some((day, rest)) if !day.is_empty() && day.chars().all(|c| c.is_ascii_alphabetic()) => rest.trim_start(),
        _ => raw,
    }
}

/// Parse a feed publish stamp, trying each known format in order.
///
/// # Arguments
///
/// * `raw` - The stamp as it appeared in the feed, e.g. `Wed, 10 Apr 2024 14:30:00 +0000`
///   or `Wed, 10 Apr 2024 09:30:00 EST`.
///
/// # Returns
///
/// The instant normalised to UTC, or a [`DateParseError`] carrying `raw` when no
/// format matches or the zone abbreviation is unknown.
pub fn parse_published_date(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let raw = raw.trim();
    let stamp = strip_weekday(raw);

    if let Ok(parsed) = DateTime::parse_from_str(stamp, NUMERIC_OFFSET_FORMAT) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Some((stamp, zone)) = stamp.rsplit_once(' ') {
        let offset = ZONE_ABBREVIATIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(zone))
            .and_then(|(_, hours)| FixedOffset::east_opt(hours * 3600));
        if let Some(offset) = offset {
            if let Ok(naive) = NaiveDateTime::parse_from_str(stamp, NAMED_ZONE_FORMAT) {
                if let Some(local) = naive.and_local_timezone(offset).single() {
                    return Ok(local.with_timezone(&Utc));
                }
            }
        }
    }

    Err(DateParseError(raw.to_string()))
}

/// Running set of article URLs that must not be accepted again.
///
/// Seeded with URLs already in the store; grows as the factory accepts records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenUrls(HashSet<String>);

impl SeenUrls {
    pub fn new<I, S>(persisted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(persisted.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    /// Record `url`, returning `false` when it had already been seen.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.0.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Turns [`RawRecord`]s into [`Article`]s.
#[derive(Debug, Default)]
pub struct ArticleFactory {
    seen: SeenUrls,
}

impl ArticleFactory {
    pub fn new(seen: SeenUrls) -> Self {
        Self { seen }
    }

    /// Validate a single record, claiming its URL on success.
    fn accept(&mut self, record: RawRecord) -> Option<Article> {
        let published_date = match parse_published_date(&record.published_date) {
            Ok(date) => date,
            Err(e) => {
                warn!(url = %record.url, error = %e, "Dropping record with unparseable date");
                return None;
            }
        };

        if self.seen.contains(&record.url) {
            debug!(url = %record.url, "Dropping already seen article");
            return None;
        }
        self.seen.insert(&record.url);

        Some(Article {
            news_outlet: record.news_outlet,
            headline: record.headline,
            url: record.url,
            published_date,
            body: record.body,
        })
    }

    /// Validate a batch; returns accepted articles in input order.
    #[instrument(level = "info", skip_all, fields(records = raw.len()))]
    pub fn generate_articles(&mut self, raw: Vec<RawRecord>) -> Vec<Article> {
        let total = raw.len();
        let articles: Vec<Article> = raw.into_iter().filter_map(|r| self.accept(r)).collect();
        info!(
            accepted = articles.len(),
            dropped = total - articles.len(),
            "Generated articles"
        );
        articles
    }

    /// Hand the dedup set back, including every URL accepted so far.
    pub fn into_seen(self) -> SeenUrls {
        self.seen
    }
}

/// Validate `raw` against `seen`, returning the accepted articles and the grown set.
pub fn generate_articles(raw: Vec<RawRecord>, seen: SeenUrls) -> (Vec<Article>, SeenUrls) {
    let mut factory = ArticleFactory::new(seen);
    let articles = factory.generate_articles(raw);
    (articles, factory.into_seen())
}
