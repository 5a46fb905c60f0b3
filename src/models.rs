//! Data models for each stage of the pipeline.
//!
//! An article moves through four distinct types, one per stage, so a stage
//! can never read a field before the stage that produces it has run:
//!
//! - [`RawRecord`]: scraped feed entry plus article body, dates still strings
//! - [`Article`]: validated, deduplicated record with a UTC publish instant
//! - [`AnalyzedArticle`]: article with whole-body scores and grounded topics
//! - [`PersistedArticle`]: analysed article plus its database-assigned id

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A feed entry whose article page was fetched and whose body was extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub headline: String,
    pub url: String,
    /// Publish timestamp exactly as it appeared in the feed.
    pub published_date: String,
    pub news_outlet: String,
    pub body: String,
}

/// An article accepted by [`crate::transform::ArticleFactory`].
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub news_outlet: String,
    pub headline: String,
    pub url: String,
    pub published_date: DateTime<Utc>,
    pub body: String,
}

/// One element of the topic extraction response, before validation.
///
/// Deserialised per element so one malformed entry does not poison the rest.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CandidateTopic {
    pub topic_name: String,
    pub key_terms: Vec<String>,
}

/// A topic that passed vocabulary and grounding checks.
///
/// `key_terms` is never empty and every entry occurs verbatim in the body of
/// the article it was extracted from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTopic {
    pub topic_name: String,
    pub key_terms: Vec<String>,
}

/// VADER-scale sentiment quad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    /// Normalised aggregate in `[-1, 1]`.
    pub compound: f64,
}

/// A grounded topic with sentiment scoped to the sentences that mention it.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAnalysis {
    pub topic_name: String,
    pub key_terms: Vec<String>,
    pub sentiment: SentimentScores,
}

/// An article after topic extraction and both levels of sentiment scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedArticle {
    pub article: Article,
    /// `0.0` (objective) to `1.0` (subjective).
    pub subjectivity: f64,
    /// `-1.0` (negative) to `1.0` (positive).
    pub polarity: f64,
    pub sentiment: SentimentScores,
    pub topics: Vec<TopicAnalysis>,
}

/// An analysed article that now has a row in `article`.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedArticle {
    pub id: i64,
    pub analysis: AnalyzedArticle,
}
