//! Error types for each pipeline stage.
//!
//! Per-record failures ([`FetchError`], [`DateParseError`], [`TopicRejection`])
//! are logged and the record skipped. [`AnalysisError`] and [`LoadError`]
//! abort the run.

use thiserror::Error;

/// Failure to download a feed document or an article page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("failed to retrieve {url}, status code: {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure to turn a feed URL into a list of entries.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    #[error("invalid feed url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
#[error("unrecognised published date format: {0:?}")]
pub struct DateParseError(pub String);

/// Why a single LLM-proposed topic was discarded.
#[derive(Debug, Error, PartialEq)]
pub enum TopicRejection {
    #[error("malformed topic element: {0}")]
    Malformed(String),

    #[error("topic {0:?} is not in the controlled vocabulary")]
    UnknownTopic(String),

    #[error("none of the key terms for topic {0:?} occur in the article body")]
    Ungrounded(String),
}

/// Fatal failure while extracting topics for an article.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("topic extraction request for {url} failed: {message}")]
    Llm { url: String, message: String },

    #[error("topic extraction response for {url} is not a JSON array: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fatal failure while persisting a batch.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("news outlet {0:?} has no row in news_outlet")]
    UnknownOutlet(String),

    #[error("topic {0:?} has no row in topic")]
    UnknownTopic(String),
}
