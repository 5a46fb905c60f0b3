//! Topic extraction prompt, response parsing and grounding.
//!
//! The model is asked for up to [`MAX_TOPICS`] topics drawn from the
//! controlled vocabulary, each with key terms copied from the article. Its
//! answer is trusted only after two independent filters:
//!
//! 1. the topic name must be an exact member of the vocabulary;
//! 2. key terms that are not literal substrings of the body are removed, and
//!    a topic left without key terms is removed entirely.

use crate::error::TopicRejection;
use crate::models::{CandidateTopic, ExtractedTopic};
use itertools::Itertools;
use std::collections::HashSet;

pub const MAX_TOPICS: usize = 5;

const PROMPT: &str = r#"Identify up to five overarching topics of the news article below.
Name each topic in as few words as possible, usually a single word, for example: immigration, economy, tariffs.
Every topic MUST be taken verbatim from this list, and you may return fewer than five if fewer apply:
{valid_topics}

For each topic give the key terms: words or short phrases copied exactly from the article that tie it to the topic.

Answer with a JSON array only, no code fences and no commentary. Each element is an object with exactly two keys:
"topic_name" (string) and "key_terms" (array of strings).

Article:
{article_body}"#;

/// Render the extraction prompt for one article.
pub fn build_prompt(valid_topics: &[String], body: &str) -> String {
    PROMPT
        .replace("{valid_topics}", &valid_topics.join(", "))
        .replace("{article_body}", body)
}

/// Remove a surrounding markdown code fence, if the model added one anyway.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the model's answer into one result per array element.
///
/// The outer document must be a JSON array; anything else is an error for the
/// caller to treat as fatal. Elements that do not have the expected shape are
/// reported individually as [`TopicRejection::Malformed`].
pub fn parse_response(
    response: &str,
) -> Result<Vec<Result<CandidateTopic, TopicRejection>>, serde_json::Error> {
    let elements: Vec<serde_json::Value> = serde_json::from_str(strip_code_fence(response))?;
    Ok(elements
        .into_iter()
        .map(|element| {
            serde_json::from_value::<CandidateTopic>(element.clone())
                .map_err(|e| TopicRejection::Malformed(format!("{e}: {element}")))
        })
        .collect())
}

/// Check one candidate against the vocabulary and ground its key terms in `body`.
pub fn validate_candidate(
    candidate: CandidateTopic,
    vocabulary: &HashSet<String>,
    body: &str,
) -> Result<ExtractedTopic, TopicRejection> {
    if !vocabulary.contains(&candidate.topic_name) {
        return Err(TopicRejection::UnknownTopic(candidate.topic_name));
    }

    let key_terms: Vec<String> = candidate
        .key_terms
        .into_iter()
        .filter(|term| !term.trim().is_empty() && body.contains(term.as_str()))
        .unique()
        .collect();

    if key_terms.is_empty() {
        return Err(TopicRejection::Ungrounded(candidate.topic_name));
    }

    Ok(ExtractedTopic {
        topic_name: candidate.topic_name,
        key_terms,
    })
}

/// Validate every candidate, keeping the first occurrence of each topic and at most [`MAX_TOPICS`].
///
/// Rejections are returned alongside so the caller can log them.
pub fn validate_topics(
    candidates: Vec<Result<CandidateTopic, TopicRejection>>,
    vocabulary: &HashSet<String>,
    body: &str,
) -> (Vec<ExtractedTopic>, Vec<TopicRejection>) {
    let (accepted, rejected): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .map(|candidate| candidate.and_then(|c| validate_candidate(c, vocabulary, body)))
        .partition_result();

    let topics = accepted
        .into_iter()
        .unique_by(|t: &ExtractedTopic| t.topic_name.clone())
        .take(MAX_TOPICS)
        .collect();
    (topics, rejected)
}
