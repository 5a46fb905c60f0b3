//! Topic extraction and sentiment scoring.
//!
//! [`TextAnalyser`] turns an [`Article`] into an [`AnalyzedArticle`]:
//!
//! 1. one LLM call proposes topics, which are validated and grounded ([`topics`])
//! 2. the whole body gets a VADER quad ([`vader`]) and a subjectivity/polarity
//!    pair ([`subjectivity`])
//! 3. each topic gets a VADER quad over only the sentences ([`sentences`])
//!    that mention one of its key terms, case-insensitively
//!
//! A topic whose key terms match no sentence is dropped rather than stored
//! without scores.

pub mod sentences;
pub mod subjectivity;
pub mod topics;
pub mod vader;

use crate::api::Ask;
use crate::error::AnalysisError;
use crate::models::{AnalyzedArticle, Article, ExtractedTopic, TopicAnalysis};
use crate::utils::{looks_truncated, truncate_for_log};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use vader::SentimentIntensityAnalyzer;

/// Runs topic extraction and both sentiment granularities.
#[derive(Debug)]
pub struct TextAnalyser<A> {
    client: A,
    valid_topics: Vec<String>,
    vocabulary: HashSet<String>,
    sentiment: SentimentIntensityAnalyzer,
}

impl<A: Ask> TextAnalyser<A> {
    pub fn new(client: A, valid_topics: Vec<String>) -> Self {
        let vocabulary = valid_topics.iter().cloned().collect();
        Self {
            client,
            valid_topics,
            vocabulary,
            sentiment: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Ask the model for topics and keep only vocabulary members with grounded key terms.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn extract_topics(&self, article: &Article) -> Result<Vec<ExtractedTopic>, AnalysisError> {
        let prompt = topics::build_prompt(&self.valid_topics, &article.body);
        let response = self.client.ask(&prompt).await.map_err(|e| AnalysisError::Llm {
            url: article.url.clone(),
            message: e.to_string(),
        })?;

        let candidates = topics::parse_response(&response).map_err(|source| {
            warn!(
                truncated = looks_truncated(&source),
                response_preview = %truncate_for_log(&response, 300),
                "Topic response is not a JSON array"
            );
            AnalysisError::MalformedResponse {
                url: article.url.clone(),
                source,
            }
        })?;

        let proposed = candidates.len();
        let (extracted, rejected) = topics::validate_topics(candidates, &self.vocabulary, &article.body);
        for rejection in &rejected {
            debug!(reason = %rejection, "Discarded proposed topic");
        }
        info!(proposed, kept = extracted.len(), "Extracted topics");
        Ok(extracted)
    }

    /// Score each topic over the sentences mentioning any of its key terms.
    pub fn score_topics(&self, body: &str, topics: Vec<ExtractedTopic>) -> Vec<TopicAnalysis> {
        let sentences = sentences::split_sentences(body);
        let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();

        topics
            .into_iter()
            .filter_map(|topic| {
                let terms: Vec<String> = topic.key_terms.iter().map(|t| t.to_lowercase()).collect();
                let related: Vec<&str> = sentences
                    .iter()
                    .zip(&lowered)
                    .filter(|(_, lower)| terms.iter().any(|t| lower.contains(t.as_str())))
                    .map(|(sentence, _)| *sentence)
                    .collect();

                if related.is_empty() {
                    warn!(topic = %topic.topic_name, "No sentence mentions the topic's key terms; dropping topic");
                    return None;
                }

                Some(TopicAnalysis {
                    sentiment: self.sentiment.polarity_scores(&related.join(" ")),
                    topic_name: topic.topic_name,
                    key_terms: topic.key_terms,
                })
            })
            .collect()
    }

    /// Extract topics, then score the article and each topic.
    pub async fn analyze(&self, article: Article) -> Result<AnalyzedArticle, AnalysisError> {
        let extracted = self.extract_topics(&article).await?;
        let topics = self.score_topics(&article.body, extracted);
        let body_scores = subjectivity::analyze(&article.body);
        let sentiment = self.sentiment.polarity_scores(&article.body);

        Ok(AnalyzedArticle {
            subjectivity: body_scores.subjectivity,
            polarity: body_scores.polarity,
            sentiment,
            topics,
            article,
        })
    }

    /// Analyse a batch with at most `concurrency` LLM calls in flight.
    ///
    /// The first failure aborts the batch; output order matches input order.
    ///
    /// # Arguments
    ///
    /// * `articles` - Deduplicated articles from the transform stage
    /// * `concurrency` - Maximum topic extraction requests in flight (0 is treated as 1)
    ///
    /// # Returns
    ///
    /// One [`AnalyzedArticle`] per input, or the first [`AnalysisError`].
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub async fn analyze_all(
        &self,
        articles: Vec<Article>,
        concurrency: usize,
    ) -> Result<Vec<AnalyzedArticle>, AnalysisError> {
        let analysed: Vec<AnalyzedArticle> = stream::iter(articles)
            .map(|article| self.analyze(article))
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;

        let topic_count: usize = analysed.iter().map(|a| a.topics.len()).sum();
        info!(count = analysed.len(), topics = topic_count, "Analysed articles");
        Ok(analysed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::error::Error;

    /// Answers every prompt with the same canned response.
    struct Canned(Result<String, String>);

    impl Ask for Canned {
        async fn ask(&self, _prompt: &str) -> Result<String, Box<dyn Error>> {
            self.0.clone().map_err(Into::into)
        }
    }

    fn analyser(response: &str) -> TextAnalyser<Canned> {
        TextAnalyser::new(
            Canned(Ok(response.to_string())),
            vec!["Economy".to_string(), "Politics".to_string(), "Health".to_string()],
        )
    }

    fn article(url: &str, body: &str) -> Article {
        Article {
            news_outlet: "The Guardian".to_string(),
            headline: "Headline".to_string(),
            url: url.to_string(),
            published_date: Utc.with_ymd_and_hms(2024, 4, 10, 14, 30, 0).unwrap(),
            body: body.to_string(),
        }
    }

    const BODY: &str = "Inflation fell sharply, a great relief for families. \
        The opposition called the budget a terrible failure. \
        Hospitals reported calm wards.";

    #[tokio::test]
    async fn test_analyze_scores_article_and_topics() {
        let response = r#"[
            {"topic_name": "Economy", "key_terms": ["Inflation", "deflation"]},
            {"topic_name": "Politics", "key_terms": ["budget"]},
            {"topic_name": "Weather", "key_terms": ["rain"]}
        ]"#;
        let analysed = analyser(response).analyze(article("http://a", BODY)).await.unwrap();

        assert_eq!(analysed.topics.len(), 2);
        let economy = &analysed.topics[0];
        assert_eq!(economy.topic_name, "Economy");
        assert_eq!(economy.key_terms, vec!["Inflation"]);
        assert!(economy.sentiment.compound > 0.0, "{:?}", economy.sentiment);

        let politics = &analysed.topics[1];
        assert!(politics.sentiment.compound < 0.0, "{:?}", politics.sentiment);

        assert!(analysed.subjectivity > 0.0);
        let s = analysed.sentiment;
        assert!((s.positive + s.neutral + s.negative - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_topic_scoped_to_matching_sentences_case_insensitively() {
        let analyser = analyser("[]");
        let body = "Hospitals were overwhelmed. HOSPITALS now face a terrible crisis.";
        let topics = analyser.score_topics(
            body,
            vec![ExtractedTopic {
                topic_name: "Health".to_string(),
                key_terms: vec!["Hospitals".to_string()],
            }],
        );
        let expected = SentimentIntensityAnalyzer::new().polarity_scores(body);
        assert_eq!(topics[0].sentiment, expected);
    }

    #[tokio::test]
    async fn test_topic_without_matching_sentence_is_dropped() {
        let analyser = analyser("[]");
        // the key term spans a sentence boundary, so no single sentence contains it
        let body = "Ministers met at No. 10. Downing Street was quiet.";
        let topics = analyser.score_topics(
            body,
            vec![ExtractedTopic {
                topic_name: "Politics".to_string(),
                key_terms: vec!["10. Downing".to_string()],
            }],
        );
        assert!(topics.is_empty());
    }

    #[tokio::test]
    async fn test_llm_failure_is_fatal() {
        let analyser = TextAnalyser::new(Canned(Err("503 from upstream".to_string())), vec![]);
        let err = analyser.analyze(article("http://a", BODY)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Llm { .. }));
    }

    #[tokio::test]
    async fn test_malformed_response_aborts_batch() {
        let analyser = analyser("not json at all");
        let result = analyser
            .analyze_all(vec![article("http://a", BODY), article("http://b", BODY)], 2)
            .await;
        assert!(matches!(result, Err(AnalysisError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_analyze_all_preserves_order() {
        let analyser = analyser(r#"[{"topic_name": "Economy", "key_terms": ["Inflation"]}]"#);
        let analysed = analyser
            .analyze_all(
                vec![article("http://a", BODY), article("http://b", BODY), article("http://c", BODY)],
                2,
            )
            .await
            .unwrap();
        let urls: Vec<_> = analysed.iter().map(|a| a.article.url.as_str()).collect();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
    }
}
