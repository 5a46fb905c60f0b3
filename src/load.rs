//! SQLite persistence for analysed articles.
//!
//! [`DatabaseManager`] caches the outlet and topic dimensions once per run and
//! writes a batch in a single transaction:
//!
//! 1. every `article` row, collecting the generated `article_id`
//! 2. every `article_topic` row keyed on those ids
//!
//! `article.article_url` is UNIQUE, so an article another run already stored
//! returns no id and is skipped together with its topics.

use crate::error::LoadError;
use crate::models::{AnalyzedArticle, PersistedArticle};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS news_outlet (
        news_outlet_id   INTEGER PRIMARY KEY,
        news_outlet_name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS topic (
        topic_id   INTEGER PRIMARY KEY,
        topic_name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS article (
        article_id                 INTEGER PRIMARY KEY,
        news_outlet_id             INTEGER NOT NULL REFERENCES news_outlet(news_outlet_id),
        article_headline           TEXT NOT NULL,
        article_url                TEXT UNIQUE NOT NULL,
        article_published_date     TEXT NOT NULL,
        article_subjectivity       REAL NOT NULL,
        article_polarity           REAL NOT NULL,
        article_positive_sentiment REAL NOT NULL,
        article_neutral_sentiment  REAL NOT NULL,
        article_negative_sentiment REAL NOT NULL,
        article_compound_sentiment REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_article_published ON article(article_published_date);

    CREATE TABLE IF NOT EXISTS article_topic (
        article_id                       INTEGER NOT NULL REFERENCES article(article_id),
        topic_id                         INTEGER NOT NULL REFERENCES topic(topic_id),
        article_topic_positive_sentiment REAL NOT NULL,
        article_topic_negative_sentiment REAL NOT NULL,
        article_topic_neutral_sentiment  REAL NOT NULL,
        article_topic_compound_sentiment REAL NOT NULL,
        PRIMARY KEY (article_id, topic_id)
    );
";

const ARTICLE_INSERT: &str = "
    INSERT INTO article (
        news_outlet_id,
        article_headline,
        article_url,
        article_published_date,
        article_subjectivity,
        article_polarity,
        article_positive_sentiment,
        article_neutral_sentiment,
        article_negative_sentiment,
        article_compound_sentiment
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(article_url) DO NOTHING
    RETURNING article_id
";

const ARTICLE_TOPIC_INSERT: &str = "
    INSERT INTO article_topic (
        article_id,
        topic_id,
        article_topic_positive_sentiment,
        article_topic_negative_sentiment,
        article_topic_neutral_sentiment,
        article_topic_compound_sentiment
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

/// Open the store with foreign keys enforced.
pub fn connect(path: impl AsRef<Path>) -> Result<Connection, LoadError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Create the tables if they do not exist yet.
pub fn init_schema(conn: &Connection) -> Result<(), LoadError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Insert any outlet and topic names that are missing from the dimension tables.
///
/// # Arguments
///
/// * `conn` - Store with the schema already created
/// * `outlets` - Outlet names, as returned by `Outlet::outlet_name`
/// * `topics` - The controlled topic vocabulary
///
/// # Example
///
/// ```ignore
/// let conn = load::connect("news.sqlite")?;
/// load::init_schema(&conn)?;
/// load::seed_dimensions(&conn, &["The Guardian", "Daily Express"], &config.topics)?;
/// ```
#[instrument(level = "info", skip_all)]
pub fn seed_dimensions(conn: &Connection, outlets: &[&str], topics: &[String]) -> Result<(), LoadError> {
    let tx = conn.unchecked_transaction()?;
    let mut added = 0;
    {
        let mut outlet_stmt = tx.prepare("INSERT OR IGNORE INTO news_outlet (news_outlet_name) VALUES (?1)")?;
        for outlet in outlets {
            added += outlet_stmt.execute([outlet])?;
        }
        let mut topic_stmt = tx.prepare("INSERT OR IGNORE INTO topic (topic_name) VALUES (?1)")?;
        for topic in topics {
            added += topic_stmt.execute([topic])?;
        }
    }
    tx.commit()?;
    info!(added, "Seeded dimension tables");
    Ok(())
}

fn name_id_map(conn: &Connection, sql: &str) -> Result<Vec<(String, i64)>, LoadError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Owns the run's connection and the cached dimension maps.
#[derive(Debug)]
pub struct DatabaseManager {
    conn: Connection,
    news_outlet_ids: HashMap<String, i64>,
    topic_ids: HashMap<String, i64>,
    valid_topics: Vec<String>,
}

impl DatabaseManager {
    /// Load the outlet and topic dimensions once for the lifetime of the manager.
    pub fn new(conn: Connection) -> Result<Self, LoadError> {
        let news_outlet_ids = name_id_map(
            &conn,
            "SELECT news_outlet_name, news_outlet_id FROM news_outlet",
        )?
        .into_iter()
        .collect();
        let topics = name_id_map(&conn, "SELECT topic_name, topic_id FROM topic ORDER BY topic_id")?;
        let valid_topics = topics.iter().map(|(name, _)| name.clone()).collect();

        Ok(Self {
            conn,
            news_outlet_ids,
            topic_ids: topics.into_iter().collect(),
            valid_topics,
        })
    }

    /// The controlled topic vocabulary, in id order.
    pub fn get_valid_topics(&self) -> &[String] {
        &self.valid_topics
    }

    /// URLs of every article already stored.
    pub fn get_article_urls(&self) -> Result<Vec<String>, LoadError> {
        let mut stmt = self.conn.prepare("SELECT article_url FROM article")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn outlet_id(&self, name: &str) -> Result<i64, LoadError> {
        self.news_outlet_ids
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownOutlet(name.to_string()))
    }

    fn topic_id(&self, name: &str) -> Result<i64, LoadError> {
        self.topic_ids
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::UnknownTopic(name.to_string()))
    }

    /// Persist a batch atomically and return the articles that received an id.
    ///
    /// Names are resolved before anything is written; any failure rolls back
    /// both passes.
    ///
    /// # Arguments
    ///
    /// * `articles` - Analysed articles whose outlet and topic names must exist
    ///   in the dimension tables
    ///
    /// # Returns
    ///
    /// The newly stored articles with their generated `article_id`, in input
    /// order. Articles whose URL is already stored are left out.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnknownOutlet`] / [`LoadError::UnknownTopic`] before the
    /// transaction starts; [`LoadError::Sqlite`] when a statement fails, in
    /// which case no `article` or `article_topic` row of the batch remains.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut db = DatabaseManager::new(load::connect("news.sqlite")?)?;
    /// let persisted = db.insert_into_database(analysed)?;
    /// info!(stored = persisted.len(), "Loaded batch");
    /// ```
    #[instrument(level = "info", skip_all, fields(articles = articles.len()))]
    pub fn insert_into_database(
        &mut self,
        articles: Vec<AnalyzedArticle>,
    ) -> Result<Vec<PersistedArticle>, LoadError> {
        let mut outlet_ids = Vec::with_capacity(articles.len());
        let mut topic_ids = Vec::with_capacity(articles.len());
        for analysed in &articles {
            outlet_ids.push(self.outlet_id(&analysed.article.news_outlet)?);
            topic_ids.push(
                analysed
                    .topics
                    .iter()
                    .map(|t| self.topic_id(&t.topic_name))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }

        let tx = self.conn.transaction()?;
        let mut persisted = Vec::with_capacity(articles.len());
        let mut persisted_topic_ids = Vec::with_capacity(articles.len());
        {
            let mut stmt = tx.prepare(ARTICLE_INSERT)?;
            for ((analysed, outlet_id), topic_ids) in articles.into_iter().zip(outlet_ids).zip(topic_ids) {
                let article = &analysed.article;
                let s = analysed.sentiment;
                let id: Option<i64> = stmt
                    .query_row(
                        params![
                            outlet_id,
                            article.headline,
                            article.url,
                            article.published_date.to_rfc3339(),
                            analysed.subjectivity,
                            analysed.polarity,
                            s.positive,
                            s.neutral,
                            s.negative,
                            s.compound,
                        ],
                        |row| row.get(0),
                    )
                    .optional()?;

                match id {
                    Some(id) => {
                        persisted.push(PersistedArticle { id, analysis: analysed });
                        persisted_topic_ids.push(topic_ids);
                    }
                    None => warn!(url = %article.url, "Article already stored; skipping it and its topics"),
                }
            }
        }

        let mut topic_rows = 0;
        {
            let mut stmt = tx.prepare(ARTICLE_TOPIC_INSERT)?;
            for (article, topic_ids) in persisted.iter().zip(&persisted_topic_ids) {
                for (topic, topic_id) in article.analysis.topics.iter().zip(topic_ids) {
                    let s = topic.sentiment;
                    topic_rows += stmt.execute(params![
                        article.id,
                        topic_id,
                        s.positive,
                        s.negative,
                        s.neutral,
                        s.compound,
                    ])?;
                }
                debug!(article_id = article.id, topics = topic_ids.len(), "Inserted article topics");
            }
        }
        tx.commit()?;

        info!(articles = persisted.len(), topic_rows, "Committed batch");
        Ok(persisted)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Article, SentimentScores, TopicAnalysis};
    use chrono::{TimeZone, Utc};

    pub(crate) const OUTLETS: &[&str] = &["The Guardian", "Daily Express"];

    pub(crate) fn topics() -> Vec<String> {
        ["Economy", "Politics", "Health"].into_iter().map(String::from).collect()
    }

    /// In-memory store with the schema and dimensions in place.
    pub(crate) fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        seed_dimensions(&conn, OUTLETS, &topics()).unwrap();
        conn
    }

    fn scores(compound: f64) -> SentimentScores {
        SentimentScores {
            positive: 0.2,
            neutral: 0.7,
            negative: 0.1,
            compound,
        }
    }

    fn analysed(outlet: &str, url: &str, topic_names: &[&str]) -> AnalyzedArticle {
        AnalyzedArticle {
            article: Article {
                news_outlet: outlet.to_string(),
                headline: format!("Headline for {url}"),
                url: url.to_string(),
                published_date: Utc.with_ymd_and_hms(2024, 4, 10, 14, 30, 0).unwrap(),
                body: "Body".to_string(),
            },
            subjectivity: 0.5,
            polarity: 0.1,
            sentiment: scores(0.3),
            topics: topic_names
                .iter()
                .map(|name| TopicAnalysis {
                    topic_name: name.to_string(),
                    key_terms: vec!["Body".to_string()],
                    sentiment: scores(-0.2),
                })
                .collect(),
        }
    }

    fn count(db: &DatabaseManager, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_dimensions_are_cached() {
        let db = DatabaseManager::new(seeded_connection()).unwrap();
        assert_eq!(db.get_valid_topics(), topics().as_slice());
        assert!(db.outlet_id("The Guardian").is_ok());
        assert!(matches!(db.outlet_id("The Times"), Err(LoadError::UnknownOutlet(_))));
    }

    #[test]
    fn test_seeding_is_idempotent() {
        let conn = seeded_connection();
        init_schema(&conn).unwrap();
        seed_dimensions(&conn, OUTLETS, &topics()).unwrap();
        let db = DatabaseManager::new(conn).unwrap();
        assert_eq!(count(&db, "topic"), 3);
        assert_eq!(count(&db, "news_outlet"), 2);
    }

    #[test]
    fn test_round_trip_row_counts_and_ids() {
        let mut db = DatabaseManager::new(seeded_connection()).unwrap();
        let batch = vec![
            analysed("The Guardian", "http://a", &["Economy", "Politics"]),
            analysed("Daily Express", "http://b", &[]),
            analysed("The Guardian", "http://c", &["Health", "Economy", "Politics"]),
        ];

        let persisted = db.insert_into_database(batch).unwrap();
        assert_eq!(persisted.len(), 3);
        assert_eq!(count(&db, "article"), 3);
        assert_eq!(count(&db, "article_topic"), 5);

        for article in &persisted {
            let stored_url: String = db
                .conn
                .query_row(
                    "SELECT article_url FROM article WHERE article_id = ?1",
                    [article.id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(stored_url, article.analysis.article.url);

            let topic_rows: i64 = db
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM article_topic WHERE article_id = ?1",
                    [article.id],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(topic_rows as usize, article.analysis.topics.len());
        }

        let mut urls = db.get_article_urls().unwrap();
        urls.sort();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
    }

    #[test]
    fn test_topic_sentiment_columns() {
        let mut db = DatabaseManager::new(seeded_connection()).unwrap();
        let persisted = db
            .insert_into_database(vec![analysed("The Guardian", "http://a", &["Economy"])])
            .unwrap();
        let (positive, negative, neutral, compound): (f64, f64, f64, f64) = db
            .conn
            .query_row(
                "SELECT article_topic_positive_sentiment, article_topic_negative_sentiment,
                        article_topic_neutral_sentiment, article_topic_compound_sentiment
                 FROM article_topic WHERE article_id = ?1",
                [persisted[0].id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!((positive, negative, neutral, compound), (0.2, 0.1, 0.7, -0.2));
    }

    #[test]
    fn test_unknown_outlet_writes_nothing() {
        let mut db = DatabaseManager::new(seeded_connection()).unwrap();
        let batch = vec![
            analysed("The Guardian", "http://a", &["Economy"]),
            analysed("The Times", "http://b", &[]),
        ];
        let err = db.insert_into_database(batch).unwrap_err();
        assert!(matches!(err, LoadError::UnknownOutlet(name) if name == "The Times"));
        assert_eq!(count(&db, "article"), 0);
    }

    #[test]
    fn test_unknown_topic_writes_nothing() {
        let mut db = DatabaseManager::new(seeded_connection()).unwrap();
        let err = db
            .insert_into_database(vec![analysed("The Guardian", "http://a", &["Sport"])])
            .unwrap_err();
        assert!(matches!(err, LoadError::UnknownTopic(_)));
        assert_eq!(count(&db, "article"), 0);
    }

    #[test]
    fn test_topic_row_failure_rolls_back_articles() {
        let mut db = DatabaseManager::new(seeded_connection()).unwrap();
        let batch = vec![
            analysed("The Guardian", "http://a", &["Politics"]),
            // same topic twice violates the article_topic primary key in the second pass
            analysed("The Guardian", "http://b", &["Economy", "Economy"]),
        ];

        let err = db.insert_into_database(batch).unwrap_err();
        assert!(matches!(err, LoadError::Sqlite(_)), "{err:?}");
        assert_eq!(count(&db, "article"), 0);
        assert_eq!(count(&db, "article_topic"), 0);

        let persisted = db
            .insert_into_database(vec![analysed("The Guardian", "http://b", &["Economy"])])
            .unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(count(&db, "article"), 1);
    }

    #[test]
    fn test_already_stored_url_is_skipped_with_its_topics() {
        let mut db = DatabaseManager::new(seeded_connection()).unwrap();
        db.insert_into_database(vec![analysed("The Guardian", "http://a", &["Economy"])])
            .unwrap();

        let persisted = db
            .insert_into_database(vec![
                analysed("The Guardian", "http://a", &["Politics", "Health"]),
                analysed("Daily Express", "http://b", &["Health"]),
            ])
            .unwrap();

        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].analysis.article.url, "http://b");
        assert_eq!(count(&db, "article"), 2);
        assert_eq!(count(&db, "article_topic"), 2);
    }
}
