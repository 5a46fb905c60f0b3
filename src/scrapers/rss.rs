//! Feed entry reader on top of `feed_rs`.
//!
//! Only the three fields the pipeline needs are kept: the title as plain text,
//! an absolute article link and the publish stamp. RSS 0.9x/1.0/2.0, Atom and
//! JSON Feed are all accepted.

use crate::error::FeedError;
use feed_rs::model::Entry;
use feed_rs::parser;
use itertools::Itertools;
use scraper::Html;
use url::Url;

/// HTML named entities that feeds use but XML does not define.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", "&#160;"),
    ("&ndash;", "&#8211;"),
    ("&mdash;", "&#8212;"),
    ("&lsquo;", "&#8216;"),
    ("&rsquo;", "&#8217;"),
    ("&ldquo;", "&#8220;"),
    ("&rdquo;", "&#8221;"),
    ("&hellip;", "&#8230;"),
    ("&pound;", "&#163;"),
    ("&euro;", "&#8364;"),
    ("&apos;", "&#39;"),
    ("&amp;amp;", "&amp;"),
];

/// One entry of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    /// Absolute article URL, `None` when the entry had no usable link.
    pub link: Option<String>,
    /// RFC 2822 stamp (`Wed, 10 Apr 2024 14:30:00 +0000`), empty when the
    /// entry carried no date the feed parser understood.
    pub published: String,
}

fn normalise_entities(xml: &str) -> String {
    let xml = xml.trim_start_matches('\u{FEFF}').trim();
    HTML_ENTITIES
        .iter()
        .fold(xml.to_string(), |acc, (named, numeric)| acc.replace(named, numeric))
}

/// Text content of a possibly HTML-escaped title, whitespace collapsed.
fn plain_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .join(" ")
}

/// First non-empty link, else the entry id when it is itself a URL (an RSS
/// `guid` permalink).
fn entry_link(entry: &Entry, base: &Url) -> Option<String> {
    let href = entry
        .links
        .iter()
        .map(|link| link.href.trim())
        .find(|href| !href.is_empty())
        .or_else(|| {
            let id = entry.id.trim();
            (id.starts_with("http://") || id.starts_with("https://")).then_some(id)
        })?;
    base.join(href).ok().map(String::from)
}

/// Parse the entries of a feed document.
///
/// # Arguments
///
/// * `xml` - The downloaded feed document
/// * `feed_url` - URL the document came from; relative links are resolved against it
///
/// # Returns
///
/// Entries in document order, including those without a link (skipping them
/// is the caller's decision).
///
/// # Errors
///
/// [`FeedError::Url`] when `feed_url` is not absolute, [`FeedError::Parse`]
/// when the document is not a feed.
///
/// # Examples
///
/// ```ignore
/// let xml = r#"<rss version="2.0"><channel><item>
///   <title>Budget vote delayed</title><link>/politics/budget</link>
/// </item></channel></rss>"#;
/// let entries = parse_feed(xml, "https://www.theguardian.com/politics/rss")?;
/// assert_eq!(entries[0].link.as_deref(), Some("https://www.theguardian.com/politics/budget"));
/// ```
pub fn parse_feed(xml: &str, feed_url: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let base = Url::parse(feed_url).map_err(|source| FeedError::Url {
        url: feed_url.to_string(),
        source,
    })?;

    let cleaned = normalise_entities(xml);
    let feed = parser::parse(cleaned.as_bytes())?;

    Ok(feed
        .entries
        .iter()
        .map(|entry| FeedEntry {
            title: entry
                .title
                .as_ref()
                .map(|t| plain_text(&t.content))
                .unwrap_or_default(),
            link: entry_link(entry, &base),
            published: entry
                .published
                .or(entry.updated)
                .map(|d| d.to_rfc2822())
                .unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_URL: &str = "https://www.theguardian.com/politics/rss";

    fn rss(items: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Politics</title>{items}</channel></rss>"#)
    }

    #[test]
    fn test_parse_feed_reads_items() {
        let xml = rss(r#"
  <item>
    <title>Budget vote delayed</title>
    <link>https://www.theguardian.com/politics/2024/apr/10/budget</link>
    <pubDate>Wed, 10 Apr 2024 14:30:00 GMT</pubDate>
  </item>
  <item>
    <title><![CDATA[Tariffs & trade]]></title>
    <link>/politics/2024/apr/10/tariffs</link>
    <pubDate>Wed, 10 Apr 2024 16:00:00 +0100</pubDate>
  </item>"#);

        let entries = parse_feed(&xml, FEED_URL).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Budget vote delayed");
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.theguardian.com/politics/2024/apr/10/budget")
        );
        assert_eq!(entries[0].published, "Wed, 10 Apr 2024 14:30:00 +0000");
        assert_eq!(entries[1].title, "Tariffs & trade");
        assert_eq!(
            entries[1].link.as_deref(),
            Some("https://www.theguardian.com/politics/2024/apr/10/tariffs")
        );
        assert_eq!(entries[1].published, "Wed, 10 Apr 2024 15:00:00 +0000");
    }

    #[test]
    fn test_parse_feed_strips_markup_from_titles() {
        let xml = rss(
            "<item><title>Tories &lt;em&gt;split&lt;/em&gt; over budget</title>\
             <link>https://example.com/a</link></item>",
        );
        let entries = parse_feed(&xml, FEED_URL).unwrap();
        assert_eq!(entries[0].title, "Tories split over budget");
    }

    #[test]
    fn test_parse_feed_keeps_html_named_entities() {
        let xml = rss(
            "<item><title>Starmer&rsquo;s plan &ndash; explained</title>\
             <link>https://example.com/a</link></item>",
        );
        let entries = parse_feed(&xml, FEED_URL).unwrap();
        assert_eq!(entries[0].title, "Starmer\u{2019}s plan \u{2013} explained");
    }

    #[test]
    fn test_parse_feed_uses_guid_permalink() {
        let xml = rss(
            r#"<item><title>Guid only</title>
               <guid isPermaLink="true">https://www.theguardian.com/politics/2024/apr/10/guid</guid></item>"#,
        );
        let entries = parse_feed(&xml, FEED_URL).unwrap();
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://www.theguardian.com/politics/2024/apr/10/guid")
        );
    }

    #[test]
    fn test_parse_feed_entry_without_link() {
        let xml = rss(
            "<item><title>Has link</title><link>https://example.com/a</link></item>\
             <item><title>No link</title><pubDate>Wed, 10 Apr 2024 14:30:00 +0000</pubDate></item>",
        );

        let entries = parse_feed(&xml, FEED_URL).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].link.is_some());
        assert_eq!(entries[1].link, None);
    }

    #[test]
    fn test_parse_feed_resolves_entities_in_link() {
        let xml = rss("<item><title>Q &amp; A</title><link>https://example.com/a?x=1&amp;y=2</link></item>");
        let entries = parse_feed(&xml, FEED_URL).unwrap();
        assert_eq!(entries[0].title, "Q & A");
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/a?x=1&y=2"));
    }

    #[test]
    fn test_parse_feed_reads_atom() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>World</title>
  <id>urn:uuid:60a76c80-d399-11d9-b91C-0003939e0af6</id>
  <updated>2024-04-10T14:30:00Z</updated>
  <entry>
    <title>Summit ends</title>
    <link href="https://example.com/summit"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-04-10T14:30:00Z</updated>
  </entry>
</feed>"#;
        let entries = parse_feed(xml, FEED_URL).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Summit ends");
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/summit"));
        assert_eq!(entries[0].published, "Wed, 10 Apr 2024 14:30:00 +0000");
    }

    #[test]
    fn test_parse_feed_rejects_non_feeds() {
        assert!(matches!(
            parse_feed("<html><body>Not a feed</body></html>", FEED_URL),
            Err(FeedError::Parse(_))
        ));
        assert!(parse_feed("", FEED_URL).is_err());
    }

    #[test]
    fn test_parse_feed_rejects_relative_feed_url() {
        assert!(matches!(parse_feed(&rss(""), "/politics/rss"), Err(FeedError::Url { .. })));
    }

    #[test]
    fn test_plain_text_collapses_whitespace() {
        assert_eq!(plain_text("  Rates <b>held</b>\n  at 5%  "), "Rates held at 5%");
    }
}
