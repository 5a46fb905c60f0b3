//! The Guardian article body extraction.
//!
//! Guardian article pages mark every body paragraph with a generated CSS class
//! (`dcr-16w5gq9` at the time of writing). Paragraphs carrying that class are
//! concatenated in document order.

use super::Outlet;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.dcr-16w5gq9").expect("static selector"));

/// Scraping strategy for theguardian.com.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guardian;

impl Outlet for Guardian {
    fn outlet_name(&self) -> &'static str {
        "The Guardian"
    }

    fn extract_text(&self, document: &Html) -> String {
        document
            .select(&PARAGRAPH_SELECTOR)
            .flat_map(|p| p.text())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlet_name() {
        assert_eq!(Guardian.outlet_name(), "The Guardian");
    }

    #[test]
    fn test_extract_body_concatenates_paragraphs() {
        let html = r#"
        <html>
            <body>
                <p class="dcr-16w5gq9">Part 1.</p>
                <p class="dcr-16w5gq9">Part 2.</p>
            </body>
        </html>
        "#;
        assert_eq!(Guardian.extract_body(html).as_deref(), Some("Part 1.Part 2."));
    }

    #[test]
    fn test_extract_body_keeps_inline_markup_text() {
        let html = r#"<p class="dcr-16w5gq9 extra">The <a href="/x">minister</a> said.</p>"#;
        assert_eq!(
            Guardian.extract_body(html).as_deref(),
            Some("The minister said.")
        );
    }

    #[test]
    fn test_extract_text_ignores_other_paragraphs() {
        let html = r#"<html><body><p class="some-other-class">Nothing here</p></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(Guardian.extract_text(&document), "");
        assert_eq!(Guardian.extract_body(html), None);
    }
}
