//! Daily Express article body extraction.
//!
//! The article text lives in `<div class="text-description">` containers. Only
//! divs whose class attribute is exactly that single class count; every `<p>`
//! inside them is concatenated in document order.

use super::Outlet;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static DIV_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.text-description").expect("static selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Scraping strategy for express.co.uk.
#[derive(Debug, Clone, Copy, Default)]
pub struct Express;

fn has_only_content_class(div: &ElementRef<'_>) -> bool {
    let mut classes = div.value().classes();
    classes.next() == Some("text-description") && classes.next().is_none()
}

impl Outlet for Express {
    fn outlet_name(&self) -> &'static str {
        "Daily Express"
    }

    fn extract_text(&self, document: &Html) -> String {
        document
            .select(&DIV_SELECTOR)
            .filter(has_only_content_class)
            .flat_map(|div| div.select(&PARAGRAPH_SELECTOR).collect::<Vec<_>>())
            .flat_map(|p| p.text())
            .collect()
    }
}
