//! Sentence tokenizer for article bodies.
//!
//! Splits after `.`, `!` or `?` (plus any closing quotes or brackets) when
//! followed by whitespace, unless the terminator belongs to a known
//! abbreviation or a single-letter initial, or the next word starts in lower
//! case. Text without whitespace after a terminator stays in one sentence.

use once_cell::sync::Lazy;
use regex::Regex;

static BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?]+["'\u{2019}\u{201D})\]]*\s+"#).expect("static regex")
});

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "gov", "sen", "rep",
    "gen", "col", "lt", "sgt", "capt", "mt", "inc", "ltd", "co", "corp", "dept", "approx", "jan",
    "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "u.k",
    "e.g", "i.e", "cf", "al",
];

/// "No." only abbreviates "number", so it must be followed by a digit.
fn is_number_sign(word: &str, next: Option<char>) -> bool {
    word.eq_ignore_ascii_case("no") && next.is_some_and(|c| c.is_ascii_digit())
}

fn ends_with_abbreviation(preceding: &str, next: Option<char>) -> bool {
    let Some(word) = preceding.split_whitespace().next_back() else {
        return false;
    };
    let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());
    if !word.ends_with('.') && !preceding.ends_with('.') {
        return false;
    }
    let word = word.trim_end_matches('.');
    let is_initial = word.chars().count() == 1 && word.chars().all(char::is_uppercase);
    is_initial || is_number_sign(word, next) || ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Split `text` into trimmed, non-empty sentences borrowed from the input.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in BOUNDARY.find_iter(text) {
        let head = &text[start..boundary.start() + 1];
        let next = text[boundary.end()..].chars().next();
        let next_starts_lower = next.is_some_and(char::is_lowercase);

        if ends_with_abbreviation(head, next) || next_starts_lower {
            continue;
        }

        let sentence = text[start..boundary.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}
