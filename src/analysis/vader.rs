//! VADER-style lexicon sentiment analyzer.
//!
//! Word valences come from `data/vader_lexicon.txt` (`token<TAB>valence`,
//! valences on a -4..4 scale). Valences are adjusted by preceding booster
//! words, negations, ALL-CAPS emphasis, a contrastive "but", and trailing
//! `!`/`?` runs, then summarised into the positive/neutral/negative
//! proportions and the normalised compound score.

use crate::models::SentimentScores;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    include_str!("../../data/vader_lexicon.txt")
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(parse_entry)
        .collect()
});

/// `token<TAB>mean` with the std-dev and raw-ratings columns of the published
/// lexicon allowed (and ignored) after it.
fn parse_entry(line: &str) -> Option<(&str, f64)> {
    let mut fields = line.split('\t');
    let token = fields.next()?.trim();
    let valence = fields.next()?.trim().parse().ok()?;
    Some((token, valence))
}

const BOOSTER_INCREMENT: f64 = 0.293;
const BOOSTER_DECREMENT: f64 = -0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZATION_ALPHA: f64 = 15.0;

const INCREMENTERS: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "enormously", "entirely", "especially", "exceptionally", "extremely", "fabulously", "fully",
    "greatly", "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most",
    "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
    "thoroughly", "totally", "tremendously", "unbelievably", "unusually", "utterly", "very",
];

const DECREMENTERS: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "less", "little", "marginally", "occasionally",
    "partly", "scarcely", "slightly", "somewhat", "sorta",
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "neednt", "never", "none", "nope",
    "nor", "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "wasnt", "werent",
    "without", "wont", "wouldnt", "rarely", "seldom", "despite",
];

fn booster(word: &str) -> Option<f64> {
    if INCREMENTERS.contains(&word) {
        Some(BOOSTER_INCREMENT)
    } else if DECREMENTERS.contains(&word) {
        Some(BOOSTER_DECREMENT)
    } else {
        None
    }
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

fn is_shouting(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

/// Round to `places` decimals.
fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Map an unbounded valence sum into `[-1, 1]`.
pub fn normalize(score: f64) -> f64 {
    (score / (score * score + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Split on whitespace and strip surrounding punctuation from words, leaving
/// short tokens such as emoticons untouched.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 2 { token } else { stripped }
        })
        .collect()
}

/// Lexicon-based sentiment analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentIntensityAnalyzer;

impl SentimentIntensityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score `text`; empty or lexicon-free text scores all zeros except `neutral`.
    pub fn polarity_scores(&self, text: &str) -> SentimentScores {
        let words = tokenize(text);
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let caps_differ = words.iter().any(|w| is_shouting(w)) && !words.iter().all(|w| is_shouting(w));

        let mut sentiments: Vec<f64> = (0..words.len())
            .map(|i| self.valence(&words, &lowered, i, caps_differ))
            .collect();

        if let Some(but) = lowered.iter().position(|w| w == "but") {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < but {
                    *s *= 0.5;
                } else if i > but {
                    *s *= 1.5;
                }
            }
        }

        score_valence(&sentiments, text)
    }

    fn valence(&self, words: &[&str], lowered: &[String], i: usize, caps_differ: bool) -> f64 {
        let word = lowered[i].as_str();
        if booster(word).is_some() {
            return 0.0;
        }
        let Some(&base) = LEXICON.get(word) else {
            return 0.0;
        };

        // "no" directly before a rated word only negates it
        if word == "no" && lowered.get(i + 1).is_some_and(|next| LEXICON.contains_key(next.as_str())) {
            return 0.0;
        }

        let mut valence = base;
        if caps_differ && is_shouting(words[i]) {
            valence += if valence > 0.0 { CAPS_INCREMENT } else { -CAPS_INCREMENT };
        }

        for distance in 1..=3 {
            if i < distance {
                break;
            }
            let prior = lowered[i - distance].as_str();
            if !LEXICON.contains_key(prior) {
                if let Some(mut scalar) = booster(prior) {
                    if valence < 0.0 {
                        scalar = -scalar;
                    }
                    if caps_differ && is_shouting(words[i - distance]) {
                        scalar += if valence > 0.0 { CAPS_INCREMENT } else { -CAPS_INCREMENT };
                    }
                    let dampening = match distance {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    valence += scalar * dampening;
                }
            }
            if is_negation(prior) {
                let emphatic_never = distance > 1
                    && prior == "never"
                    && matches!(lowered[i - 1].as_str(), "so" | "this");
                valence *= if emphatic_never { 1.25 } else { NEGATION_SCALAR };
            }
        }

        valence
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n if n <= 3 => n as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + questions
}

fn score_valence(sentiments: &[f64], text: &str) -> SentimentScores {
    if sentiments.is_empty() {
        return SentimentScores::default();
    }

    let emphasis = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }

    let mut positive = 0.0;
    let mut negative = 0.0;
    let mut neutral = 0.0;
    for &s in sentiments {
        if s > 0.0 {
            positive += s + 1.0;
        } else if s < 0.0 {
            negative += s - 1.0;
        } else {
            neutral += 1.0;
        }
    }
    if positive > negative.abs() {
        positive += emphasis;
    } else if positive < negative.abs() {
        negative -= emphasis;
    }

    let total = positive + negative.abs() + neutral;
    SentimentScores {
        positive: round((positive / total).abs(), 3),
        neutral: round((neutral / total).abs(), 3),
        negative: round((negative / total).abs(), 3),
        compound: round(normalize(sum), 4),
    }
}
