//! Pattern-style subjectivity and polarity analyzer.
//!
//! Each rated word (mostly adjectives, see `data/subjectivity_lexicon.txt`)
//! carries a polarity in `[-1, 1]` and a subjectivity in `[0, 1]`. A directly
//! preceding intensifier scales both; a negation within the three preceding
//! words multiplies polarity by `-0.5`. The text scores are the means over
//! all rated words.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    include_str!("../../data/subjectivity_lexicon.txt")
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let word = fields.next()?.trim();
            let polarity = fields.next()?.trim().parse().ok()?;
            let subjectivity = fields.next()?.trim().parse().ok()?;
            Some((word, (polarity, subjectivity)))
        })
        .collect()
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)?").expect("static regex"));

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("deeply", 1.4),
    ("highly", 1.3),
    ("so", 1.3),
    ("too", 1.2),
    ("quite", 1.1),
    ("rather", 0.9),
    ("somewhat", 0.8),
    ("slightly", 0.5),
];

const NEGATIONS: &[&str] = &["not", "never", "no", "neither", "nor", "without"];
const NEGATION_FACTOR: f64 = -0.5;
const NEGATION_WINDOW: usize = 3;

/// Whole-text subjectivity/polarity pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Subjectivity {
    pub polarity: f64,
    pub subjectivity: f64,
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

/// Score `text`; text without rated words scores zero on both axes.
pub fn analyze(text: &str) -> Subjectivity {
    let words: Vec<String> = WORD
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();

    let mut assessments: Vec<(f64, f64)> = Vec::new();
    let mut last_negation: Option<usize> = None;

    for (i, word) in words.iter().enumerate() {
        if is_negation(word) {
            last_negation = Some(i);
            continue;
        }
        let Some(&(mut polarity, mut subjectivity)) = LEXICON.get(word.as_str()) else {
            continue;
        };

        let intensity = i
            .checked_sub(1)
            .and_then(|p| INTENSIFIERS.iter().find(|(w, _)| *w == words[p]))
            .map_or(1.0, |(_, factor)| *factor);
        polarity *= intensity;
        subjectivity *= intensity;

        if last_negation.is_some_and(|n| i - n <= NEGATION_WINDOW) {
            polarity *= NEGATION_FACTOR;
            last_negation = None;
        }

        assessments.push((polarity.clamp(-1.0, 1.0), subjectivity.clamp(0.0, 1.0)));
    }

    if assessments.is_empty() {
        return Subjectivity::default();
    }
    let n = assessments.len() as f64;
    Subjectivity {
        polarity: assessments.iter().map(|a| a.0).sum::<f64>() / n,
        subjectivity: assessments.iter().map(|a| a.1).sum::<f64>() / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_text_scores_zero() {
        let s = analyze("The committee meets on Tuesday in the capital.");
        assert_eq!(s, Subjectivity::default());
    }

    #[test]
    fn test_opinionated_text_is_subjective() {
        let s = analyze("It was a wonderful, beautiful ceremony.");
        assert!(s.polarity > 0.8, "{s:?}");
        assert!(s.subjectivity > 0.9, "{s:?}");
    }

    #[test]
    fn test_mean_over_rated_words() {
        let s = analyze("A good plan with a bad ending.");
        assert!((s.polarity - 0.0).abs() < 1e-9, "{s:?}");
        assert!((s.subjectivity - (0.6 + 0.67) / 2.0).abs() < 1e-9, "{s:?}");
    }

    #[test]
    fn test_news_vocabulary_is_rated() {
        let s = analyze("Ministers hailed the landmark deal as a historic victory for British farmers.");
        assert!(s.polarity > 0.0, "{s:?}");
        assert!(s.subjectivity > 0.0, "{s:?}");

        let s = analyze("The prime minister was accused of lying to parliament amid a growing scandal.");
        assert!(s.polarity < 0.0, "{s:?}");
        assert!(s.subjectivity > 0.0, "{s:?}");
    }

    #[test]
    fn test_lexicon_covers_common_adjectives() {
        assert!(LEXICON.len() > 450);
        assert_eq!(LEXICON["good"], (0.7, 0.6));
    }

    #[test]
    fn test_negation_halves_and_flips() {
        let s = analyze("The outcome was not good.");
        assert!((s.polarity - (-0.35)).abs() < 1e-9, "{s:?}");
    }

    #[test]
    fn test_intensifier_scales_and_clamps() {
        let s = analyze("A very good result.");
        assert!((s.polarity - 0.91).abs() < 1e-9, "{s:?}");
        let s = analyze("An extremely excellent result.");
        assert_eq!(s.polarity, 1.0);
        assert_eq!(s.subjectivity, 1.0);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let s = analyze("Terrible, horrible, shocking, cruel and nasty!");
        assert!(s.polarity >= -1.0 && s.polarity <= 0.0);
        assert!(s.subjectivity >= 0.0 && s.subjectivity <= 1.0);
    }
}
