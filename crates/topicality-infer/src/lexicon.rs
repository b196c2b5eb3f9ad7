//! Heuristic financial-tone classifier: used when no model is available.
//!
//! Counts hits against small positive/negative word lists. With `h` hits the
//! neutral probability is `1 / (1 + h)`; the remainder is split between
//! positive and negative in proportion to their hit counts.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use topicality_core::{Error, Result};

use crate::classifier::{LabelScores, SentimentClassifier, SentimentLabel};

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "gain", "gains", "gained", "growth", "grew", "grow", "profit", "profits",
        "profitable", "record", "beat", "beats", "surge", "surged", "soar", "soared",
        "rally", "rallied", "rise", "rose", "rising", "strong", "stronger", "improve",
        "improved", "improvement", "success", "successful", "boost", "boosted",
        "upgrade", "upgraded", "outperform", "exceeded", "expansion", "win", "won",
        "innovative", "optimistic", "rebound", "recovered", "recovery", "positive",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "loss", "losses", "lost", "decline", "declined", "declining", "fall", "fell",
        "falling", "drop", "dropped", "plunge", "plunged", "slump", "weak", "weaker",
        "miss", "missed", "lawsuit", "sued", "fraud", "recall", "recalled", "layoff",
        "layoffs", "cut", "cuts", "bankruptcy", "downgrade", "downgraded", "crisis",
        "scandal", "fine", "fined", "probe", "investigation", "warning", "risk",
        "risks", "pessimistic", "strike", "boycott", "negative",
    ]
    .into_iter()
    .collect()
});

/// Word-list classifier.
#[derive(Debug, Default, Clone)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    fn score_text(text: &str) -> LabelScores {
        let (mut pos, mut neg) = (0usize, 0usize);
        for word in text
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_ascii_lowercase();
            if POSITIVE_WORDS.contains(word.as_str()) {
                pos += 1;
            } else if NEGATIVE_WORDS.contains(word.as_str()) {
                neg += 1;
            }
        }

        let hits = (pos + neg) as f64;
        let neutral = 1.0 / (1.0 + hits);
        let polar = 1.0 - neutral;
        let (p, n) = if hits > 0.0 {
            (polar * pos as f64 / hits, polar * neg as f64 / hits)
        } else {
            (0.0, 0.0)
        };

        LabelScores::from([
            (SentimentLabel::Positive, p),
            (SentimentLabel::Neutral, neutral),
            (SentimentLabel::Negative, n),
        ])
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
        if texts.is_empty() {
            return Err(Error::EmptyClassifierInput);
        }
        Ok(texts.iter().map(|t| Self::score_text(t)).collect())
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SentimentTriple;

    fn triple(text: &str) -> SentimentTriple {
        let out = LexiconClassifier::new().classify(&[text]).unwrap();
        SentimentTriple::from_scores(&out[0])
    }

    #[test]
    fn test_neutral_text() {
        assert_eq!(triple("The board met on Tuesday."), SentimentTriple::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_polar_text() {
        let t = triple("Profits surged to a record, but a lawsuit loomed.");
        assert!(t.positive > t.negative);
        assert!((t.positive + t.neutral + t.negative - 1.0).abs() < 1e-9);
        assert!((t.neutral - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = LexiconClassifier::new().classify(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyClassifierInput));
    }
}
