//! Sentiment classifier trait and label types.
//!
//! The `SentimentClassifier` trait abstracts over text classification.
//! Implementations:
//! - `OnnxClassifier`: FinBERT-tone via ONNX Runtime (requires the `onnx` feature)
//! - `LexiconClassifier`: financial-tone word lists, no model files needed

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use topicality_core::Result;

/// Sentiment classes produced by every classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// All labels, in tie-breaking order.
    pub const ALL: [SentimentLabel; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Parse a model label name (`"Positive"`, `"negative"`, `"NEU"`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Some(Self::Positive),
            "neutral" | "neu" => Some(Self::Neutral),
            "negative" | "neg" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Per-text classifier output: label → probability.
pub type LabelScores = BTreeMap<SentimentLabel, f64>;

/// Document-level (Positive, Neutral, Negative) scores.
///
/// The classifier contract makes these sum to roughly 1.0; nothing here
/// enforces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentTriple {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentTriple {
    pub fn new(positive: f64, neutral: f64, negative: f64) -> Self {
        Self {
            positive,
            neutral,
            negative,
        }
    }

    /// Take the three known labels from a score map; absent labels count as 0.
    pub fn from_scores(scores: &LabelScores) -> Self {
        let get = |label| scores.get(&label).copied().unwrap_or(0.0);
        Self::new(
            get(SentimentLabel::Positive),
            get(SentimentLabel::Neutral),
            get(SentimentLabel::Negative),
        )
    }

    pub fn get(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    /// Highest-scoring label; ties resolve in `SentimentLabel::ALL` order.
    pub fn dominant(&self) -> SentimentLabel {
        let mut best = SentimentLabel::Positive;
        for label in SentimentLabel::ALL {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }
}

/// Trait for text sentiment backends.
pub trait SentimentClassifier: Send + Sync {
    /// Classify a batch of texts, one score map per text, in input order.
    ///
    /// Callers must not pass an empty batch.
    fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}
