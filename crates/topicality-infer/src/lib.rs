//! Topicality Infer: sentence sentiment classification and image scoring.
//!
//! Provides the `SentimentClassifier` trait and the document scorer that
//! averages per-sentence outputs. When the `onnx` feature is enabled and model
//! files are present, `OnnxClassifier` runs FinBERT-tone. Without it,
//! `LexiconClassifier` scores with financial word lists.

pub mod cache;
pub mod classifier;
pub mod image;
pub mod lexicon;
pub mod onnx_classifier;
pub mod scorer;

pub use cache::{CachedClassifier, ScoreCache};
pub use classifier::{LabelScores, SentimentClassifier, SentimentLabel, SentimentTriple};
pub use image::{
    default_image_scorers, meme_sentiment, ImagePolarity, ImageSentimentScorer,
    NeutralImageScorer,
};
pub use lexicon::LexiconClassifier;
pub use scorer::score;

#[cfg(feature = "onnx")]
pub use onnx_classifier::OnnxClassifier;

use std::path::Path;

/// Create the best available classifier for the given model directory.
///
/// Tries ONNX first (if feature enabled and model files present),
/// falls back to `LexiconClassifier`. Either way the result is wrapped in a
/// per-sentence cache.
pub fn create_classifier(model_dir: &Path) -> Box<dyn SentimentClassifier> {
    #[cfg(feature = "onnx")]
    {
        match OnnxClassifier::load(model_dir) {
            Ok(classifier) => {
                return Box::new(CachedClassifier::new(classifier, ScoreCache::default_cache()));
            }
            Err(e) => {
                tracing::warn!("ONNX classifier unavailable: {}. Falling back to lexicon.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::warn!(
            "ONNX feature disabled; ignoring {} and using lexicon classifier.",
            model_dir.display()
        );
    }

    Box::new(CachedClassifier::new(
        LexiconClassifier::new(),
        ScoreCache::default_cache(),
    ))
}
