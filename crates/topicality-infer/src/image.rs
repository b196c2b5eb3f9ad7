//! Meme image sentiment boundary.
//!
//! Image models (CLIP zero-shot, OCR + text sentiment) live outside this
//! workspace. Each one is plugged in as an `ImageSentimentScorer` for a single
//! modality and reports a (positive, negative) pair.

use std::path::Path;

/// Positive/negative scores for one image under one modality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePolarity {
    pub pos: f64,
    pub neg: f64,
}

impl ImagePolarity {
    /// Score used when an image cannot be read or scored.
    pub const NEUTRAL: ImagePolarity = ImagePolarity { pos: 0.5, neg: 0.5 };

    pub fn net(&self) -> f64 {
        self.pos - self.neg
    }
}

/// One image modality. Implementations must not fail: an unreadable image
/// scores `ImagePolarity::NEUTRAL`.
pub trait ImageSentimentScorer: Send + Sync {
    fn modality(&self) -> &str;

    fn score(&self, path: &Path) -> ImagePolarity;
}

/// Scorer for a modality with no model attached; always neutral.
#[derive(Debug, Clone)]
pub struct NeutralImageScorer {
    modality: String,
}

impl NeutralImageScorer {
    pub fn new(modality: impl Into<String>) -> Self {
        Self {
            modality: modality.into(),
        }
    }
}

impl ImageSentimentScorer for NeutralImageScorer {
    fn modality(&self) -> &str {
        &self.modality
    }

    fn score(&self, _path: &Path) -> ImagePolarity {
        ImagePolarity::NEUTRAL
    }
}

/// Default modalities: CLIP and OCR, both neutral until a model is plugged in.
pub fn default_image_scorers() -> Vec<Box<dyn ImageSentimentScorer>> {
    vec![
        Box::new(NeutralImageScorer::new("clip")),
        Box::new(NeutralImageScorer::new("ocr")),
    ]
}

/// Per-image sentiment: mean over modalities of `pos - neg`.
///
/// A missing file scores neutral in every modality. No scorers → 0.0.
pub fn meme_sentiment(path: &Path, scorers: &[Box<dyn ImageSentimentScorer>]) -> f64 {
    if scorers.is_empty() {
        return 0.0;
    }
    let readable = path.is_file();
    let total: f64 = scorers
        .iter()
        .map(|s| {
            if readable {
                s.score(path).net()
            } else {
                ImagePolarity::NEUTRAL.net()
            }
        })
        .sum();
    total / scorers.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ImagePolarity);

    impl ImageSentimentScorer for Fixed {
        fn modality(&self) -> &str {
            "fixed"
        }
        fn score(&self, _path: &Path) -> ImagePolarity {
            self.0
        }
    }

    #[test]
    fn test_default_scorers_are_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.png");
        std::fs::write(&img, b"\x89PNG").unwrap();
        let scorers = default_image_scorers();
        let names: Vec<_> = scorers.iter().map(|s| s.modality()).collect();
        assert_eq!(names, vec!["clip", "ocr"]);
        assert_eq!(meme_sentiment(&img, &scorers), 0.0);
    }

    #[test]
    fn test_mean_over_modalities() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.jpg");
        std::fs::write(&img, b"jpg").unwrap();
        let scorers: Vec<Box<dyn ImageSentimentScorer>> = vec![
            Box::new(Fixed(ImagePolarity { pos: 0.8, neg: 0.2 })),
            Box::new(Fixed(ImagePolarity { pos: 0.3, neg: 0.5 })),
        ];
        assert!((meme_sentiment(&img, &scorers) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_image_is_neutral() {
        let scorers: Vec<Box<dyn ImageSentimentScorer>> =
            vec![Box::new(Fixed(ImagePolarity { pos: 1.0, neg: 0.0 }))];
        assert_eq!(meme_sentiment(Path::new("/nonexistent/x.png"), &scorers), 0.0);
        assert_eq!(meme_sentiment(Path::new("/nonexistent/x.png"), &[]), 0.0);
    }
}
