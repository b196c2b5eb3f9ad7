//! Document-level sentiment: mean of per-sentence classifier scores.

use topicality_core::{Error, Result};

use crate::classifier::{SentimentClassifier, SentimentLabel, SentimentTriple};

/// Score a document from its selected sentences.
///
/// Each component is the arithmetic mean of that label's score over all
/// sentences; a label missing from a sentence's output counts as 0. An empty
/// sentence list is an error and the classifier is not called.
pub fn score(
    sentences: &[&str],
    classifier: &dyn SentimentClassifier,
) -> Result<SentimentTriple> {
    if sentences.is_empty() {
        return Err(Error::EmptyClassifierInput);
    }

    let outputs = classifier.classify(sentences)?;
    if outputs.len() != sentences.len() {
        return Err(Error::Classifier(format!(
            "{} returned {} results for {} sentences",
            classifier.name(),
            outputs.len(),
            sentences.len()
        )));
    }

    let mut sum = [0.0f64; 3];
    for scores in &outputs {
        for (i, label) in SentimentLabel::ALL.iter().enumerate() {
            sum[i] += scores.get(label).copied().unwrap_or(0.0);
        }
    }
    let n = outputs.len() as f64;
    Ok(SentimentTriple::new(sum[0] / n, sum[1] / n, sum[2] / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LabelScores;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Fixed(Vec<LabelScores>);

    impl SentimentClassifier for Fixed {
        fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
            Ok(self.0.iter().take(texts.len()).cloned().collect())
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn scores(p: f64, u: f64, n: f64) -> LabelScores {
        LabelScores::from([
            (SentimentLabel::Positive, p),
            (SentimentLabel::Neutral, u),
            (SentimentLabel::Negative, n),
        ])
    }

    #[test]
    fn test_mean_of_sentences() {
        let c = Fixed(vec![scores(0.9, 0.05, 0.05), scores(0.1, 0.1, 0.8)]);
        let t = score(&["Good.", "Bad."], &c).unwrap();
        assert!((t.positive - 0.5).abs() < 1e-12);
        assert!((t.neutral - 0.075).abs() < 1e-12);
        assert!((t.negative - 0.425).abs() < 1e-12);
    }

    #[test]
    fn test_missing_label_counts_as_zero() {
        let c = Fixed(vec![
            LabelScores::from([(SentimentLabel::Positive, 1.0)]),
            scores(0.0, 1.0, 0.0),
        ]);
        let t = score(&["a", "b"], &c).unwrap();
        assert_eq!(t, SentimentTriple::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_empty_input_never_reaches_classifier() {
        struct Recording(AtomicBool);
        impl SentimentClassifier for Recording {
            fn classify(&self, _: &[&str]) -> Result<Vec<LabelScores>> {
                self.0.store(true, Ordering::SeqCst);
                Ok(vec![])
            }
            fn name(&self) -> &str {
                "recording"
            }
        }
        let c = Recording(AtomicBool::new(false));
        let err = score(&[], &c).unwrap_err();
        assert!(matches!(err, Error::EmptyClassifierInput));
        assert!(!c.0.load(Ordering::SeqCst));
    }

    #[test]
    fn test_short_output_is_error() {
        let c = Fixed(vec![scores(1.0, 0.0, 0.0)]);
        assert!(matches!(
            score(&["a", "b"], &c),
            Err(Error::Classifier(_))
        ));
    }
}
