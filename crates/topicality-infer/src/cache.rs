//! LRU cache of per-sentence classifier outputs.
//!
//! News archives repeat boilerplate sentences (bylines, photo credits,
//! disclaimers) across many articles; caching saves re-running the model on
//! them. Default: 4096 entries.

use std::collections::HashMap;

use parking_lot::Mutex;
use topicality_core::{Error, Result};

use crate::classifier::{LabelScores, SentimentClassifier};

/// Thread-safe LRU cache keyed by sentence text.
pub struct ScoreCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    entries: HashMap<String, LabelScores>,
    order: Vec<String>,
    max_size: usize,
}

impl ScoreCache {
    /// Create a new cache with the given capacity.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                order: Vec::with_capacity(max_size),
                max_size,
            }),
        }
    }

    pub fn default_cache() -> Self {
        Self::new(4096)
    }

    /// Get cached scores, marking the entry most recently used.
    pub fn get(&self, text: &str) -> Option<LabelScores> {
        let mut inner = self.inner.lock();
        let scores = inner.entries.get(text)?.clone();
        if let Some(pos) = inner.order.iter().position(|k| k == text) {
            let key = inner.order.remove(pos);
            inner.order.push(key);
        }
        Some(scores)
    }

    pub fn put(&self, text: String, scores: LabelScores) {
        let mut inner = self.inner.lock();
        if inner.max_size == 0 {
            return;
        }

        if inner.entries.contains_key(&text) {
            inner.order.retain(|k| k != &text);
            inner.order.push(text.clone());
            inner.entries.insert(text, scores);
            return;
        }

        // Evict least recently used
        while inner.entries.len() >= inner.max_size && !inner.order.is_empty() {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
        }

        inner.order.push(text.clone());
        inner.entries.insert(text, scores);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a classifier so repeated texts are served from a `ScoreCache`.
///
/// Misses are sent to the inner classifier as one batch, preserving order.
pub struct CachedClassifier<C> {
    inner: C,
    cache: ScoreCache,
}

impl<C: SentimentClassifier> CachedClassifier<C> {
    pub fn new(inner: C, cache: ScoreCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }
}

impl<C: SentimentClassifier> SentimentClassifier for CachedClassifier<C> {
    fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
        if texts.is_empty() {
            return Err(Error::EmptyClassifierInput);
        }

        let mut out: Vec<Option<LabelScores>> = texts.iter().map(|t| self.cache.get(t)).collect();
        let misses: Vec<usize> = (0..texts.len()).filter(|&i| out[i].is_none()).collect();

        if !misses.is_empty() {
            let batch: Vec<&str> = misses.iter().map(|&i| texts[i]).collect();
            let scored = self.inner.classify(&batch)?;
            if scored.len() != batch.len() {
                return Err(Error::Classifier(format!(
                    "{} returned {} results for {} texts",
                    self.inner.name(),
                    scored.len(),
                    batch.len()
                )));
            }
            for (&i, scores) in misses.iter().zip(scored) {
                self.cache.put(texts[i].to_string(), scores.clone());
                out[i] = Some(scores);
            }
        }

        out.into_iter()
            .map(|s| s.ok_or_else(|| Error::Internal("cache slot left empty".into())))
            .collect()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SentimentLabel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scores(p: f64) -> LabelScores {
        LabelScores::from([(SentimentLabel::Positive, p)])
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = ScoreCache::new(10);
        assert!(cache.get("hello").is_none());

        cache.put("hello".into(), scores(0.5));
        assert_eq!(cache.get("hello"), Some(scores(0.5)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = ScoreCache::new(2);
        cache.put("a".into(), scores(0.1));
        cache.put("b".into(), scores(0.2));
        // Touch "a" so "b" is the oldest
        assert!(cache.get("a").is_some());

        cache.put("c".into(), scores(0.3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    struct Counting {
        calls: AtomicUsize,
        texts: AtomicUsize,
    }

    impl SentimentClassifier for Counting {
        fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| scores(t.len() as f64)).collect())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_cached_classifier_batches_misses() {
        let c = CachedClassifier::new(
            Counting {
                calls: AtomicUsize::new(0),
                texts: AtomicUsize::new(0),
            },
            ScoreCache::new(16),
        );

        let first = c.classify(&["a", "bb"]).unwrap();
        assert_eq!(first, vec![scores(1.0), scores(2.0)]);

        let second = c.classify(&["bb", "ccc", "a"]).unwrap();
        assert_eq!(second, vec![scores(2.0), scores(3.0), scores(1.0)]);

        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(c.inner.texts.load(Ordering::SeqCst), 3);
        assert_eq!(c.cache().len(), 3);

        // Fully cached batch never reaches the backend
        c.classify(&["ccc"]).unwrap();
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 2);
    }
}
