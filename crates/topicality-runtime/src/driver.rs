//! Parallel file driver: score every archive file on a dedicated worker pool
//! and aggregate the results into weekly company records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use topicality_aggregate::{aggregate_weekly, ArticleSentiment, WeeklyCompanyRecord};
use topicality_core::{Error, FileFailure, Result};
use topicality_infer::{score, SentimentClassifier};
use topicality_ingest::{preprocess_article_text, RawDocument};
use topicality_resolve::{select_relevant_sentences, AliasPatternSet, Selection};
use tracing::{debug, error, info};

/// Builds one classifier per worker thread.
pub type ClassifierFactory = dyn Fn() -> Result<Box<dyn SentimentClassifier>> + Send + Sync;

/// Per-worker scoring state, built lazily on the worker's first file.
pub struct WorkerContext {
    classifier: Box<dyn SentimentClassifier>,
    aliases: Arc<AliasPatternSet>,
    max_sentences: usize,
}

impl WorkerContext {
    pub fn new(
        classifier: Box<dyn SentimentClassifier>,
        aliases: Arc<AliasPatternSet>,
        max_sentences: usize,
    ) -> Self {
        Self {
            classifier,
            aliases,
            max_sentences,
        }
    }
}

/// Driver tunables.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub workers: usize,
    pub min_date: NaiveDate,
    pub max_sentences: usize,
}

/// Counters over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub files: usize,
    pub blocks: usize,
    pub skipped_empty: usize,
    pub skipped_bad_date: usize,
    pub scored: usize,
    /// Articles scored from their leading sentences because nothing matched.
    pub fallback_scored: usize,
}

impl DriverStats {
    fn merge(&mut self, other: &DriverStats) {
        self.files += other.files;
        self.blocks += other.blocks;
        self.skipped_empty += other.skipped_empty;
        self.skipped_bad_date += other.skipped_bad_date;
        self.scored += other.scored;
        self.fallback_scored += other.fallback_scored;
    }
}

/// Result of the NYT stage.
#[derive(Debug, Clone, Default)]
pub struct WeeklyReport {
    pub records: Vec<WeeklyCompanyRecord>,
    /// Every scored article, before the date filter and weekly grouping.
    pub articles: Vec<ArticleSentiment>,
    pub stats: DriverStats,
}

/// Score every article in one file.
pub fn process_file(path: &Path, ctx: &WorkerContext) -> Result<(Vec<ArticleSentiment>, DriverStats)> {
    let doc = RawDocument::read(path)?;
    let mut stats = DriverStats {
        files: 1,
        ..Default::default()
    };
    let mut rows = Vec::new();

    for (i, block) in doc.articles().enumerate() {
        stats.blocks += 1;
        let text = block.text();
        if text.is_empty() {
            debug!("{} block {}: no title or body", path.display(), i);
            stats.skipped_empty += 1;
            continue;
        }
        let Some(date) = block.pub_date else {
            debug!("{} block {}: missing or rejected publication date", path.display(), i);
            stats.skipped_bad_date += 1;
            continue;
        };

        let text = preprocess_article_text(&text);
        let selected =
            select_relevant_sentences(&text, &doc.company, &ctx.aliases, ctx.max_sentences);
        if selected.sentences.is_empty() {
            stats.skipped_empty += 1;
            continue;
        }

        let sentiment = score(&selected.sentences, ctx.classifier.as_ref())
            .map_err(|e| Error::for_file(path, format!("block {}: {}", i, e)))?;
        stats.scored += 1;
        if selected.selection == Selection::Fallback {
            stats.fallback_scored += 1;
        }
        rows.push(ArticleSentiment {
            company: doc.company.clone(),
            date,
            sentiment,
        });
    }

    debug!(
        "{}: {} articles scored for {}",
        path.display(),
        stats.scored,
        doc.company
    );
    Ok((rows, stats))
}

/// Score all files on `options.workers` threads and aggregate weekly.
///
/// Each pool thread builds its `WorkerContext` once, on its first file, and
/// reuses it afterwards. If any file fails, the whole stage fails with an
/// error listing every failed file.
pub fn build_weekly(
    paths: &[PathBuf],
    aliases: Arc<AliasPatternSet>,
    factory: &ClassifierFactory,
    options: &DriverOptions,
) -> Result<WeeklyReport> {
    let workers = options.workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("topicality-worker-{}", i))
        .build()
        .map_err(|e| Error::Internal(format!("Failed to build worker pool: {}", e)))?;

    info!("Scoring {} files on {} workers", paths.len(), workers);

    let slots: Vec<Mutex<Option<WorkerContext>>> = (0..workers).map(|_| Mutex::new(None)).collect();

    let outcomes: Vec<(PathBuf, Result<(Vec<ArticleSentiment>, DriverStats)>)> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let slot = rayon::current_thread_index().unwrap_or(0) % workers;
                let mut guard = slots[slot].lock();
                let result = match guard.as_mut() {
                    Some(ctx) => process_file(path, ctx),
                    None => match factory() {
                        Ok(classifier) => {
                            debug!("Worker {} using {} classifier", slot, classifier.name());
                            let ctx = guard.insert(WorkerContext::new(
                                classifier,
                                Arc::clone(&aliases),
                                options.max_sentences,
                            ));
                            process_file(path, ctx)
                        }
                        Err(e) => Err(e),
                    },
                };
                (path.clone(), result)
            })
            .collect()
    });

    let mut report = WeeklyReport::default();
    let mut failed = Vec::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok((rows, stats)) => {
                report.articles.extend(rows);
                report.stats.merge(&stats);
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                let message = match e {
                    Error::File { message, .. } => message,
                    other => other.to_string(),
                };
                failed.push(FileFailure { path, message });
            }
        }
    }
    if !failed.is_empty() {
        return Err(Error::Batch { failed });
    }

    report.records = aggregate_weekly(&report.articles, options.min_date);
    let s = &report.stats;
    info!(
        "NYT stage: {} files, {} blocks, {} scored ({} via fallback), {} skipped empty, {} skipped date, {} weekly records",
        s.files,
        s.blocks,
        s.scored,
        s.fallback_scored,
        s.skipped_empty,
        s.skipped_bad_date,
        report.records.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use topicality_core::CompanyKey;
    use topicality_infer::{LabelScores, SentimentLabel};
    use topicality_ingest::ARTICLE_SEPARATOR;

    struct Constant;

    impl SentimentClassifier for Constant {
        fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
            Ok(texts
                .iter()
                .map(|_| {
                    LabelScores::from([
                        (SentimentLabel::Positive, 0.6),
                        (SentimentLabel::Neutral, 0.3),
                        (SentimentLabel::Negative, 0.1),
                    ])
                })
                .collect())
        }
        fn name(&self) -> &str {
            "constant"
        }
    }

    struct Failing;

    impl SentimentClassifier for Failing {
        fn classify(&self, _: &[&str]) -> Result<Vec<LabelScores>> {
            Err(Error::Classifier("model crashed".into()))
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    fn options(workers: usize) -> DriverOptions {
        DriverOptions {
            workers,
            min_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            max_sentences: 200,
        }
    }

    fn write_archive(dir: &Path, name: &str, n: usize) -> PathBuf {
        let block = "Title: Acme wins\nFull text: Acme posted gains.\nPublication date: Mar 14, 2023";
        let sep = format!("\n{}\n", ARTICLE_SEPARATOR);
        let text = vec![block; n].join(sep.as_str());
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_process_file_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globex.txt");
        let text = format!(
            "Title: Quiet week\nFull text: Nothing happened.\nPublication date: Mar 14, 2023\n{sep}\n\
             Title: Old news\nFull text: Globex grew.\nPublication date: May 1, 2022\n{sep}\n\
             Title:\nFull text:\nPublication date: Mar 15, 2023\n",
            sep = ARTICLE_SEPARATOR
        );
        std::fs::write(&path, text).unwrap();

        let ctx = WorkerContext::new(Box::new(Constant), Arc::new(AliasPatternSet::default()), 200);
        let (rows, stats) = process_file(&path, &ctx).unwrap();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.scored, 1);
        assert_eq!(stats.fallback_scored, 1);
        assert_eq!(stats.skipped_bad_date, 1);
        assert_eq!(stats.skipped_empty, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, CompanyKey::normalize("globex"));
    }

    #[test]
    fn test_contexts_built_once_per_worker() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..12)
            .map(|i| write_archive(dir.path(), &format!("acme-{}.txt", i), 2))
            .collect();

        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let factory = move || -> Result<Box<dyn SentimentClassifier>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Constant))
        };

        let report =
            build_weekly(&paths, Arc::new(AliasPatternSet::default()), &factory, &options(3)).unwrap();
        assert!(built.load(Ordering::SeqCst) <= 3);
        assert_eq!(report.stats.files, 12);
        assert_eq!(report.stats.scored, 24);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].nyt_mention, 24);
    }

    #[test]
    fn test_failures_name_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_archive(dir.path(), "acme.txt", 1),
            write_archive(dir.path(), "globex.txt", 1),
        ];
        let factory = || -> Result<Box<dyn SentimentClassifier>> { Ok(Box::new(Failing)) };

        let err = build_weekly(&paths, Arc::new(AliasPatternSet::default()), &factory, &options(2))
            .unwrap_err();
        match err {
            Error::Batch { failed } => {
                assert_eq!(failed.len(), 2);
                assert!(failed.iter().all(|f| f.message.contains("model crashed")));
            }
            other => panic!("expected batch error, got {other}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let factory = || -> Result<Box<dyn SentimentClassifier>> { Ok(Box::new(Constant)) };
        let report =
            build_weekly(&[], Arc::new(AliasPatternSet::default()), &factory, &options(2)).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.stats, DriverStats::default());
    }
}
