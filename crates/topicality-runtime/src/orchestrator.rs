//! Pipeline: runs the NYT, meme and panel stages over one data directory.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use topicality_core::{PanelConfig, Result};
use topicality_infer::{create_classifier, default_image_scorers, ImageSentimentScorer, SentimentClassifier};
use topicality_ingest::list_archive_files;
use topicality_panel::{
    build_memes_weekly, build_panel, diagnose_panel, locate_predictions_table,
    observations_from_table, CoverageLine, MemeSchema, MemeWeeklyRecord, Panel, PanelDiagnostics,
};
use topicality_resolve::AliasPatternSet;
use tracing::{debug, info, warn};

use crate::driver::{build_weekly, ClassifierFactory, DriverOptions, DriverStats, WeeklyReport};
use crate::io;

/// Counts from a full `build` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub nyt: DriverStats,
    pub nyt_weekly_records: usize,
    pub meme_weekly_records: usize,
    pub panel_rows: usize,
    pub companies: usize,
    pub duration_ms: u64,
}

/// Top-level pipeline over one data directory.
pub struct Pipeline {
    config: PanelConfig,
    factory: Arc<ClassifierFactory>,
    image_scorers: Vec<Box<dyn ImageSentimentScorer>>,
    schema: MemeSchema,
}

impl Pipeline {
    /// Create a pipeline with the default classifier and image scorers.
    pub fn new(config: PanelConfig) -> Self {
        let model_dir = config.data_paths.model_dir.clone();
        let factory: Arc<ClassifierFactory> =
            Arc::new(move || -> Result<Box<dyn SentimentClassifier>> {
                Ok(create_classifier(&model_dir))
            });
        info!(
            "Pipeline initialized: data_dir={}, workers={}, min_date={}, max_sentences={}",
            config.data_paths.root.display(),
            config.workers,
            config.min_date,
            config.max_sentences
        );
        Self {
            config,
            factory,
            image_scorers: default_image_scorers(),
            schema: MemeSchema::default(),
        }
    }

    /// Replace the per-worker classifier factory.
    pub fn with_classifier_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn SentimentClassifier>> + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// Replace the scorers used for meme image sentiment.
    pub fn with_image_scorers(mut self, scorers: Vec<Box<dyn ImageSentimentScorer>>) -> Self {
        self.image_scorers = scorers;
        self
    }

    /// Replace the predictions table column candidates.
    pub fn with_schema(mut self, schema: MemeSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// NYT stage: score every archive and write the weekly sentiment table.
    pub fn run_nyt(&self) -> Result<WeeklyReport> {
        let paths = &self.config.data_paths;
        let files = list_archive_files(&paths.nyt_dir)?;
        info!("Found {} archive files in {}", files.len(), paths.nyt_dir.display());

        let aliases = Arc::new(AliasPatternSet::load(&paths.synonyms_file)?);
        let options = DriverOptions {
            workers: self.config.workers,
            min_date: self.config.min_date,
            max_sentences: self.config.max_sentences,
        };
        let report = build_weekly(&files, aliases, self.factory.as_ref(), &options)?;

        for company in topicality_aggregate::summarize_by_company(&report.articles) {
            debug!(
                "{}: {} articles {}..{}, sentiment {:.3}",
                company.company,
                company.summary.n_docs,
                company.first_date,
                company.last_date,
                company.summary.sentiment_score
            );
        }

        io::write_nyt_weekly(&paths.nyt_weekly_csv, &report.records)?;
        Ok(report)
    }

    /// Meme stage: read the predictions table and write weekly meme activity.
    ///
    /// A missing predictions table yields an empty weekly table.
    pub fn run_memes(&self) -> Result<Vec<MemeWeeklyRecord>> {
        let paths = &self.config.data_paths;
        let records = match locate_predictions_table(&paths.prediction_images) {
            Some(table_path) => {
                let table = io::read_prediction_table(&table_path)?;
                let resolved = self.schema.resolve(&table.headers)?;
                let (observations, stats) = observations_from_table(
                    &table,
                    &resolved,
                    &paths.prediction_images,
                    &self.image_scorers,
                );
                info!(
                    "Meme stage: {} rows in {}, {} bad timestamps, {} without company",
                    stats.rows,
                    table_path.display(),
                    stats.bad_timestamp,
                    stats.no_company
                );
                build_memes_weekly(&observations, resolved.engagement.is_some())
            }
            None => {
                warn!(
                    "No predictions table in {}; meme activity will be empty",
                    paths.prediction_images.display()
                );
                Vec::new()
            }
        };

        io::write_memes_weekly(&paths.memes_weekly_csv, &records)?;
        Ok(records)
    }

    /// Panel stage from the weekly tables already on disk.
    pub fn run_panel(&self) -> Result<Panel> {
        let paths = &self.config.data_paths;
        let nyt = io::read_nyt_weekly(&paths.nyt_weekly_csv)?;
        let memes = io::read_memes_weekly(&paths.memes_weekly_csv)?;
        self.assemble_panel(&nyt, &memes)
    }

    /// Build, write and report on the panel.
    pub fn assemble_panel(
        &self,
        nyt: &[topicality_aggregate::WeeklyCompanyRecord],
        memes: &[MemeWeeklyRecord],
    ) -> Result<Panel> {
        let paths = &self.config.data_paths;
        let panel = build_panel(nyt, memes);

        io::write_enriched_panel(&paths.enriched_panel_csv, &panel.enriched)?;
        io::write_analysis_panel(&paths.analysis_panel_csv, &panel.rows)?;

        let diagnostics = diagnose_panel(&panel.rows);
        log_coverage(&diagnostics.overview);
        io::write_diagnostics(paths, &diagnostics)?;
        Ok(panel)
    }

    /// Run all three stages in sequence.
    pub fn run_all(&self) -> Result<PipelineSummary> {
        let start = Instant::now();
        let nyt = self.run_nyt()?;
        let memes = self.run_memes()?;
        let panel = self.assemble_panel(&nyt.records, &memes)?;

        let summary = PipelineSummary {
            nyt: nyt.stats,
            nyt_weekly_records: nyt.records.len(),
            meme_weekly_records: memes.len(),
            panel_rows: panel.rows.len(),
            companies: panel.companies(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Pipeline complete: {} panel rows over {} companies in {}ms",
            summary.panel_rows, summary.companies, summary.duration_ms
        );
        Ok(summary)
    }

    /// Coverage diagnostics rebuilt from the weekly tables. Rewrites the
    /// coverage reports but leaves the panel tables alone.
    pub fn diagnose(&self) -> Result<PanelDiagnostics> {
        let paths = &self.config.data_paths;
        let nyt = io::read_nyt_weekly(&paths.nyt_weekly_csv)?;
        let memes = io::read_memes_weekly(&paths.memes_weekly_csv)?;
        let diagnostics = diagnose_panel(&build_panel(&nyt, &memes).rows);
        io::write_diagnostics(paths, &diagnostics)?;
        Ok(diagnostics)
    }
}

fn log_coverage(lines: &[CoverageLine]) {
    for line in lines {
        info!(
            "Coverage {}: {} rows ({:.1}%)",
            line.requirement,
            line.rows_ok,
            line.share_ok * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topicality_infer::{ImagePolarity, LabelScores, SentimentLabel};

    struct Positive;

    impl SentimentClassifier for Positive {
        fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
            Ok(texts
                .iter()
                .map(|_| {
                    LabelScores::from([
                        (SentimentLabel::Positive, 0.8),
                        (SentimentLabel::Neutral, 0.1),
                        (SentimentLabel::Negative, 0.1),
                    ])
                })
                .collect())
        }
        fn name(&self) -> &str {
            "positive"
        }
    }

    fn pipeline(dir: &std::path::Path) -> Pipeline {
        let mut config = PanelConfig::from_env(dir).unwrap();
        config.workers = 2;
        Pipeline::new(config)
            .with_classifier_factory(|| -> Result<Box<dyn SentimentClassifier>> { Ok(Box::new(Positive)) })
    }

    #[test]
    fn test_run_memes_without_table() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let records = p.run_memes().unwrap();
        assert!(records.is_empty());
        let text = std::fs::read_to_string(&p.config().data_paths.memes_weekly_csv).unwrap();
        assert_eq!(
            text.trim(),
            "company,week_start,num_memes,mean_meme_sentiment,meme_engagement,meme_spike"
        );
    }

    #[test]
    fn test_run_memes_from_table() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let images = &p.config().data_paths.prediction_images;
        std::fs::create_dir_all(images).unwrap();
        std::fs::write(
            images.join("predictions_metadata.csv"),
            "created_utc,saved_path,score\n\
             1678665600,prediction_images/Acme/a.jpg,10\n\
             1678752000,prediction_images/Acme/b.jpg,20\n\
             not-a-time,prediction_images/Acme/c.jpg,5\n",
        )
        .unwrap();

        let records = p.run_memes().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company.as_str(), "acme");
        assert_eq!(records[0].num_memes, 2);
        assert_eq!(records[0].meme_engagement, Some(15.0));
        assert_eq!(records[0].mean_meme_sentiment, 0.0);
    }

    struct Upbeat;

    impl ImageSentimentScorer for Upbeat {
        fn modality(&self) -> &str {
            "upbeat"
        }
        fn score(&self, _path: &std::path::Path) -> ImagePolarity {
            ImagePolarity { pos: 0.75, neg: 0.25 }
        }
    }

    #[test]
    fn test_run_memes_with_custom_schema_and_scorer() {
        let dir = tempfile::tempdir().unwrap();
        let schema = MemeSchema {
            timestamp: vec!["posted".into()],
            ..MemeSchema::default()
        };
        let p = pipeline(dir.path())
            .with_schema(schema)
            .with_image_scorers(vec![Box::new(Upbeat)]);
        let images = &p.config().data_paths.prediction_images;
        std::fs::create_dir_all(images.join("Acme")).unwrap();
        std::fs::write(images.join("Acme").join("a.jpg"), b"jpg").unwrap();
        std::fs::write(images.join("Acme").join("b.jpg"), b"jpg").unwrap();
        std::fs::write(
            images.join("predictions_metadata.csv"),
            "posted,saved_path\n\
             1678665600,Acme/a.jpg\n\
             1678752000,Acme/b.jpg\n",
        )
        .unwrap();

        let records = p.run_memes().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].num_memes, 2);
        assert_eq!(records[0].mean_meme_sentiment, 0.5);
        assert_eq!(records[0].meme_engagement, None);
    }

    #[test]
    fn test_default_schema_rejects_custom_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let images = &p.config().data_paths.prediction_images;
        std::fs::create_dir_all(images).unwrap();
        std::fs::write(
            images.join("predictions_metadata.csv"),
            "posted,saved_path\n1678665600,Acme/a.jpg\n",
        )
        .unwrap();
        assert!(p.run_memes().is_err());
    }

    #[test]
    fn test_assemble_panel_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let memes = vec![MemeWeeklyRecord {
            company: topicality_core::CompanyKey::normalize("Acme"),
            week_start: chrono::NaiveDate::from_ymd_opt(2023, 3, 13).unwrap(),
            num_memes: 2,
            mean_meme_sentiment: 0.0,
            meme_engagement: None,
            meme_spike: 0,
        }];
        let panel = p.assemble_panel(&[], &memes).unwrap();
        assert_eq!(panel.rows.len(), 1);

        let paths = &p.config().data_paths;
        let overview = std::fs::read_to_string(&paths.overview_csv).unwrap();
        assert_eq!(overview.lines().count(), 1 + topicality_core::LAG_DEPTH + 1);
        assert!(overview.lines().nth(1).unwrap().starts_with("current_only,0,0.0,"));
        let shares = std::fs::read_to_string(&paths.mention_share_csv).unwrap();
        assert_eq!(shares.lines().nth(1), Some("acme,0.0"));
    }

    #[test]
    fn test_run_memes_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        let images = &p.config().data_paths.prediction_images;
        std::fs::create_dir_all(images).unwrap();
        std::fs::write(images.join("predictions_metadata.csv"), "foo,bar\n1,2\n").unwrap();
        assert!(p.run_memes().is_err());
    }

    #[test]
    fn test_run_nyt_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path());
        assert!(p.run_nyt().is_err());
    }
}
