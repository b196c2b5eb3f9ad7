//! Configuration and data directory management.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::capabilities::HostCapabilities;
use crate::error::{Error, Result};

/// Calendar years an article may be published in to count at all.
pub const ACCEPTED_YEARS: [i32; 2] = [2023, 2024];

/// Default cap on sentences routed to the classifier per article.
pub const DEFAULT_MAX_SENTENCES: usize = 200;

/// Number of lag columns built per source column.
pub const LAG_DEPTH: usize = 4;

/// Paths to all Topicality inputs and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Raw NYT archive dumps, one `.txt` per company (`data/nyt/`).
    pub nyt_dir: PathBuf,
    /// Meme images and prediction metadata (`data/prediction_images/`).
    pub prediction_images: PathBuf,
    /// Derived tables (`data/derived/`).
    pub derived: PathBuf,
    /// Company alias definitions (`data/company_synonyms.txt`).
    pub synonyms_file: PathBuf,
    /// Sentiment classifier model files (`data/models/finbert/`).
    pub model_dir: PathBuf,
    /// Weekly NYT sentiment (`derived/nyt_weekly_sentiment.csv`).
    pub nyt_weekly_csv: PathBuf,
    /// Weekly meme activity (`derived/memes_weekly_activity.csv`).
    pub memes_weekly_csv: PathBuf,
    /// Joined but unbalanced panel (`derived/company_weekly_panel_enriched.csv`).
    pub enriched_panel_csv: PathBuf,
    /// Balanced panel with transforms and lags.
    pub analysis_panel_csv: PathBuf,
    /// Per-company coverage report (`derived/panel_coverage_by_company.csv`).
    pub coverage_csv: PathBuf,
    /// Rows meeting each lag requirement (`derived/sparsity_overview.csv`).
    pub overview_csv: PathBuf,
    /// Sentiment run lengths per company.
    pub sentiment_runs_csv: PathBuf,
    /// Missing variables among rows failing the full-lag requirement.
    pub missing_variables_csv: PathBuf,
    /// Missing variable combinations among the same rows.
    pub missing_combinations_csv: PathBuf,
    /// Share of weeks with a mention per company.
    pub mention_share_csv: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates `derived/` if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let derived = root.join("derived");
        let paths = Self {
            nyt_dir: root.join("nyt"),
            prediction_images: root.join("prediction_images"),
            synonyms_file: root.join("company_synonyms.txt"),
            model_dir: root.join("models").join("finbert"),
            nyt_weekly_csv: derived.join("nyt_weekly_sentiment.csv"),
            memes_weekly_csv: derived.join("memes_weekly_activity.csv"),
            enriched_panel_csv: derived.join("company_weekly_panel_enriched.csv"),
            analysis_panel_csv: derived.join("company_weekly_panel_analysis_ready.csv"),
            coverage_csv: derived.join("panel_coverage_by_company.csv"),
            overview_csv: derived.join("sparsity_overview.csv"),
            sentiment_runs_csv: derived.join("sparsity_sentiment_run_lengths.csv"),
            missing_variables_csv: derived.join("sparsity_missing_variables.csv"),
            missing_combinations_csv: derived.join("sparsity_missing_combinations_top.csv"),
            mention_share_csv: derived.join("nyt_mention_week_share_by_brand.csv"),
            derived,
            root,
        };
        std::fs::create_dir_all(&paths.derived)?;
        Ok(paths)
    }
}

/// Tunables for the attribution pipeline and panel assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub data_paths: DataPaths,
    /// Parallel scoring workers.
    pub workers: usize,
    /// Articles published before this date are excluded from weekly aggregates.
    pub min_date: NaiveDate,
    /// Maximum sentences classified per article.
    pub max_sentences: usize,
}

impl PanelConfig {
    /// Create configuration from environment and defaults.
    ///
    /// Reads `TOPICALITY_WORKERS`, `TOPICALITY_MIN_DATE` (YYYY-MM-DD) and
    /// `TOPICALITY_MAX_SENTENCES`. Malformed values are an error rather than
    /// being silently replaced by the default.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;

        let workers = match std::env::var("TOPICALITY_WORKERS") {
            Ok(v) => parse_positive("TOPICALITY_WORKERS", &v)?,
            Err(_) => HostCapabilities::discover().default_workers(),
        };

        let min_date = match std::env::var("TOPICALITY_MIN_DATE") {
            Ok(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|e| {
                Error::Config(format!("TOPICALITY_MIN_DATE={:?}: {}", v, e))
            })?,
            Err(_) => default_min_date(),
        };

        let max_sentences = match std::env::var("TOPICALITY_MAX_SENTENCES") {
            Ok(v) => parse_positive("TOPICALITY_MAX_SENTENCES", &v)?,
            Err(_) => DEFAULT_MAX_SENTENCES,
        };

        Ok(Self {
            data_paths,
            workers,
            min_date,
            max_sentences,
        })
    }
}

/// First day articles are counted from.
pub fn default_min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn parse_positive(name: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "{} must be a positive integer, got {:?}",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.derived.is_dir());
        assert_eq!(paths.nyt_dir, dir.path().join("nyt"));
        assert_eq!(
            paths.nyt_weekly_csv,
            dir.path().join("derived").join("nyt_weekly_sentiment.csv")
        );
        assert_eq!(
            paths.overview_csv,
            dir.path().join("derived").join("sparsity_overview.csv")
        );
        assert_eq!(paths.mention_share_csv.parent(), Some(paths.derived.as_path()));
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("X", " 4 ").unwrap(), 4);
        assert!(parse_positive("X", "0").is_err());
        assert!(parse_positive("X", "four").is_err());
    }

    #[test]
    fn test_default_min_date() {
        assert_eq!(default_min_date(), NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }
}
