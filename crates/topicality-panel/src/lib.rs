//! Topicality Panel: brand × week analysis panel.
//!
//! Builds weekly meme activity from an image predictions table, joins it with
//! the weekly NYT sentiment table, balances the result to a full company ×
//! week grid and adds log transforms, ISO calendar fields, lags and volume
//! normalizations. Coverage diagnostics report how much of the panel has the
//! NYT predictors and their lags available.

pub mod coverage;
pub mod meme;
pub mod normalize;
pub mod panel;
pub mod types;

pub use coverage::{
    company_coverage, coverage_overview, diagnose_panel, mention_week_share, missing_breakdown,
    sentiment_run_lengths, CompanyCoverage, CoverageLine, MentionShare, MissingCombination,
    MissingVariable, PanelDiagnostics, SentimentRun,
};
pub use meme::{
    build_memes_weekly, company_from_path, locate_predictions_table, observations_from_table,
    parse_timestamp, MemeSchema, ObservationStats, PredictionTable, ResolvedSchema,
};
pub use panel::{build_panel, join_weekly, Panel};
pub use types::*;
