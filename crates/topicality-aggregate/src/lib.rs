//! Topicality Aggregate: per-company rollups of scored articles.
//!
//! Groups dated article sentiment into weekly company records (the NYT side
//! of the panel) and whole-period company summaries.

pub mod summary;
pub mod types;
pub mod weekly;

pub use summary::{summarize_by_company, summarize_company};
pub use types::*;
pub use weekly::aggregate_weekly;
