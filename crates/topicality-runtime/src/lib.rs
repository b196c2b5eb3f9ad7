//! Topicality Runtime: runs the pipeline stages end to end.
//!
//! The NYT stage scores every archive file on a worker pool and aggregates
//! weekly. The meme stage builds weekly meme activity from the predictions
//! table. The panel stage joins both, balances the grid and writes the
//! analysis-ready outputs with coverage diagnostics.

pub mod driver;
pub mod io;
pub mod orchestrator;

pub use driver::{
    build_weekly, process_file, ClassifierFactory, DriverOptions, DriverStats, WeeklyReport,
    WorkerContext,
};
pub use orchestrator::{Pipeline, PipelineSummary};
