//! Error types for Topicality.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Classifier invoked with no input texts")]
    EmptyClassifierInput,

    #[error("Failed to process {}: {message}", path.display())]
    File { path: PathBuf, message: String },

    #[error("{} of the input files failed: {}", failed.len(), FailureList(failed))]
    Batch { failed: Vec<FileFailure> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap any error as a failure attributed to one input file.
    pub fn for_file(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::File {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// One input file that could not be processed by a worker.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

struct FailureList<'a>(&'a [FileFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} ({})", failure.path.display(), failure.message)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
