//! Archive file discovery and loading.

use std::path::{Path, PathBuf};

use topicality_core::{CompanyKey, Error, Result};

use crate::segment::{segment, ArticleBlock};

/// Extension of raw archive dumps.
pub const ARCHIVE_EXTENSION: &str = "txt";

/// One archive file: every article in it belongs to one company.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    pub company: CompanyKey,
    pub text: String,
}

impl RawDocument {
    /// Read a UTF-8 archive file. The company key comes from the filename.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::for_file(path, e))?;
        Ok(Self::from_text(path, text))
    }

    /// Build a document from text already in memory.
    pub fn from_text(path: impl Into<PathBuf>, text: String) -> Self {
        let path = path.into();
        let company = CompanyKey::from_filename(&path);
        Self {
            path,
            company,
            text,
        }
    }

    /// Segment the dump and parse every block.
    pub fn articles(&self) -> impl Iterator<Item = ArticleBlock> + '_ {
        segment(&self.text).into_iter().map(|b| ArticleBlock::parse(&b))
    }
}

/// List archive files (`*.txt`) in a directory, sorted by path.
pub fn list_archive_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_archive = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if path.is_file() && is_archive {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
