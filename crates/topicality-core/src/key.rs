//! Canonical company keys.

use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NUMERIC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d+$").unwrap());

/// Normalized brand identifier: lowercase ASCII alphanumerics only.
///
/// `"Coca-Cola"`, `"coca cola"` and `"COCACOLA"` all map to `cocacola`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyKey(String);

impl CompanyKey {
    /// Normalize a display name into a key.
    pub fn normalize(name: &str) -> Self {
        Self(simple_key(name))
    }

    /// Derive the key encoded in an archive filename.
    ///
    /// The extension is dropped, then a trailing `-<digits>` disambiguation
    /// suffix, then the rest is normalized. Inner hyphens are kept until
    /// normalization, so `coca-cola-2.txt` becomes `cocacola`.
    pub fn from_filename(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::normalize(&NUMERIC_SUFFIX.replace(stem, ""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CompanyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CompanyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip everything except ASCII letters and digits, then lowercase.
pub fn simple_key(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
