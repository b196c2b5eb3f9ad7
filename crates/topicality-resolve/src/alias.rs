//! Company alias definitions and whole-phrase matchers.
//!
//! The alias file is line oriented and uses a small search-query dialect:
//!
//! ```text
//! # comments and blank lines are ignored
//! (Tesla OR TSLA) AND stock NOT "Tesla Coil"
//! "Coca-Cola" OR Coke
//! ```
//!
//! A line that opens with a parenthesized group uses only that group. Only
//! the leading OR-alternation is honored. The first phrase names the
//! company; every phrase becomes one matcher for that company.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use topicality_core::{CompanyKey, Error, Result};
use tracing::{info, warn};

static BOOLEAN_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(?:AND|NOT)\s+").unwrap());
static OR_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+OR\s+").unwrap());

const QUOTES: &[char] = &['"', '\u{201C}', '\u{201D}'];

/// One parsed alias line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasExpr {
    /// Literal phrases, in file order. Never empty.
    pub phrases: Vec<String>,
    /// Boolean refinement after the first AND/NOT, which is not applied.
    pub ignored_tail: Option<String>,
}

impl AliasExpr {
    /// Company key named by the first phrase.
    pub fn company(&self) -> CompanyKey {
        CompanyKey::normalize(&self.phrases[0])
    }
}

/// Parse one alias line. Returns `None` for comments, blank lines and lines
/// without any usable phrase.
pub fn parse_alias_line(line: &str) -> Option<AliasExpr> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let group = leading_group(line).unwrap_or(line);

    let (head, ignored_tail) = match BOOLEAN_TAIL.find(group) {
        Some(m) => (&group[..m.start()], Some(group[m.start()..].trim().to_string())),
        None => (group, None),
    };
    // A parenthesized group drops whatever follows it.
    let ignored_tail = match (group.len() < line.len(), ignored_tail) {
        (true, None) => after_group(line).map(str::to_string),
        (_, tail) => tail,
    };

    let phrases: Vec<String> = OR_SPLIT
        .split(head)
        .map(|p| p.trim().trim_matches(QUOTES).trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if phrases.is_empty() {
        return None;
    }
    Some(AliasExpr {
        phrases,
        ignored_tail,
    })
}

/// Content of a leading `( … )` group. A group elsewhere on the line is
/// part of a phrase, as in `"Meta (FB)"`.
fn leading_group(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('(')?;
    let close = rest.find(')')?;
    Some(&rest[..close])
}

fn after_group(line: &str) -> Option<&str> {
    let close = line.find(')')?;
    let rest = line[close + 1..].trim();
    (!rest.is_empty()).then_some(rest)
}

/// A compiled whole-phrase, case-insensitive matcher.
#[derive(Debug, Clone)]
pub struct AliasPattern {
    pub phrase: String,
    regex: Regex,
}

impl AliasPattern {
    /// Compile a literal phrase.
    ///
    /// Internal whitespace matches any whitespace run. The phrase must not
    /// touch an ASCII letter or digit on either side.
    pub fn compile(phrase: &str) -> Result<Self> {
        let body = phrase
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        if body.is_empty() {
            return Err(Error::Parse("empty alias phrase".into()));
        }
        let pattern = format!(r"(?i)(?:^|[^A-Za-z0-9]){}(?:$|[^A-Za-z0-9])", body);
        let regex = Regex::new(&pattern)
            .map_err(|e| Error::Parse(format!("alias {:?}: {}", phrase, e)))?;
        Ok(Self {
            phrase: phrase.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Company key → ordered alias matchers. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct AliasPatternSet {
    entries: HashMap<CompanyKey, Vec<AliasPattern>>,
}

impl AliasPatternSet {
    /// Load an alias file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Alias file {} not found; matching companies by key substring only",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::for_file(path, e)),
        };
        let set = Self::parse(&text).map_err(|e| Error::for_file(path, e))?;
        info!("Loaded aliases for {} companies from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse alias definitions from text. Later lines for the same company
    /// replace earlier ones.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let Some(expr) = parse_alias_line(line) else {
                continue;
            };
            let company = expr.company();
            if company.is_empty() {
                continue;
            }
            let patterns = expr
                .phrases
                .iter()
                .map(|p| AliasPattern::compile(p))
                .collect::<Result<Vec<_>>>()
                .map_err(|e| Error::Parse(format!("line {}: {}", lineno + 1, e)))?;
            entries.insert(company, patterns);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, company: &CompanyKey) -> Option<&[AliasPattern]> {
        self.entries.get(company).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
