//! Article segmentation for ProQuest-style archive dumps.
//!
//! A dump is a sequence of article blocks separated by a horizontal rule of
//! underscores. Each block carries semi-structured header lines
//! (`Title:`, `Full text:`, `Publication date:`, ...).

use chrono::NaiveDate;

use crate::date::parse_pub_date;

/// Horizontal rule between articles: 60 underscores.
pub const ARTICLE_SEPARATOR: &str =
    "____________________________________________________________";

const TITLE_MARKER: &str = "Title:";
const FULL_TEXT_MARKER: &str = "Full text:";
const PUB_DATE_MARKER: &str = "Publication date:";

/// Header labels that terminate an article body.
pub const META_HEADERS: &[&str] = &[
    "Subject:",
    "Location:",
    "People:",
    "Company / organization:",
    "URL:",
    "Title:",
    "Publication title:",
    "Pages:",
    "Publication year:",
    "Publication date:",
    "Section:",
    "Publisher:",
    "Place of publication:",
    "Country of publication:",
    "Publication subject:",
    "ISSN:",
    "Source type:",
    "Language of publication:",
    "Document type:",
    "ProQuest document ID:",
    "Document URL:",
    "Copyright:",
    "Last updated:",
    "Database:",
];

/// One article segmented out of a dump.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleBlock {
    pub title: String,
    pub body: String,
    /// `None` when missing, unparseable, or outside the accepted years.
    pub pub_date: Option<NaiveDate>,
}

impl ArticleBlock {
    /// Parse one raw block.
    pub fn parse(block: &str) -> Self {
        let lines = content_lines(block);
        let (title, body) = fields_from_lines(&lines);
        let pub_date = lines
            .iter()
            .find_map(|l| l.strip_prefix(PUB_DATE_MARKER))
            .and_then(|raw| parse_pub_date(raw.trim()));
        Self {
            title,
            body,
            pub_date,
        }
    }

    /// `"{title} {body}"`, trimmed. Empty when the block has no usable text.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }
}

/// Split a raw dump into trimmed, non-empty article blocks.
pub fn segment(raw_text: &str) -> Vec<String> {
    raw_text
        .split(ARTICLE_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract `(title, body)` from a block.
pub fn extract_fields(block: &str) -> (String, String) {
    fields_from_lines(&content_lines(block))
}

fn content_lines(block: &str) -> Vec<&str> {
    block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

fn fields_from_lines(lines: &[&str]) -> (String, String) {
    let title = match lines.iter().find_map(|l| l.strip_prefix(TITLE_MARKER)) {
        Some(t) => t.trim().to_string(),
        None => lines.first().map(|l| l.to_string()).unwrap_or_default(),
    };

    let Some(start) = lines.iter().position(|l| l.starts_with(FULL_TEXT_MARKER)) else {
        return (title, String::new());
    };

    let mut body_lines = Vec::new();
    for line in &lines[start..] {
        if let Some(rest) = line.strip_prefix(FULL_TEXT_MARKER) {
            body_lines.push(rest.trim());
            continue;
        }
        if is_meta_header(line) {
            break;
        }
        body_lines.push(line);
    }

    (title, body_lines.join(" ").trim().to_string())
}

fn is_meta_header(line: &str) -> bool {
    META_HEADERS.iter().any(|h| line.starts_with(h))
}
