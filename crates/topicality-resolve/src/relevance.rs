//! Sentence-level relevance filtering: route only the sentences that talk
//! about a company to the classifier.

use serde::Serialize;
use topicality_core::{simple_key, CompanyKey};
use topicality_ingest::split_sentences;

use crate::alias::AliasPatternSet;

/// How the returned sentences were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Sentences matched one of the company's alias patterns.
    Alias,
    /// No alias entry; sentences contain the company key after normalization.
    KeySubstring,
    /// Nothing matched; the leading sentences of the article were used.
    Fallback,
}

/// Sentences selected for one (article, company) pair.
#[derive(Debug, Clone)]
pub struct RelevantSentences<'a> {
    pub sentences: Vec<&'a str>,
    pub selection: Selection,
}

/// Select the sentences of `text` that mention `company`.
///
/// When nothing matches, the first `max_sentences` sentences are returned so
/// some text is always classified. The result is never longer than
/// `max_sentences`, and is empty only when `text` has no sentences.
pub fn select_relevant_sentences<'a>(
    text: &'a str,
    company: &CompanyKey,
    aliases: &AliasPatternSet,
    max_sentences: usize,
) -> RelevantSentences<'a> {
    let sentences = split_sentences(text);

    let (mut hits, selection): (Vec<&str>, _) = match aliases.get(company) {
        Some(patterns) if !patterns.is_empty() => (
            sentences
                .iter()
                .copied()
                .filter(|s| patterns.iter().any(|p| p.is_match(s)))
                .collect(),
            Selection::Alias,
        ),
        _ => (
            sentences
                .iter()
                .copied()
                .filter(|s| simple_key(s).contains(company.as_str()))
                .collect(),
            Selection::KeySubstring,
        ),
    };

    if hits.is_empty() {
        let mut sentences = sentences;
        sentences.truncate(max_sentences);
        return RelevantSentences {
            sentences,
            selection: Selection::Fallback,
        };
    }

    hits.truncate(max_sentences);
    RelevantSentences {
        sentences: hits,
        selection,
    }
}
