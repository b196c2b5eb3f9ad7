//! Resolvers: decide which company an article, or a sentence within it,
//! is actually about.
//!
//! Alias definitions compile to whole-phrase matchers; the relevance filter
//! uses them to pick the sentences worth classifying.

pub mod alias;
pub mod relevance;

pub use alias::{parse_alias_line, AliasExpr, AliasPattern, AliasPatternSet};
pub use relevance::{select_relevant_sentences, RelevantSentences, Selection};
