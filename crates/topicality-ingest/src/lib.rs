//! Topicality Ingest: archive segmentation, header field extraction,
//! publication date parsing, text preprocessing.

pub mod date;
pub mod file;
pub mod segment;
pub mod text;

pub use date::parse_pub_date;
pub use file::{list_archive_files, RawDocument};
pub use segment::{extract_fields, segment, ArticleBlock, ARTICLE_SEPARATOR};
pub use text::{preprocess_article_text, split_sentences};
