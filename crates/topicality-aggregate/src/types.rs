//! Aggregation types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use topicality_core::CompanyKey;
use topicality_infer::SentimentTriple;

/// One scored article, attributed to a company and dated.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleSentiment {
    pub company: CompanyKey,
    pub date: NaiveDate,
    pub sentiment: SentimentTriple,
}

/// Weekly NYT sentiment for one company. Column order matches the CSV output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCompanyRecord {
    pub company: CompanyKey,
    pub week_start: NaiveDate,
    pub mean_pos: f64,
    pub mean_neu: f64,
    pub mean_neg: f64,
    #[serde(rename = "NYT_mention")]
    pub nyt_mention: u64,
    pub sentiment_score: f64,
    pub non_neutral_share: f64,
}

/// Column names of the weekly NYT table, including when it is empty.
pub const WEEKLY_COLUMNS: [&str; 8] = [
    "company",
    "week_start",
    "mean_pos",
    "mean_neu",
    "mean_neg",
    "NYT_mention",
    "sentiment_score",
    "non_neutral_share",
];

/// Company-level sentiment over a set of documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub n_docs: usize,
    pub mean_pos: f64,
    pub mean_neu: f64,
    pub mean_neg: f64,
    pub sentiment_score: f64,
    pub share_pos_docs: f64,
    pub share_neg_docs: f64,
    pub non_neutral_share: f64,
}

/// Summary for one company with its publication date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    pub company: CompanyKey,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    #[serde(flatten)]
    pub summary: CompanySummary,
}
