//! Company-level sentiment summaries across all of a company's articles.

use std::collections::BTreeMap;

use topicality_core::CompanyKey;
use topicality_infer::{SentimentLabel, SentimentTriple};

use crate::types::{ArticleSentiment, CompanyReport, CompanySummary};

/// Summarize a set of document triples. Empty input → all zeros.
pub fn summarize_company(docs: &[SentimentTriple]) -> CompanySummary {
    if docs.is_empty() {
        return CompanySummary::default();
    }
    let n = docs.len() as f64;
    let mean = |f: fn(&SentimentTriple) -> f64| docs.iter().map(f).sum::<f64>() / n;
    let share = |label: SentimentLabel| {
        docs.iter().filter(|d| d.dominant() == label).count() as f64 / n
    };

    let mean_pos = mean(|d| d.positive);
    let mean_neu = mean(|d| d.neutral);
    let mean_neg = mean(|d| d.negative);
    CompanySummary {
        n_docs: docs.len(),
        mean_pos,
        mean_neu,
        mean_neg,
        sentiment_score: mean_pos - mean_neg,
        share_pos_docs: share(SentimentLabel::Positive),
        share_neg_docs: share(SentimentLabel::Negative),
        non_neutral_share: 1.0 - mean_neu,
    }
}

/// Group scored articles by company and summarize each, sorted by company.
pub fn summarize_by_company(rows: &[ArticleSentiment]) -> Vec<CompanyReport> {
    let mut groups: BTreeMap<&CompanyKey, Vec<&ArticleSentiment>> = BTreeMap::new();
    for row in rows {
        groups.entry(&row.company).or_default().push(row);
    }

    groups
        .into_iter()
        .filter_map(|(company, members)| {
            let first_date = members.iter().map(|m| m.date).min()?;
            let last_date = members.iter().map(|m| m.date).max()?;
            let triples: Vec<SentimentTriple> = members.iter().map(|m| m.sentiment).collect();
            Some(CompanyReport {
                company: company.clone(),
                first_date,
                last_date,
                summary: summarize_company(&triples),
            })
        })
        .collect()
}
