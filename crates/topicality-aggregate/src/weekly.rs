//! Per-company, per-week aggregation of article sentiment.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use topicality_core::{week_start, CompanyKey};
use tracing::debug;

use crate::types::{ArticleSentiment, WeeklyCompanyRecord};

/// Aggregate scored articles into weekly company records.
///
/// Articles dated before `min_date` are dropped. The output is sorted by
/// (company, week_start) and does not depend on input order.
pub fn aggregate_weekly(rows: &[ArticleSentiment], min_date: NaiveDate) -> Vec<WeeklyCompanyRecord> {
    let mut groups: BTreeMap<(CompanyKey, NaiveDate), Vec<&ArticleSentiment>> = BTreeMap::new();
    let mut dropped = 0usize;
    for row in rows {
        if row.date < min_date {
            dropped += 1;
            continue;
        }
        groups
            .entry((row.company.clone(), week_start(row.date)))
            .or_default()
            .push(row);
    }
    if dropped > 0 {
        debug!("Dropped {} articles dated before {}", dropped, min_date);
    }

    groups
        .into_iter()
        .map(|((company, week), mut members)| {
            // Fixed summation order keeps float results identical across runs
            members.sort_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then(a.sentiment.positive.total_cmp(&b.sentiment.positive))
                    .then(a.sentiment.neutral.total_cmp(&b.sentiment.neutral))
                    .then(a.sentiment.negative.total_cmp(&b.sentiment.negative))
            });
            let n = members.len() as f64;
            let (mut pos, mut neu, mut neg) = (0.0, 0.0, 0.0);
            for m in &members {
                pos += m.sentiment.positive;
                neu += m.sentiment.neutral;
                neg += m.sentiment.negative;
            }
            let (mean_pos, mean_neu, mean_neg) = (pos / n, neu / n, neg / n);
            WeeklyCompanyRecord {
                company,
                week_start: week,
                mean_pos,
                mean_neu,
                mean_neg,
                nyt_mention: members.len() as u64,
                sentiment_score: mean_pos - mean_neg,
                non_neutral_share: 1.0 - mean_neu,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use topicality_infer::SentimentTriple;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(company: &str, d: NaiveDate, p: f64, u: f64, n: f64) -> ArticleSentiment {
        ArticleSentiment {
            company: CompanyKey::normalize(company),
            date: d,
            sentiment: SentimentTriple::new(p, u, n),
        }
    }

    fn min_date() -> NaiveDate {
        date(2023, 1, 1)
    }

    #[test]
    fn test_weekly_means_and_derived_fields() {
        // 2023-03-13 is a Monday; 15th and 19th fall in the same week
        let rows = vec![
            row("Acme", date(2023, 3, 15), 0.6, 0.3, 0.1),
            row("Acme", date(2023, 3, 19), 0.2, 0.5, 0.3),
            row("Acme", date(2023, 3, 20), 0.1, 0.1, 0.8),
        ];
        let out = aggregate_weekly(&rows, min_date());
        assert_eq!(out.len(), 2);

        let first = &out[0];
        assert_eq!(first.week_start, date(2023, 3, 13));
        assert_eq!(first.nyt_mention, 2);
        assert!((first.mean_pos - 0.4).abs() < 1e-12);
        assert!((first.mean_neu - 0.4).abs() < 1e-12);
        assert!((first.mean_neg - 0.2).abs() < 1e-12);
        assert!((first.sentiment_score - 0.2).abs() < 1e-12);
        assert!((first.non_neutral_share - 0.6).abs() < 1e-12);

        assert_eq!(out[1].week_start, date(2023, 3, 20));
        assert_eq!(out[1].nyt_mention, 1);
    }

    #[test]
    fn test_min_date_filter() {
        let rows = vec![
            row("Acme", date(2022, 12, 30), 1.0, 0.0, 0.0),
            row("Acme", date(2023, 1, 2), 0.0, 1.0, 0.0),
        ];
        let out = aggregate_weekly(&rows, min_date());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].week_start, date(2023, 1, 2));
        assert_eq!(out[0].mean_pos, 0.0);
    }

    #[test]
    fn test_order_independence() {
        let mut rows = vec![
            row("Zeta", date(2023, 5, 2), 0.11, 0.33, 0.56),
            row("Acme", date(2023, 5, 3), 0.7, 0.2, 0.1),
            row("Acme", date(2023, 5, 1), 0.1, 0.7, 0.2),
            row("Acme", date(2023, 5, 4), 0.3, 0.3, 0.4),
            row("Zeta", date(2024, 2, 7), 0.5, 0.25, 0.25),
        ];
        let forward = aggregate_weekly(&rows, min_date());
        rows.reverse();
        let backward = aggregate_weekly(&rows, min_date());
        rows.swap(0, 3);
        let shuffled = aggregate_weekly(&rows, min_date());

        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
        let keys: Vec<_> = forward
            .iter()
            .map(|r| (r.company.as_str().to_string(), r.week_start))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("acme".to_string(), date(2023, 5, 1)),
                ("zeta".to_string(), date(2023, 5, 1)),
                ("zeta".to_string(), date(2024, 2, 5)),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_weekly(&[], min_date()).is_empty());
    }
}
