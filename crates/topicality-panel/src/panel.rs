//! Panel assembly: join the weekly NYT and meme tables, balance to a full
//! company × week grid, then add transforms, lags and normalizations.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array1;
use topicality_aggregate::WeeklyCompanyRecord;
use topicality_core::{iso_year_week, monday_range, CompanyKey, LAG_DEPTH};
use tracing::info;

use crate::normalize::{relative_to_baseline, zscores, BASELINE_MIN_WEEKS, BASELINE_WEEKS};
use crate::types::{JoinedRow, LagSource, MemeWeeklyRecord, PanelRow};

/// Output of panel assembly.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    /// Joined rows only for weeks present in either source.
    pub enriched: Vec<JoinedRow>,
    /// Balanced grid, sorted by (company, week_start).
    pub rows: Vec<PanelRow>,
}

impl Panel {
    pub fn companies(&self) -> usize {
        self.rows
            .iter()
            .map(|r| &r.base.company)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Outer-join both weekly tables on (company, week_start).
///
/// Counts missing on one side become 0; rates stay null.
pub fn join_weekly(nyt: &[WeeklyCompanyRecord], memes: &[MemeWeeklyRecord]) -> Vec<JoinedRow> {
    let mut joined: BTreeMap<(CompanyKey, chrono::NaiveDate), JoinedRow> = BTreeMap::new();

    for r in nyt {
        let row = joined
            .entry((r.company.clone(), r.week_start))
            .or_insert_with(|| JoinedRow::empty(r.company.clone(), r.week_start));
        row.mean_pos = Some(r.mean_pos);
        row.mean_neu = Some(r.mean_neu);
        row.mean_neg = Some(r.mean_neg);
        row.nyt_mention = r.nyt_mention;
        row.sentiment_score = Some(r.sentiment_score);
        row.non_neutral_share = Some(r.non_neutral_share);
    }

    for r in memes {
        let row = joined
            .entry((r.company.clone(), r.week_start))
            .or_insert_with(|| JoinedRow::empty(r.company.clone(), r.week_start));
        row.num_memes = r.num_memes;
        row.mean_meme_sentiment = Some(r.mean_meme_sentiment);
        row.meme_engagement = r.meme_engagement;
        row.meme_spike = Some(r.meme_spike);
    }

    joined.into_values().collect()
}

/// Build the analysis-ready panel.
pub fn build_panel(nyt: &[WeeklyCompanyRecord], memes: &[MemeWeeklyRecord]) -> Panel {
    let enriched = join_weekly(nyt, memes);
    let rows = balance(&enriched);
    let mut panel = Panel { enriched, rows };

    // No engagement at all means the predictions table had no such column
    let has_engagement = memes.iter().any(|m| m.meme_engagement.is_some());
    add_transforms(&mut panel.rows, has_engagement);
    for group in company_groups(&mut panel.rows) {
        add_lags(group);
        add_normalizations(group);
    }

    info!(
        "Panel: {} joined rows, {} balanced rows over {} companies",
        panel.enriched.len(),
        panel.rows.len(),
        panel.companies()
    );
    panel
}

/// Every observed company × every Monday between the earliest and latest
/// observed week. Gap rows get zero counts and null rates.
fn balance(joined: &[JoinedRow]) -> Vec<PanelRow> {
    let (Some(first), Some(last)) = (
        joined.iter().map(|r| r.week_start).min(),
        joined.iter().map(|r| r.week_start).max(),
    ) else {
        return Vec::new();
    };
    let weeks = monday_range(first, last);
    let companies: BTreeSet<&CompanyKey> = joined.iter().map(|r| &r.company).collect();
    let by_key: BTreeMap<(&CompanyKey, chrono::NaiveDate), &JoinedRow> = joined
        .iter()
        .map(|r| ((&r.company, r.week_start), r))
        .collect();

    let mut rows = Vec::with_capacity(companies.len() * weeks.len());
    for company in companies {
        for &week in &weeks {
            let base = by_key
                .get(&(company, week))
                .map(|r| (*r).clone())
                .unwrap_or_else(|| JoinedRow::empty(company.clone(), week));
            rows.push(PanelRow::new(base));
        }
    }
    rows
}

fn add_transforms(rows: &mut [PanelRow], has_engagement: bool) {
    for row in rows {
        let b = &row.base;
        row.log1p_meme_volume = (b.num_memes as f64).ln_1p();
        row.log1p_nyt_mention = (b.nyt_mention as f64).ln_1p();
        row.log1p_meme_engagement =
            has_engagement.then(|| b.meme_engagement.unwrap_or(0.0).ln_1p());
        let (year, week) = iso_year_week(b.week_start);
        row.iso_year = year;
        row.iso_week = week;
    }
}

/// Split week-sorted rows into per-company slices.
fn company_groups(rows: &mut [PanelRow]) -> Vec<&mut [PanelRow]> {
    let mut groups = Vec::new();
    let mut rest = rows;
    while !rest.is_empty() {
        let company = rest[0].base.company.clone();
        let len = rest
            .iter()
            .position(|r| r.base.company != company)
            .unwrap_or(rest.len());
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        groups.push(head);
        rest = tail;
    }
    groups
}

/// Rows of one company, sorted by week.
fn add_lags(group: &mut [PanelRow]) {
    for source in LagSource::ALL {
        let values: Vec<Option<f64>> = group.iter().map(|r| source.value(&r.base)).collect();
        for (i, row) in group.iter_mut().enumerate() {
            for k in 1..=LAG_DEPTH {
                let lagged = i.checked_sub(k).and_then(|j| values[j]);
                row.set_lag(source, k, lagged);
            }
        }
    }
}

fn add_normalizations(group: &mut [PanelRow]) {
    let counts = Array1::from_iter(group.iter().map(|r| r.base.num_memes as f64));
    let z = zscores(counts.view());
    let rel = relative_to_baseline(counts.view(), BASELINE_WEEKS, BASELINE_MIN_WEEKS);
    for (i, row) in group.iter_mut().enumerate() {
        row.num_memes_z = z[i];
        row.num_memes_rel = rel[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week(n: i64) -> NaiveDate {
        // 2023-01-02 is a Monday
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::weeks(n)
    }

    fn nyt(company: &str, w: NaiveDate, sentiment: f64, mentions: u64) -> WeeklyCompanyRecord {
        WeeklyCompanyRecord {
            company: CompanyKey::normalize(company),
            week_start: w,
            mean_pos: 0.5 + sentiment / 2.0,
            mean_neu: 0.0,
            mean_neg: 0.5 - sentiment / 2.0,
            nyt_mention: mentions,
            sentiment_score: sentiment,
            non_neutral_share: 1.0,
        }
    }

    fn meme(company: &str, w: NaiveDate, n: u64) -> MemeWeeklyRecord {
        MemeWeeklyRecord {
            company: CompanyKey::normalize(company),
            week_start: w,
            num_memes: n,
            mean_meme_sentiment: 0.1,
            meme_engagement: Some(9.0),
            meme_spike: 0,
        }
    }

    #[test]
    fn test_grid_completeness() {
        let panel = build_panel(
            &[nyt("Acme", week(0), 0.2, 3), nyt("Acme", week(4), -0.1, 1)],
            &[meme("Globex", week(2), 7)],
        );

        assert_eq!(panel.enriched.len(), 3);
        assert_eq!(panel.rows.len(), 10);
        assert_eq!(panel.companies(), 2);

        let acme: Vec<_> = panel.rows.iter().filter(|r| r.base.company.as_str() == "acme").collect();
        assert_eq!(acme.len(), 5);
        let weeks: Vec<_> = acme.iter().map(|r| r.base.week_start).collect();
        assert_eq!(weeks, (0..5).map(week).collect::<Vec<_>>());

        // Gap week: zero counts, null rates
        let gap = &acme[1].base;
        assert_eq!(gap.nyt_mention, 0);
        assert_eq!(gap.num_memes, 0);
        assert_eq!(gap.sentiment_score, None);
        assert_eq!(gap.mean_meme_sentiment, None);
        assert_eq!(gap.meme_spike, None);

        let globex_w2 = panel
            .rows
            .iter()
            .find(|r| r.base.company.as_str() == "globex" && r.base.week_start == week(2))
            .unwrap();
        assert_eq!(globex_w2.base.num_memes, 7);
        assert_eq!(globex_w2.base.nyt_mention, 0);
        assert_eq!(globex_w2.base.mean_pos, None);
        assert!((globex_w2.log1p_meme_volume - 8f64.ln()).abs() < 1e-12);
        assert!((globex_w2.log1p_meme_engagement.unwrap() - 10f64.ln()).abs() < 1e-12);
        assert_eq!(globex_w2.log1p_nyt_mention, 0.0);
        // Engagement was reported somewhere, so gap weeks count as zero
        assert_eq!(acme[1].log1p_meme_engagement, Some(0.0));
    }

    #[test]
    fn test_engagement_transform_null_without_engagement() {
        let mut without = meme("Acme", week(0), 3);
        without.meme_engagement = None;
        let panel = build_panel(&[nyt("Acme", week(1), 0.2, 1)], &[without]);
        assert_eq!(panel.rows.len(), 2);
        assert!(panel.rows.iter().all(|r| r.log1p_meme_engagement.is_none()));
        assert!((panel.rows[0].log1p_meme_volume - 4f64.ln()).abs() < 1e-12);

        let header = PanelRow::header();
        let col = header.iter().position(|c| c == "log1p_meme_engagement").unwrap();
        assert_eq!(panel.rows[0].record()[col], "");
    }

    #[test]
    fn test_lags() {
        let sentiments = [Some(0.1), Some(0.2), Some(0.3), None, Some(0.5)];
        let records: Vec<_> = sentiments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|v| nyt("Acme", week(i as i64), v, 1)))
            .collect();
        let panel = build_panel(&records, &[]);
        assert_eq!(panel.rows.len(), 5);

        let last = &panel.rows[4];
        assert_eq!(last.lag(LagSource::SentimentScore, 1), None);
        assert_eq!(last.lag(LagSource::SentimentScore, 2), Some(0.3));
        assert_eq!(last.lag(LagSource::SentimentScore, 4), Some(0.1));
        // Counts are filled, so their lags exist whenever history does
        assert_eq!(last.lag(LagSource::NytMention, 1), Some(0.0));

        let first = &panel.rows[0];
        for k in 1..=LAG_DEPTH {
            assert_eq!(first.lag(LagSource::SentimentScore, k), None);
            assert_eq!(first.lag(LagSource::NumMemes, k), None);
        }
    }

    #[test]
    fn test_lags_do_not_cross_companies() {
        let panel = build_panel(
            &[nyt("Acme", week(0), 0.4, 1), nyt("Zeta", week(1), 0.9, 1)],
            &[],
        );
        let zeta_first = panel
            .rows
            .iter()
            .find(|r| r.base.company.as_str() == "zeta")
            .unwrap();
        assert_eq!(zeta_first.base.week_start, week(0));
        assert_eq!(zeta_first.lag(LagSource::SentimentScore, 1), None);
    }

    #[test]
    fn test_iso_and_normalizations() {
        let memes: Vec<_> = [2, 4, 6, 8].iter().enumerate().map(|(i, &n)| meme("Acme", week(i as i64), n)).collect();
        let panel = build_panel(&[], &memes);
        assert_eq!(panel.rows[0].iso_year, 2023);
        assert_eq!(panel.rows[0].iso_week, 1);
        assert_eq!(panel.rows[0].num_memes_rel, 1.0);
        assert!((panel.rows[3].num_memes_rel - 2.0).abs() < 1e-12);
        assert!(panel.rows[0].num_memes_z < 0.0);
        assert!(panel.rows[3].num_memes_z > 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        let panel = build_panel(&[], &[]);
        assert!(panel.rows.is_empty());
        assert!(panel.enriched.is_empty());
    }
}
