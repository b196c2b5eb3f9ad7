//! Coverage diagnostics: how many panel rows have the NYT predictors and
//! their lags available, which variables are missing when they do not, and
//! how sentiment coverage is spread over time.

use std::collections::BTreeMap;

use serde::Serialize;
use topicality_core::{CompanyKey, LAG_DEPTH};

use crate::types::{LagSource, PanelRow};

/// Rows meeting one availability requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageLine {
    pub requirement: String,
    pub rows_ok: usize,
    pub share_ok: f64,
    pub variables_required: String,
}

/// Per-company availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyCoverage {
    pub company: CompanyKey,
    pub weeks_total: usize,
    pub weeks_with_sentiment: usize,
    pub weeks_with_mention_gt0: usize,
    pub rows_ok_l1: usize,
    pub rows_ok_l2: usize,
    pub rows_ok_l3: usize,
    pub rows_ok_l4: usize,
}

impl CompanyCoverage {
    pub fn share(&self, count: usize) -> f64 {
        share(count, self.weeks_total)
    }
}

/// Consecutive-week runs of observed sentiment of one length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentRun {
    pub company: CompanyKey,
    pub run_len: usize,
    pub num_runs: usize,
}

/// How often one required variable is missing among rows failing the
/// strict requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingVariable {
    pub variable: String,
    pub missing_rows: usize,
    pub missing_share: f64,
}

/// How often an exact set of required variables is missing together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCombination {
    /// Sorted variable names joined with `|`.
    pub missing_combo: String,
    pub missing_rows: usize,
    pub missing_share: f64,
}

/// Share of a company's panel weeks with at least one NYT mention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionShare {
    pub company: CompanyKey,
    pub mention_week_share: f64,
}

/// Every diagnostic table for one panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PanelDiagnostics {
    pub overview: Vec<CoverageLine>,
    pub by_company: Vec<CompanyCoverage>,
    pub sentiment_runs: Vec<SentimentRun>,
    pub missing_variables: Vec<MissingVariable>,
    pub missing_combinations: Vec<MissingCombination>,
    pub mention_share: Vec<MentionShare>,
}

const PREDICTORS: [LagSource; 2] = [LagSource::NytMention, LagSource::SentimentScore];

/// Required cells for a requirement of `depth` lags: each predictor now,
/// then each predictor at lags 1..=`depth`. Lag 0 is the current value.
fn required_cells(depth: usize) -> Vec<(LagSource, usize)> {
    let mut cells: Vec<(LagSource, usize)> = PREDICTORS.iter().map(|&s| (s, 0)).collect();
    for source in PREDICTORS {
        cells.extend((1..=depth).map(|k| (source, k)));
    }
    cells
}

fn cell_name((source, k): (LagSource, usize)) -> String {
    if k == 0 {
        source.column().to_string()
    } else {
        format!("{}_L{}", source.column(), k)
    }
}

fn cell_value(row: &PanelRow, (source, k): (LagSource, usize)) -> Option<f64> {
    if k == 0 {
        source.value(&row.base)
    } else {
        row.lag(source, k)
    }
}

/// True when both predictors are present now and at lags 1..=`depth`.
fn row_ok(row: &PanelRow, depth: usize) -> bool {
    required_cells(depth)
        .into_iter()
        .all(|cell| cell_value(row, cell).is_some())
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn requirement_name(depth: usize) -> String {
    match depth {
        0 => "current_only".to_string(),
        1 => "current+L1".to_string(),
        d => format!("current+L1..L{}", d),
    }
}

fn required_variables(depth: usize) -> String {
    required_cells(depth)
        .into_iter()
        .map(cell_name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Rows with the predictors available, for current-only and each lag depth.
pub fn coverage_overview(rows: &[PanelRow]) -> Vec<CoverageLine> {
    let total = rows.len();
    (0..=LAG_DEPTH)
        .map(|depth| {
            let rows_ok = rows.iter().filter(|r| row_ok(r, depth)).count();
            CoverageLine {
                requirement: requirement_name(depth),
                rows_ok,
                share_ok: share(rows_ok, total),
                variables_required: required_variables(depth),
            }
        })
        .collect()
}

/// Per-company coverage, best-covered (by full-lag rows) first.
pub fn company_coverage(rows: &[PanelRow]) -> Vec<CompanyCoverage> {
    let mut by_company: BTreeMap<&CompanyKey, CompanyCoverage> = BTreeMap::new();
    for row in rows {
        let c = by_company
            .entry(&row.base.company)
            .or_insert_with(|| CompanyCoverage {
                company: row.base.company.clone(),
                weeks_total: 0,
                weeks_with_sentiment: 0,
                weeks_with_mention_gt0: 0,
                rows_ok_l1: 0,
                rows_ok_l2: 0,
                rows_ok_l3: 0,
                rows_ok_l4: 0,
            });
        c.weeks_total += 1;
        c.weeks_with_sentiment += usize::from(row.base.sentiment_score.is_some());
        c.weeks_with_mention_gt0 += usize::from(row.base.nyt_mention > 0);
        c.rows_ok_l1 += usize::from(row_ok(row, 1));
        c.rows_ok_l2 += usize::from(row_ok(row, 2));
        c.rows_ok_l3 += usize::from(row_ok(row, 3));
        c.rows_ok_l4 += usize::from(row_ok(row, 4));
    }

    let mut out: Vec<CompanyCoverage> = by_company.into_values().collect();
    // Stable sort keeps company order among ties
    out.sort_by(|a, b| b.rows_ok_l4.cmp(&a.rows_ok_l4));
    out
}

/// Lengths of consecutive-week runs with sentiment present, per company.
///
/// Rows must be sorted by (company, week_start), as panel rows are. Output
/// is by company, longest runs first.
pub fn sentiment_run_lengths(rows: &[PanelRow]) -> Vec<SentimentRun> {
    let mut counts: BTreeMap<(&CompanyKey, usize), usize> = BTreeMap::new();
    let mut run: Option<(&CompanyKey, usize)> = None;
    for row in rows {
        let company = &row.base.company;
        let present = row.base.sentiment_score.is_some();
        run = match run {
            Some((c, len)) if c == company && present => Some((c, len + 1)),
            Some((c, len)) => {
                *counts.entry((c, len)).or_default() += 1;
                present.then_some((company, 1))
            }
            None => present.then_some((company, 1)),
        };
    }
    if let Some((c, len)) = run {
        *counts.entry((c, len)).or_default() += 1;
    }

    let mut out: Vec<SentimentRun> = counts
        .into_iter()
        .map(|((company, run_len), num_runs)| SentimentRun {
            company: company.clone(),
            run_len,
            num_runs,
        })
        .collect();
    out.sort_by(|a, b| a.company.cmp(&b.company).then(b.run_len.cmp(&a.run_len)));
    out
}

/// Why rows fail the strict current+L1..L4 requirement: per missing
/// variable and per exact missing combination, most frequent first.
/// Shares are relative to all panel rows.
pub fn missing_breakdown(rows: &[PanelRow]) -> (Vec<MissingVariable>, Vec<MissingCombination>) {
    let cells = required_cells(LAG_DEPTH);
    let mut per_variable = vec![0usize; cells.len()];
    let mut combos: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        let mut missing: Vec<String> = Vec::new();
        for (i, &cell) in cells.iter().enumerate() {
            if cell_value(row, cell).is_none() {
                per_variable[i] += 1;
                missing.push(cell_name(cell));
            }
        }
        if !missing.is_empty() {
            missing.sort();
            *combos.entry(missing.join("|")).or_default() += 1;
        }
    }

    let total = rows.len();
    let mut variables: Vec<MissingVariable> = cells
        .into_iter()
        .zip(per_variable)
        .map(|(cell, n)| MissingVariable {
            variable: cell_name(cell),
            missing_rows: n,
            missing_share: share(n, total),
        })
        .collect();
    variables.sort_by(|a, b| b.missing_rows.cmp(&a.missing_rows));

    let mut combinations: Vec<MissingCombination> = combos
        .into_iter()
        .map(|(missing_combo, n)| MissingCombination {
            missing_combo,
            missing_rows: n,
            missing_share: share(n, total),
        })
        .collect();
    combinations.sort_by(|a, b| b.missing_rows.cmp(&a.missing_rows));
    (variables, combinations)
}

/// Share of weeks with a mention, per company, highest first.
pub fn mention_week_share(rows: &[PanelRow]) -> Vec<MentionShare> {
    let mut by_company: BTreeMap<&CompanyKey, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let (weeks, mentioned) = by_company.entry(&row.base.company).or_default();
        *weeks += 1;
        *mentioned += usize::from(row.base.nyt_mention > 0);
    }
    let mut out: Vec<MentionShare> = by_company
        .into_iter()
        .map(|(company, (weeks, mentioned))| MentionShare {
            company: company.clone(),
            mention_week_share: share(mentioned, weeks),
        })
        .collect();
    out.sort_by(|a, b| b.mention_week_share.total_cmp(&a.mention_week_share));
    out
}

/// All coverage diagnostics for a panel.
pub fn diagnose_panel(rows: &[PanelRow]) -> PanelDiagnostics {
    let (missing_variables, missing_combinations) = missing_breakdown(rows);
    PanelDiagnostics {
        overview: coverage_overview(rows),
        by_company: company_coverage(rows),
        sentiment_runs: sentiment_run_lengths(rows),
        missing_variables,
        missing_combinations,
        mention_share: mention_week_share(rows),
    }
}
