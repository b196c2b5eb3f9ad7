//! CSV reading and writing for every table the pipeline produces or consumes.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use topicality_aggregate::{WeeklyCompanyRecord, WEEKLY_COLUMNS};
use topicality_core::{DataPaths, Error, Result};
use topicality_panel::{
    CompanyCoverage, CoverageLine, JoinedRow, MemeWeeklyRecord, PanelDiagnostics, PanelRow,
    PredictionTable,
};
use tracing::info;

pub const MEME_WEEKLY_COLUMNS: [&str; 6] = [
    "company",
    "week_start",
    "num_memes",
    "mean_meme_sentiment",
    "meme_engagement",
    "meme_spike",
];

pub const ENRICHED_COLUMNS: [&str; 12] = [
    "company",
    "week_start",
    "mean_pos",
    "mean_neu",
    "mean_neg",
    "NYT_mention",
    "sentiment_score",
    "non_neutral_share",
    "num_memes",
    "mean_meme_sentiment",
    "meme_engagement",
    "meme_spike",
];

fn csv_err(path: &Path, e: csv::Error) -> Error {
    Error::Csv(format!("{}: {}", path.display(), e))
}

/// Write serde records under an explicit header, so empty tables still
/// carry their column names.
fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    wtr.write_record(header).map_err(|e| csv_err(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| csv_err(path, e))?;
    }
    wtr.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    rdr.deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| csv_err(path, e))
}

pub fn write_nyt_weekly(path: &Path, rows: &[WeeklyCompanyRecord]) -> Result<()> {
    write_table(path, &WEEKLY_COLUMNS, rows)
}

pub fn read_nyt_weekly(path: &Path) -> Result<Vec<WeeklyCompanyRecord>> {
    read_table(path)
}

pub fn write_memes_weekly(path: &Path, rows: &[MemeWeeklyRecord]) -> Result<()> {
    write_table(path, &MEME_WEEKLY_COLUMNS, rows)
}

pub fn read_memes_weekly(path: &Path) -> Result<Vec<MemeWeeklyRecord>> {
    read_table(path)
}

pub fn write_enriched_panel(path: &Path, rows: &[JoinedRow]) -> Result<()> {
    write_table(path, &ENRICHED_COLUMNS, rows)
}

/// Write the analysis-ready panel.
pub fn write_analysis_panel(path: &Path, rows: &[PanelRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    wtr.write_record(PanelRow::header())
        .map_err(|e| csv_err(path, e))?;
    for row in rows {
        wtr.write_record(row.record()).map_err(|e| csv_err(path, e))?;
    }
    wtr.flush()?;
    info!("Wrote {} panel rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write per-company coverage with count and share columns.
pub fn write_company_coverage(path: &Path, rows: &[CompanyCoverage]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    wtr.write_record([
        "company",
        "weeks_total",
        "weeks_with_sentiment",
        "weeks_with_mention_gt0",
        "rows_ok_L1",
        "rows_ok_L2",
        "rows_ok_L3",
        "rows_ok_L4",
        "weeks_with_sentiment_share",
        "weeks_with_mention_gt0_share",
        "rows_ok_L1_share",
        "rows_ok_L2_share",
        "rows_ok_L3_share",
        "rows_ok_L4_share",
    ])
    .map_err(|e| csv_err(path, e))?;
    for c in rows {
        let counts = [
            c.weeks_total,
            c.weeks_with_sentiment,
            c.weeks_with_mention_gt0,
            c.rows_ok_l1,
            c.rows_ok_l2,
            c.rows_ok_l3,
            c.rows_ok_l4,
        ];
        let shares = [
            c.share(c.weeks_with_sentiment),
            c.share(c.weeks_with_mention_gt0),
            c.share(c.rows_ok_l1),
            c.share(c.rows_ok_l2),
            c.share(c.rows_ok_l3),
            c.share(c.rows_ok_l4),
        ];
        let mut record = vec![c.company.to_string()];
        record.extend(counts.iter().map(|n| n.to_string()));
        record.extend(shares.iter().map(|s| s.to_string()));
        wtr.write_record(&record).map_err(|e| csv_err(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the coverage overview table.
pub fn write_coverage_overview(path: &Path, lines: &[CoverageLine]) -> Result<()> {
    write_table(
        path,
        &["requirement", "rows_ok", "share_ok", "variables_required"],
        lines,
    )
}

/// Write every coverage report under `derived/`.
pub fn write_diagnostics(paths: &DataPaths, diagnostics: &PanelDiagnostics) -> Result<()> {
    write_coverage_overview(&paths.overview_csv, &diagnostics.overview)?;
    write_company_coverage(&paths.coverage_csv, &diagnostics.by_company)?;
    write_table(
        &paths.sentiment_runs_csv,
        &["company", "run_len", "num_runs"],
        &diagnostics.sentiment_runs,
    )?;
    write_table(
        &paths.missing_variables_csv,
        &["variable", "missing_rows", "missing_share"],
        &diagnostics.missing_variables,
    )?;
    write_table(
        &paths.missing_combinations_csv,
        &["missing_combo", "missing_rows", "missing_share"],
        &diagnostics.missing_combinations,
    )?;
    write_table(
        &paths.mention_share_csv,
        &["company", "mention_week_share"],
        &diagnostics.mention_share,
    )
}

/// Read a predictions table as raw text cells.
pub fn read_prediction_table(path: &Path) -> Result<PredictionTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_err(path, e))?;
    let headers = rdr
        .headers()
        .map_err(|e| csv_err(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| csv_err(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(PredictionTable { headers, rows })
}
