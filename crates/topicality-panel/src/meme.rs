//! Weekly meme activity from an image predictions table.
//!
//! The predictions table comes from an upstream scraper whose column names
//! vary between exports. `MemeSchema` lists the accepted names for every
//! role; resolution picks the first candidate present in the header.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use topicality_core::{week_start, CompanyKey, Error, Result};
use topicality_infer::{meme_sentiment, ImageSentimentScorer};
use tracing::{debug, info};

use crate::types::{MemeObservation, MemeWeeklyRecord};

/// Predictions table file names, in order of preference.
pub const PREDICTION_TABLES: [&str; 3] = [
    "enriched_predictions_metadata.csv",
    "predictions_metadata.csv",
    "predictions_manifest.csv",
];

/// Directory name that precedes the company folder in image paths.
const IMAGE_ROOT_SEGMENT: &str = "prediction_images";

const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// Quantile of a company's weekly counts above which a week is a spike.
const SPIKE_QUANTILE: f64 = 0.90;

/// Companies with fewer observed weeks never get a spike flag.
pub const MIN_SPIKE_WEEKS: usize = 4;

/// Pick the predictions table to read from a predictions directory.
pub fn locate_predictions_table(dir: &Path) -> Option<PathBuf> {
    PREDICTION_TABLES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// A predictions table held as text cells.
#[derive(Debug, Clone, Default)]
pub struct PredictionTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Accepted column names per role.
#[derive(Debug, Clone)]
pub struct MemeSchema {
    pub timestamp: Vec<String>,
    pub company: Vec<String>,
    pub path: Vec<String>,
    pub engagement: Vec<String>,
    pub sentiment: Vec<String>,
}

impl Default for MemeSchema {
    fn default() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        Self {
            timestamp: owned(&["created_utc", "created_at", "created", "timestamp", "date"]),
            company: owned(&["company", "brand", "label", "folder"]),
            path: owned(&["saved_path", "path", "filepath", "image_path", "image", "filename"]),
            engagement: owned(&["engagement", "score", "upvotes"]),
            sentiment: owned(&["meme_sentiment"]),
        }
    }
}

/// Column indices chosen for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub timestamp: usize,
    pub company: Option<usize>,
    pub path: Option<usize>,
    pub engagement: Option<usize>,
    pub sentiment: Option<usize>,
}

impl MemeSchema {
    /// Map roles to header positions. A table without a timestamp column, or
    /// without both a company and a path column, is a schema error.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedSchema> {
        let find = |candidates: &[String]| {
            candidates
                .iter()
                .find_map(|c| headers.iter().position(|h| h.trim() == c.as_str()))
        };

        let timestamp = find(&self.timestamp).ok_or_else(|| {
            Error::Schema(format!(
                "no timestamp column (expected one of {:?}, found {:?})",
                self.timestamp, headers
            ))
        })?;
        let company = find(&self.company);
        let path = find(&self.path);
        if company.is_none() && path.is_none() {
            return Err(Error::Schema(format!(
                "no company or path column (expected one of {:?} or {:?}, found {:?})",
                self.company, self.path, headers
            )));
        }

        Ok(ResolvedSchema {
            timestamp,
            company,
            path,
            engagement: find(&self.engagement),
            sentiment: find(&self.sentiment),
        })
    }
}

/// Parse a meme timestamp to its UTC calendar date.
///
/// Numbers are Unix seconds; text may be RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// or `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<f64>() {
        if !secs.is_finite() {
            return None;
        }
        return DateTime::<Utc>::from_timestamp(secs.floor() as i64, 0).map(|dt| dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Company key from an image path: the folder after `prediction_images`,
/// else the first segment that is not an image file name.
pub fn company_from_path(path: &str) -> CompanyKey {
    let parts: Vec<&str> = path.split(['/', '\\']).filter(|p| !p.is_empty()).collect();

    if let Some(idx) = parts
        .iter()
        .position(|p| p.eq_ignore_ascii_case(IMAGE_ROOT_SEGMENT))
    {
        if let Some(next) = parts.get(idx + 1) {
            return CompanyKey::normalize(next);
        }
    }

    parts
        .iter()
        .find(|p| {
            let lower = p.to_ascii_lowercase();
            !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .map(|p| CompanyKey::normalize(p))
        .unwrap_or_else(|| CompanyKey::normalize(""))
}

/// Counters from turning a table into observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationStats {
    pub rows: usize,
    pub bad_timestamp: usize,
    pub no_company: usize,
}

/// Turn table rows into scored observations.
///
/// Image paths are resolved against `image_root`. Rows whose timestamp does
/// not parse or whose company key is empty are dropped and counted.
pub fn observations_from_table(
    table: &PredictionTable,
    schema: &ResolvedSchema,
    image_root: &Path,
    scorers: &[Box<dyn ImageSentimentScorer>],
) -> (Vec<MemeObservation>, ObservationStats) {
    let mut stats = ObservationStats {
        rows: table.rows.len(),
        ..Default::default()
    };
    let cell = |row: &[String], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i)).map(|s| s.trim().to_string())
    };

    let mut out = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        let Some(date) = cell(row, Some(schema.timestamp)).as_deref().and_then(parse_timestamp) else {
            debug!("Row {}: unparseable timestamp", i + 1);
            stats.bad_timestamp += 1;
            continue;
        };

        let path = cell(row, schema.path).filter(|p| !p.is_empty());
        let named = cell(row, schema.company).filter(|c| !c.is_empty());
        let company = match (named, &path) {
            (Some(name), _) => CompanyKey::normalize(&name),
            (None, Some(p)) => company_from_path(p),
            (None, None) => CompanyKey::normalize(""),
        };
        if company.is_empty() {
            debug!("Row {}: no company", i + 1);
            stats.no_company += 1;
            continue;
        }

        let precomputed = cell(row, schema.sentiment).and_then(|s| s.parse::<f64>().ok());
        let sentiment = match precomputed {
            Some(s) => s,
            None => {
                let image = path
                    .as_deref()
                    .map(|p| image_root.join(p))
                    .unwrap_or_default();
                meme_sentiment(&image, scorers)
            }
        };

        let engagement = cell(row, schema.engagement).and_then(|s| s.parse::<f64>().ok());
        out.push(MemeObservation {
            company,
            date,
            sentiment,
            engagement,
        });
    }
    (out, stats)
}

/// Aggregate observations into weekly company records, sorted by
/// (company, week_start).
///
/// `with_engagement` controls whether `meme_engagement` is reported; it
/// should be true when the source table had an engagement column.
pub fn build_memes_weekly(
    observations: &[MemeObservation],
    with_engagement: bool,
) -> Vec<MemeWeeklyRecord> {
    let mut groups: BTreeMap<(CompanyKey, NaiveDate), Vec<&MemeObservation>> = BTreeMap::new();
    for obs in observations {
        groups
            .entry((obs.company.clone(), week_start(obs.date)))
            .or_default()
            .push(obs);
    }

    let mut records: Vec<MemeWeeklyRecord> = groups
        .into_iter()
        .map(|((company, week), members)| {
            let n = members.len();
            let mean_meme_sentiment = members.iter().map(|m| m.sentiment).sum::<f64>() / n as f64;
            let meme_engagement = if with_engagement {
                let values: Vec<f64> = members.iter().filter_map(|m| m.engagement).collect();
                (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
            } else {
                None
            };
            MemeWeeklyRecord {
                company,
                week_start: week,
                num_memes: n as u64,
                mean_meme_sentiment,
                meme_engagement,
                meme_spike: 0,
            }
        })
        .collect();

    flag_spikes(&mut records);
    info!(
        "Built {} weekly meme records from {} observations",
        records.len(),
        observations.len()
    );
    records
}

/// Set `meme_spike` on weeks whose count exceeds the company's 90th
/// percentile. Records must be grouped by company.
fn flag_spikes(records: &mut [MemeWeeklyRecord]) {
    let mut start = 0;
    while start < records.len() {
        let company = records[start].company.clone();
        let end = records[start..]
            .iter()
            .position(|r| r.company != company)
            .map_or(records.len(), |off| start + off);

        let group = &mut records[start..end];
        if group.len() >= MIN_SPIKE_WEEKS {
            let counts: Vec<f64> = group.iter().map(|r| r.num_memes as f64).collect();
            let threshold = quantile(&counts, SPIKE_QUANTILE);
            for r in group.iter_mut() {
                r.meme_spike = u8::from(r.num_memes as f64 > threshold);
            }
        }
        start = end;
    }
}

/// Linearly interpolated quantile of a non-empty sample.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
