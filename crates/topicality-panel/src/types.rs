//! Meme and panel row types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use topicality_core::{CompanyKey, LAG_DEPTH};

/// One scored meme image.
#[derive(Debug, Clone, PartialEq)]
pub struct MemeObservation {
    pub company: CompanyKey,
    pub date: NaiveDate,
    pub sentiment: f64,
    pub engagement: Option<f64>,
}

/// Weekly meme activity for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeWeeklyRecord {
    pub company: CompanyKey,
    pub week_start: NaiveDate,
    pub num_memes: u64,
    pub mean_meme_sentiment: f64,
    /// Mean engagement; `None` when the source table had no engagement column.
    pub meme_engagement: Option<f64>,
    pub meme_spike: u8,
}

/// NYT and meme weekly records outer-joined on (company, week_start), with
/// counts filled to zero and rates left null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub company: CompanyKey,
    pub week_start: NaiveDate,
    pub mean_pos: Option<f64>,
    pub mean_neu: Option<f64>,
    pub mean_neg: Option<f64>,
    #[serde(rename = "NYT_mention")]
    pub nyt_mention: u64,
    pub sentiment_score: Option<f64>,
    pub non_neutral_share: Option<f64>,
    pub num_memes: u64,
    pub mean_meme_sentiment: Option<f64>,
    pub meme_engagement: Option<f64>,
    pub meme_spike: Option<u8>,
}

impl JoinedRow {
    /// A gap row: zero counts, every rate null.
    pub fn empty(company: CompanyKey, week_start: NaiveDate) -> Self {
        Self {
            company,
            week_start,
            mean_pos: None,
            mean_neu: None,
            mean_neg: None,
            nyt_mention: 0,
            sentiment_score: None,
            non_neutral_share: None,
            num_memes: 0,
            mean_meme_sentiment: None,
            meme_engagement: None,
            meme_spike: None,
        }
    }
}

/// Columns that get `_L1`..`_L4` lag copies, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LagSource {
    SentimentScore,
    MeanPos,
    MeanNeg,
    NonNeutralShare,
    NytMention,
    NumMemes,
    MeanMemeSentiment,
    MemeEngagement,
}

impl LagSource {
    pub const COUNT: usize = 8;

    pub const ALL: [LagSource; Self::COUNT] = [
        Self::SentimentScore,
        Self::MeanPos,
        Self::MeanNeg,
        Self::NonNeutralShare,
        Self::NytMention,
        Self::NumMemes,
        Self::MeanMemeSentiment,
        Self::MemeEngagement,
    ];

    pub fn value(self, row: &JoinedRow) -> Option<f64> {
        match self {
            Self::SentimentScore => row.sentiment_score,
            Self::MeanPos => row.mean_pos,
            Self::MeanNeg => row.mean_neg,
            Self::NonNeutralShare => row.non_neutral_share,
            Self::NytMention => Some(row.nyt_mention as f64),
            Self::NumMemes => Some(row.num_memes as f64),
            Self::MeanMemeSentiment => row.mean_meme_sentiment,
            Self::MemeEngagement => row.meme_engagement,
        }
    }

    /// Column name in the analysis-ready panel.
    pub fn column(self) -> &'static str {
        match self {
            Self::SentimentScore => "nyt_sentiment",
            Self::MeanPos => "nyt_pos_share",
            Self::MeanNeg => "nyt_neg_share",
            Self::NonNeutralShare => "nyt_non_neutral_share",
            Self::NytMention => "NYT_mention",
            Self::NumMemes => "num_memes",
            Self::MeanMemeSentiment => "mean_meme_sentiment",
            Self::MemeEngagement => "meme_engagement",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One row of the balanced, analysis-ready panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub base: JoinedRow,
    pub log1p_meme_volume: f64,
    pub log1p_nyt_mention: f64,
    /// Null when no meme week reported engagement.
    pub log1p_meme_engagement: Option<f64>,
    pub iso_year: i32,
    pub iso_week: u32,
    pub num_memes_z: f64,
    pub num_memes_rel: f64,
    lags: [[Option<f64>; LAG_DEPTH]; LagSource::COUNT],
}

impl PanelRow {
    pub(crate) fn new(base: JoinedRow) -> Self {
        Self {
            base,
            log1p_meme_volume: 0.0,
            log1p_nyt_mention: 0.0,
            log1p_meme_engagement: None,
            iso_year: 0,
            iso_week: 0,
            num_memes_z: 0.0,
            num_memes_rel: 1.0,
            lags: [[None; LAG_DEPTH]; LagSource::COUNT],
        }
    }

    /// Value of `source` `k` weeks earlier (1-based). `None` when absent or
    /// `k` is out of range.
    pub fn lag(&self, source: LagSource, k: usize) -> Option<f64> {
        if k == 0 || k > LAG_DEPTH {
            return None;
        }
        self.lags[source.index()][k - 1]
    }

    pub(crate) fn set_lag(&mut self, source: LagSource, k: usize, value: Option<f64>) {
        if (1..=LAG_DEPTH).contains(&k) {
            self.lags[source.index()][k - 1] = value;
        }
    }

    /// CSV header of the analysis-ready panel.
    pub fn header() -> Vec<String> {
        let mut cols: Vec<String> = [
            "company",
            "week_start",
            "nyt_pos_share",
            "nyt_neu_share",
            "nyt_neg_share",
            "NYT_mention",
            "nyt_sentiment",
            "nyt_non_neutral_share",
            "num_memes",
            "mean_meme_sentiment",
            "meme_engagement",
            "meme_spike",
            "log1p_meme_volume",
            "log1p_nyt_mention",
            "log1p_meme_engagement",
            "iso_year",
            "iso_week",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for source in LagSource::ALL {
            for k in 1..=LAG_DEPTH {
                cols.push(format!("{}_L{}", source.column(), k));
            }
        }
        cols.push("num_memes_z".into());
        cols.push("num_memes_rel".into());
        cols
    }

    /// Field values in `header()` order; null values are empty strings.
    pub fn record(&self) -> Vec<String> {
        let b = &self.base;
        let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let mut out = vec![
            b.company.to_string(),
            b.week_start.format("%Y-%m-%d").to_string(),
            opt(b.mean_pos),
            opt(b.mean_neu),
            opt(b.mean_neg),
            b.nyt_mention.to_string(),
            opt(b.sentiment_score),
            opt(b.non_neutral_share),
            b.num_memes.to_string(),
            opt(b.mean_meme_sentiment),
            opt(b.meme_engagement),
            b.meme_spike.map(|s| s.to_string()).unwrap_or_default(),
            self.log1p_meme_volume.to_string(),
            self.log1p_nyt_mention.to_string(),
            opt(self.log1p_meme_engagement),
            self.iso_year.to_string(),
            self.iso_week.to_string(),
        ];
        for row in &self.lags {
            out.extend(row.iter().map(|v| opt(*v)));
        }
        out.push(self.num_memes_z.to_string());
        out.push(self.num_memes_rel.to_string());
        out
    }
}
