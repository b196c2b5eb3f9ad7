//! Topicality Core: company keys, week arithmetic, configuration, errors.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod key;
pub mod week;

pub use capabilities::HostCapabilities;
pub use config::{default_min_date, DataPaths, PanelConfig, ACCEPTED_YEARS, DEFAULT_MAX_SENTENCES, LAG_DEPTH};
pub use error::{Error, FileFailure, Result};
pub use key::{simple_key, CompanyKey};
pub use week::{iso_year_week, monday_range, week_start};
