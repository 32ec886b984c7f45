/// Core data types for the Quarry Bay sea level crawler.
///
/// This module defines the shared domain model imported by all other modules:
/// the parser's untyped `RawEntry`, the validated `Record` / `Dataset`, the
/// derived `Metadata` and the `CrawlError` taxonomy. It holds no I/O.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::station::Station;

// ---------------------------------------------------------------------------
// Parser output
// ---------------------------------------------------------------------------

/// One untyped row as it appeared in the source payload.
///
/// Every token is optional: the source marks missing measurements with `***`
/// or leaves cells out entirely, and the validator decides what survives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub year: Option<String>,
    pub mean_sea_level: Option<String>,
    pub mean_higher_high_water: Option<String>,
    pub mean_lower_high_water: Option<String>,
    pub mean_higher_low_water: Option<String>,
    pub mean_lower_low_water: Option<String>,
}

impl RawEntry {
    /// Convenience constructor for the two tokens the pipeline requires.
    pub fn new(year: &str, mean_sea_level: &str) -> Self {
        RawEntry {
            year: Some(year.to_string()),
            mean_sea_level: Some(mean_sea_level.to_string()),
            ..RawEntry::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Validated records
// ---------------------------------------------------------------------------

/// Annual tide statistics for one year, in metres above Chart Datum.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub year: i32,
    pub mean_sea_level_m: f64,
    pub mean_higher_high_water_m: Option<f64>,
    pub mean_lower_high_water_m: Option<f64>,
    pub mean_higher_low_water_m: Option<f64>,
    pub mean_lower_low_water_m: Option<f64>,
}

impl Record {
    pub fn new(year: i32, mean_sea_level_m: f64) -> Self {
        Record {
            year,
            mean_sea_level_m,
            mean_higher_high_water_m: None,
            mean_lower_high_water_m: None,
            mean_higher_low_water_m: None,
            mean_lower_low_water_m: None,
        }
    }

    /// True when the high and low water extremes needed for a tidal range
    /// are both present.
    pub fn has_tidal_extremes(&self) -> bool {
        self.mean_higher_high_water_m.is_some() && self.mean_lower_low_water_m.is_some()
    }
}

/// Records ordered strictly ascending by year, at most one per year.
///
/// The only way to build one is `Dataset::new`, which enforces the ordering
/// and resolves duplicate years (the later record in input order replaces
/// the earlier one).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        let mut by_year: BTreeMap<i32, Record> = BTreeMap::new();
        for record in records {
            by_year.insert(record.year, record);
        }
        Dataset {
            records: by_year.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.records.first().map(|r| r.year)
    }

    pub fn last_year(&self) -> Option<i32> {
        self.records.last().map(|r| r.year)
    }

    pub fn get(&self, year: i32) -> Option<&Record> {
        self.records
            .binary_search_by_key(&year, |r| r.year)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Mean sea level series as `(year, metres)` pairs.
    pub fn levels(&self) -> Vec<(i32, f64)> {
        self.records
            .iter()
            .map(|r| (r.year, r.mean_sea_level_m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Summary written next to every persisted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub record_count: usize,
    pub year_range: (i32, i32),
    pub generated_at: DateTime<Local>,
    pub source: String,
    pub station_code: String,
    pub station_name: String,
    pub data_url: String,
    pub api_endpoint: String,
    pub units: String,
    pub note: String,
    pub discarded_count: usize,
    pub duplicate_years: Vec<i32>,
}

impl Metadata {
    /// Derives the metadata for a dataset. Returns `None` for an empty
    /// dataset, which has no year range.
    pub fn describe(
        dataset: &Dataset,
        station: &Station,
        api_endpoint: &str,
        discarded_count: usize,
        duplicate_years: Vec<i32>,
        generated_at: DateTime<Local>,
    ) -> Option<Metadata> {
        let year_range = (dataset.first_year()?, dataset.last_year()?);
        Some(Metadata {
            record_count: dataset.len(),
            year_range,
            generated_at,
            source: station.source.to_string(),
            station_code: station.code.to_string(),
            station_name: station.name.to_string(),
            data_url: station.page_url.to_string(),
            api_endpoint: api_endpoint.to_string(),
            units: station.units.to_string(),
            note: station.note.to_string(),
            discarded_count,
            duplicate_years,
        })
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// One failed probe of a candidate endpoint.
#[derive(Debug)]
pub struct ProbeFailure {
    pub url: String,
    pub error: CrawlError,
}

/// Errors that abort a crawl run.
#[derive(Debug)]
pub enum CrawlError {
    /// No candidate endpoint produced a parseable payload.
    Resolution { attempts: Vec<ProbeFailure> },
    /// Timeout, DNS/connect failure, or a non-200 response.
    Transport { url: String, reason: String },
    /// The payload contained no recognizable records.
    Parse(String),
    /// An output file could not be created or written.
    Io { path: PathBuf, source: std::io::Error },
    /// The configuration file or station selection is unusable.
    Config(String),
}

impl CrawlError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrawlError::Io {
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for CrawlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrawlError::Resolution { attempts } => {
                if attempts.is_empty() {
                    return write!(f, "Resolution error: no candidate endpoints configured");
                }
                write!(f, "Resolution error: no working endpoint among {} candidates", attempts.len())?;
                for attempt in attempts {
                    write!(f, "\n  - {}: {}", attempt.url, attempt.error)?;
                }
                Ok(())
            }
            CrawlError::Transport { url, reason } => {
                write!(f, "Transport error fetching {}: {}", url, reason)
            }
            CrawlError::Parse(msg) => write!(f, "Parse error: {}", msg),
            CrawlError::Io { path, source } => {
                write!(f, "IO error at {}: {}", path.display(), source)
            }
            CrawlError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for CrawlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrawlError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
