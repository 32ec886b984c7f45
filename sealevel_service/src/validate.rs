/// Validation and cleaning of parsed tide rows.
///
/// Turns the parser's untyped `RawEntry` tokens into typed `Record`s,
/// discarding rows that cannot be trusted instead of failing the run. The
/// discards are reported back as a `ValidationWarning` so the crawler can
/// log them and count them in the metadata.

use std::fmt;
use std::ops::RangeInclusive;

use crate::model::{Dataset, RawEntry, Record};

/// Accepted year range and plausible mean sea level band, both inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub years: RangeInclusive<i32>,
    pub level_m: RangeInclusive<f64>,
}

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    MissingYear,
    InvalidYear(String),
    MissingLevel,
    NonNumericLevel(String),
    YearOutOfRange,
    LevelOutOfBand(f64),
}

/// A dropped row, identified by its position in the parser output.
#[derive(Debug, Clone, PartialEq)]
pub struct Discard {
    pub index: usize,
    pub year: Option<i32>,
    pub reason: DiscardReason,
}

impl fmt::Display for Discard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.index)?;
        if let Some(year) = self.year {
            write!(f, " ({})", year)?;
        }
        match &self.reason {
            DiscardReason::MissingYear => write!(f, ": missing year"),
            DiscardReason::InvalidYear(token) => write!(f, ": invalid year '{}'", token),
            DiscardReason::MissingLevel => write!(f, ": missing mean sea level"),
            DiscardReason::NonNumericLevel(token) => {
                write!(f, ": non-numeric mean sea level '{}'", token)
            }
            DiscardReason::YearOutOfRange => write!(f, ": year outside operating range"),
            DiscardReason::LevelOutOfBand(level) => {
                write!(f, ": mean sea level {} m outside plausible band", level)
            }
        }
    }
}

/// Non-fatal outcome of cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationWarning {
    pub discarded: Vec<Discard>,
    /// Years that appeared more than once; the later row was kept.
    pub duplicate_years: Vec<i32>,
}

impl ValidationWarning {
    pub fn is_clean(&self) -> bool {
        self.discarded.is_empty() && self.duplicate_years.is_empty()
    }
}

/// Cleaned dataset plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub warning: ValidationWarning,
}

/// Converts raw rows to a chronologically ordered, band-checked dataset.
///
/// Rows with a missing or non-numeric year or mean sea level are dropped,
/// as are rows outside `bands`. When a year repeats, the later row in input
/// order wins. Tidal components are optional and never cause a discard.
pub fn clean(entries: &[RawEntry], bands: &Bands) -> Cleaned {
    let mut warning = ValidationWarning::default();
    let mut accepted: Vec<Record> = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        match to_record(entry, bands) {
            Ok(record) => {
                if accepted.iter().any(|r| r.year == record.year)
                    && !warning.duplicate_years.contains(&record.year)
                {
                    warning.duplicate_years.push(record.year);
                }
                accepted.push(record);
            }
            Err((year, reason)) => warning.discarded.push(Discard { index, year, reason }),
        }
    }

    warning.duplicate_years.sort_unstable();

    Cleaned {
        dataset: Dataset::new(accepted),
        warning,
    }
}

fn to_record(entry: &RawEntry, bands: &Bands) -> Result<Record, (Option<i32>, DiscardReason)> {
    let year_token = non_empty(entry.year.as_deref()).ok_or((None, DiscardReason::MissingYear))?;
    let year = parse_year(year_token)
        .ok_or_else(|| (None, DiscardReason::InvalidYear(year_token.to_string())))?;

    let level_token = non_empty(entry.mean_sea_level.as_deref())
        .ok_or((Some(year), DiscardReason::MissingLevel))?;
    let level = parse_level(level_token).ok_or_else(|| {
        (Some(year), DiscardReason::NonNumericLevel(level_token.to_string()))
    })?;

    if !bands.years.contains(&year) {
        return Err((Some(year), DiscardReason::YearOutOfRange));
    }
    if !bands.level_m.contains(&level) {
        return Err((Some(year), DiscardReason::LevelOutOfBand(level)));
    }

    Ok(Record {
        year,
        mean_sea_level_m: level,
        mean_higher_high_water_m: optional_level(&entry.mean_higher_high_water),
        mean_lower_high_water_m: optional_level(&entry.mean_lower_high_water),
        mean_higher_low_water_m: optional_level(&entry.mean_higher_low_water),
        mean_lower_low_water_m: optional_level(&entry.mean_lower_low_water),
    })
}

fn non_empty(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}

/// Accepts `1954` and the float spelling `1954.0` some feeds emit.
fn parse_year(token: &str) -> Option<i32> {
    if let Ok(year) = token.parse::<i32>() {
        return Some(year);
    }
    let value: f64 = token.parse().ok()?;
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

fn parse_level(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn optional_level(token: &Option<String>) -> Option<f64> {
    non_empty(token.as_deref()).and_then(parse_level)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
