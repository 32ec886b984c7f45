/// Flat-file persistence for crawled datasets.
///
/// Each crawl writes three new files, named with the run timestamp so a
/// run never overwrites an earlier one:
///   HKO_<code>_SeaLevel_Data_<YYYYMMDD_HHMMSS>.csv        — every column
///   HKO_<code>_MeanSeaLevel_Simple_<YYYYMMDD_HHMMSS>.csv  — year + MSL
///   HKO_<code>_SeaLevel_Metadata_<YYYYMMDD_HHMMSS>.json   — `Metadata`
///
/// The writes are independent: if the second one fails the first stays on
/// disk. The full CSV can be read back into identical `Record`s, which is
/// how the analysis binaries load "the latest data".

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::{CrawlError, Dataset, Metadata, Record};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub const FULL_CSV_HEADER: [&str; 6] = [
    "Year",
    "Mean_Sea_Level_m",
    "Mean_Higher_High_Water_m",
    "Mean_Lower_High_Water_m",
    "Mean_Higher_Low_Water_m",
    "Mean_Lower_Low_Water_m",
];

pub const SIMPLE_CSV_HEADER: [&str; 2] = ["Year", "Mean_Sea_Level_m"];

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// The three files one crawl run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFiles {
    pub full_csv: PathBuf,
    pub simple_csv: PathBuf,
    pub metadata_json: PathBuf,
}

impl OutputFiles {
    pub fn all(&self) -> [&Path; 3] {
        [&self.full_csv, &self.simple_csv, &self.metadata_json]
    }
}

pub fn timestamp_tag(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn full_csv_prefix(station_code: &str) -> String {
    format!("HKO_{}_SeaLevel_Data_", station_code)
}

pub fn output_paths(dir: &Path, station_code: &str, at: &DateTime<Local>) -> OutputFiles {
    let stamp = timestamp_tag(at);
    OutputFiles {
        full_csv: dir.join(format!("{}{}.csv", full_csv_prefix(station_code), stamp)),
        simple_csv: dir.join(format!("HKO_{}_MeanSeaLevel_Simple_{}.csv", station_code, stamp)),
        metadata_json: dir.join(format!("HKO_{}_SeaLevel_Metadata_{}.json", station_code, stamp)),
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Writes the full CSV, simplified CSV and metadata JSON for one run.
///
/// # Errors
/// `CrawlError::Io` naming the first path that could not be created or
/// written, including one left behind by a run in the same second.
pub fn persist(
    dir: &Path,
    dataset: &Dataset,
    metadata: &Metadata,
    at: &DateTime<Local>,
) -> Result<OutputFiles, CrawlError> {
    fs::create_dir_all(dir).map_err(|e| CrawlError::io(dir, e))?;

    let files = output_paths(dir, &metadata.station_code, at);
    write_new_file(&files.full_csv, &render_full_csv(dataset))?;
    write_new_file(&files.simple_csv, &render_simple_csv(dataset))?;

    let json = serde_json::to_string_pretty(metadata).map_err(|e| {
        CrawlError::io(&files.metadata_json, std::io::Error::other(e))
    })?;
    write_new_file(&files.metadata_json, &json)?;

    Ok(files)
}

/// Creates `path` (failing if it already exists) and writes `contents`.
fn write_new_file(path: &Path, contents: &str) -> Result<(), CrawlError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| CrawlError::io(path, e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| CrawlError::io(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| CrawlError::io(path, e))
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Full-precision CSV; `f64` display is the shortest exact representation,
/// so reading it back reproduces the same values.
pub fn render_full_csv(dataset: &Dataset) -> String {
    let mut out = FULL_CSV_HEADER.join(",");
    out.push('\n');
    for r in dataset.records() {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            r.year,
            r.mean_sea_level_m,
            optional_cell(r.mean_higher_high_water_m),
            optional_cell(r.mean_lower_high_water_m),
            optional_cell(r.mean_higher_low_water_m),
            optional_cell(r.mean_lower_low_water_m),
        ));
    }
    out
}

/// One row per year, mean sea level only.
pub fn render_simple_csv(dataset: &Dataset) -> String {
    let mut out = SIMPLE_CSV_HEADER.join(",");
    out.push('\n');
    for r in dataset.records() {
        out.push_str(&format!("{},{}\n", r.year, r.mean_sea_level_m));
    }
    out
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Parses a full (or simplified) CSV produced by `render_full_csv`.
///
/// Columns are located by header name, so the simplified file reads too
/// (with every tidal component `None`). Rows with an empty mean sea level
/// are skipped, matching how the renderers drop missing years.
pub fn parse_full_csv(text: &str) -> Result<Vec<Record>, String> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or("No header line found in CSV")?;
    let col_map: HashMap<&str, usize> = header_line
        .split(',')
        .enumerate()
        .map(|(idx, h)| (h.trim(), idx))
        .collect();

    let year_idx = *col_map.get("Year").ok_or("Missing Year column")?;
    let msl_idx = *col_map
        .get("Mean_Sea_Level_m")
        .ok_or("Missing Mean_Sea_Level_m column")?;

    let optional = |fields: &[&str], column: &str| -> Result<Option<f64>, String> {
        match col_map.get(column).and_then(|&idx| fields.get(idx)) {
            Some(cell) if !cell.trim().is_empty() => cell
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| format!("Invalid {} '{}': {}", column, cell, e)),
            _ => Ok(None),
        }
    };

    let mut records = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(',').collect();

        let year_cell = fields
            .get(year_idx)
            .ok_or_else(|| format!("Row {}: missing Year value", line_no + 1))?;
        let year: i32 = year_cell
            .trim()
            .parse()
            .map_err(|e| format!("Row {}: invalid Year '{}': {}", line_no + 1, year_cell, e))?;

        let mean_sea_level_m = match optional(&fields, "Mean_Sea_Level_m")? {
            Some(v) => v,
            None if fields.get(msl_idx).is_some() => continue,
            None => return Err(format!("Row {}: missing Mean_Sea_Level_m value", line_no + 1)),
        };

        records.push(Record {
            year,
            mean_sea_level_m,
            mean_higher_high_water_m: optional(&fields, "Mean_Higher_High_Water_m")?,
            mean_lower_high_water_m: optional(&fields, "Mean_Lower_High_Water_m")?,
            mean_higher_low_water_m: optional(&fields, "Mean_Higher_Low_Water_m")?,
            mean_lower_low_water_m: optional(&fields, "Mean_Lower_Low_Water_m")?,
        });
    }

    Ok(records)
}

/// Reads a persisted CSV back into a `Dataset`.
pub fn read_full_csv(path: &Path) -> Result<Dataset, CrawlError> {
    let text = fs::read_to_string(path).map_err(|e| CrawlError::io(path, e))?;
    let records = parse_full_csv(&text)
        .map_err(|e| CrawlError::Parse(format!("{}: {}", path.display(), e)))?;
    Ok(Dataset::new(records))
}

/// Newest full CSV for the station in `dir`, judged by the timestamp in
/// its file name. `Ok(None)` when the directory holds none.
pub fn latest_full_csv(dir: &Path, station_code: &str) -> Result<Option<PathBuf>, CrawlError> {
    let prefix = full_csv_prefix(station_code);
    let mut newest: Option<(String, PathBuf)> = None;

    for item in fs::read_dir(dir).map_err(|e| CrawlError::io(dir, e))? {
        let path = item.map_err(|e| CrawlError::io(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stamp) = name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_suffix(".csv"))
        else {
            continue;
        };
        if chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_err() {
            continue;
        }
        if newest.as_ref().is_none_or(|(best, _)| stamp > best.as_str()) {
            newest = Some((stamp.to_string(), path.clone()));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Opens `path` for writing a derived product, refusing to overwrite.
pub fn create_product_file(path: &Path) -> Result<BufWriter<File>, CrawlError> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(BufWriter::new)
        .map_err(|e| CrawlError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
