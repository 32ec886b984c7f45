/// Plain-text summary report for a persisted sea level dataset.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analysis::trend::{
    MIN_YEARS_PER_DECADE, SeaLevelStats, decadal_averages, recent_records, sea_level_trend,
    tidal_range_trend, tidal_ranges, year_over_year_changes,
};
use crate::model::{CrawlError, Dataset};
use crate::persist::{create_product_file, timestamp_tag};
use crate::station::Station;

/// First year of the "recent changes" section.
pub const RECENT_SINCE: i32 = 2020;

/// First year of the recent-trend window.
pub const RECENT_TREND_SINCE: i32 = 1995;

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

/// Renders the report. `expected_years` is the size of the configured
/// operating range, used for the completeness figures. `None` for an
/// empty dataset.
pub fn render_report(
    dataset: &Dataset,
    station: &Station,
    expected_years: usize,
    generated_at: &DateTime<Local>,
) -> Option<String> {
    let stats = SeaLevelStats::compute(dataset)?;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} - {} Station Sea Level Analysis Report",
        station.source, station.name
    );
    let _ = writeln!(out, "{}\n", "=".repeat(70));
    let _ = writeln!(out, "Report Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(
        out,
        "Data Period: {}-{} ({} years)",
        stats.first_year, stats.last_year, stats.count
    );
    let _ = writeln!(out, "Station: {} ({})\n", station.name, station.code);

    section(&mut out, "BASIC STATISTICS");
    let _ = writeln!(out, "Mean Sea Level Average: {:.3} m", stats.mean_m);
    let _ = writeln!(out, "Standard Deviation: {:.3} m", stats.std_dev_m);
    let _ = writeln!(out, "Maximum: {:.3} m (Year: {})", stats.max_m, stats.max_year);
    let _ = writeln!(out, "Minimum: {:.3} m (Year: {})", stats.min_m, stats.min_year);
    let _ = writeln!(out, "Range: {:.3} m\n", stats.range_m());

    section(&mut out, "TREND ANALYSIS");
    match sea_level_trend(dataset, None) {
        Some(fit) => {
            let span = (stats.last_year - stats.first_year + 1) as f64;
            let _ = writeln!(out, "Linear trend slope: {:.6} m/year", fit.slope);
            let _ = writeln!(
                out,
                "Rate of change: {:.2} cm/decade ({:.2} mm/year)",
                fit.cm_per_decade(),
                fit.mm_per_year()
            );
            let _ = writeln!(
                out,
                "Total change over {} years: {:.2} cm",
                span,
                fit.change_over_cm(span)
            );
            let _ = writeln!(
                out,
                "Fitted level in {}: {:.3} m",
                stats.last_year,
                fit.value_at(stats.last_year as f64)
            );
        }
        None => {
            let _ = writeln!(out, "Not enough records for a trend");
        }
    }
    if let Some(recent) = sea_level_trend(dataset, Some(RECENT_TREND_SINCE)) {
        let _ = writeln!(
            out,
            "Trend since {}: {:.2} cm/decade",
            RECENT_TREND_SINCE,
            recent.cm_per_decade()
        );
    }
    out.push('\n');

    let recent = recent_records(dataset, RECENT_SINCE);
    section(
        &mut out,
        &format!("RECENT CHANGES ({}-{})", RECENT_SINCE, stats.last_year),
    );
    for r in &recent {
        let _ = writeln!(out, "{}: {:.3} m", r.year, r.mean_sea_level_m);
    }
    if let (Some(first), Some(last)) = (recent.first(), recent.last()) {
        if recent.len() >= 2 {
            let _ = writeln!(
                out,
                "\nChange {}-{}: {:.1} cm",
                first.year,
                last.year,
                (last.mean_sea_level_m - first.mean_sea_level_m) * 100.0
            );
        }
    }
    out.push('\n');

    let changes = year_over_year_changes(dataset);
    section(&mut out, "YEAR-TO-YEAR CHANGES");
    if changes.is_empty() {
        let _ = writeln!(out, "Not enough records for year-to-year changes");
    } else {
        let rises = changes.iter().filter(|c| c.1 > 0.0).count();
        let drops = changes.iter().filter(|c| c.1 < 0.0).count();
        let _ = writeln!(out, "Rising years: {}, falling years: {}", rises, drops);
        // First occurrence wins on ties.
        let mut largest_rise = changes[0];
        let mut largest_drop = changes[0];
        for &c in &changes {
            if c.1 > largest_rise.1 {
                largest_rise = c;
            }
            if c.1 < largest_drop.1 {
                largest_drop = c;
            }
        }
        let _ = writeln!(
            out,
            "Largest rise: {:+.1} cm ({})",
            largest_rise.1 * 100.0,
            largest_rise.0
        );
        let _ = writeln!(
            out,
            "Largest drop: {:+.1} cm ({})",
            largest_drop.1 * 100.0,
            largest_drop.0
        );
    }
    out.push('\n');

    section(&mut out, "DECADAL AVERAGES");
    for d in decadal_averages(dataset, MIN_YEARS_PER_DECADE) {
        let _ = writeln!(
            out,
            "{}s: {:.3} ± {:.3} m ({} years)",
            d.decade, d.mean_m, d.std_dev_m, d.years
        );
    }
    out.push('\n');

    let ranges = tidal_ranges(dataset);
    section(&mut out, "TIDAL RANGE");
    if let Some(first) = ranges.first() {
        let mean = ranges.iter().map(|t| t.total_m).sum::<f64>() / ranges.len() as f64;
        let _ = writeln!(out, "Mean tidal range (MHHW - MLLW): {:.3} m", mean);
        let _ = writeln!(out, "First year with extremes: {}", first.year);
        if let Some(fit) = tidal_range_trend(&ranges) {
            let _ = writeln!(out, "Tidal range trend: {:.3} m/decade", fit.slope * 10.0);
        }
    } else {
        let _ = writeln!(out, "No years with complete tidal extremes");
    }
    out.push('\n');

    let completeness = if expected_years == 0 {
        0.0
    } else {
        stats.count as f64 / expected_years as f64 * 100.0
    };
    section(&mut out, "DATA QUALITY");
    let _ = writeln!(out, "Total records: {}", stats.count);
    let complete = dataset
        .records()
        .iter()
        .filter(|r| r.has_tidal_extremes())
        .count();
    let _ = writeln!(out, "Complete tidal data: {} years", complete);
    let _ = writeln!(out, "Data completeness: {:.1}%", completeness);
    let _ = writeln!(
        out,
        "Missing years: {}\n",
        expected_years.saturating_sub(stats.count)
    );

    let _ = writeln!(out, "Note: {}", station.note);
    Some(out)
}

pub fn report_path(dir: &Path, at: &DateTime<Local>) -> PathBuf {
    dir.join(format!("HKO_SeaLevel_Analysis_Report_{}.txt", timestamp_tag(at)))
}

/// Writes `report` to a new timestamped file in `dir`.
pub fn write_report(dir: &Path, report: &str, at: &DateTime<Local>) -> Result<PathBuf, CrawlError> {
    let path = report_path(dir, at);
    let mut writer = create_product_file(&path)?;
    writer
        .write_all(report.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| CrawlError::io(&path, e))?;
    Ok(path)
}
