//! Sea Level Analysis Report
//!
//! Loads the newest persisted full CSV for the configured station and
//! writes a plain-text summary (statistics, trends, decadal averages,
//! tidal range, data quality) next to it.
//!
//! Usage:
//!   cargo run --bin analyze_sea_level
//!
//! Configuration:
//!   sealevel.toml in the working directory (optional)

use chrono::Local;
use sealevel_service::analysis::report::{render_report, write_report};
use sealevel_service::analysis::trend::{SeaLevelStats, sea_level_trend};
use sealevel_service::analysis::load_latest;
use sealevel_service::config::load_config;
use sealevel_service::logging::{self, LogLevel, Stage};
use sealevel_service::station::find_station;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🌊 Sea Level Analysis");
    println!("=====================\n");

    let config = load_config()?;
    logging::init_logger(LogLevel::Info, config.log_file.as_deref(), false);

    let station = find_station(&config.station_code)
        .ok_or_else(|| format!("Unknown station code '{}'", config.station_code))?;

    println!("📋 Loading latest data from {}...", config.output_dir.display());
    let (path, dataset) = load_latest(&config.output_dir, station.code)?;
    let stats = SeaLevelStats::compute(&dataset)
        .ok_or_else(|| format!("{} contains no records", path.display()))?;
    println!(
        "✓ Loaded {} years of data ({}-{}) from {}\n",
        stats.count,
        stats.first_year,
        stats.last_year,
        path.display()
    );

    println!("📝 Generating summary report...");
    let now = Local::now();
    let report = render_report(&dataset, station, config.expected_years(), &now)
        .ok_or("dataset is empty")?;
    let report_file = write_report(&config.output_dir, &report, &now)?;
    logging::info(
        Stage::Analysis,
        Some(station.code),
        &format!("Report saved: {}", report_file.display()),
    );

    println!("\n{}", "=".repeat(60));
    println!("✓ Analysis completed\n");
    println!("Key findings:");
    if let Some(fit) = sea_level_trend(&dataset, None) {
        let span = (stats.last_year - stats.first_year + 1) as f64;
        println!("  • Sea level changing at {:.2} cm per decade", fit.cm_per_decade());
        println!(
            "  • Change along trend over {} years: {:.1} cm",
            span,
            fit.change_over_cm(span)
        );
    }
    if let Some(latest) = dataset.records().last() {
        println!("  • Latest level ({}): {:.3} m", latest.year, latest.mean_sea_level_m);
    }
    println!(
        "  • Data coverage: {} of {} years",
        stats.count,
        config.expected_years()
    );

    Ok(())
}
