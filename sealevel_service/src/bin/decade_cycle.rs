//! Decade-Cycle Animation Plan
//!
//! Projects the newest persisted dataset onto a polar decade cycle (angle
//! = year within decade, radius = level) and writes the frame-by-frame
//! plan as JSON for a chart renderer.
//!
//! Usage:
//!   cargo run --bin decade_cycle               # normalized radius (1..5)
//!   cargo run --bin decade_cycle -- --rings    # one ring per decade

use chrono::Local;
use sealevel_service::analysis::decade_cycle::{
    FRAME_INTERVAL_MS, RadiusMode, plan_animation, write_plan,
};
use sealevel_service::analysis::load_latest;
use sealevel_service::config::load_config;
use sealevel_service::logging::{self, LogLevel, Stage};
use sealevel_service::station::find_station;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🌀 Decade-Cycle Animation Plan");
    println!("==============================\n");

    let args: Vec<String> = env::args().collect();
    let mode = if args.iter().any(|a| a == "--rings") {
        RadiusMode::DecadeRings
    } else {
        RadiusMode::Normalized
    };

    let config = load_config()?;
    logging::init_logger(LogLevel::Info, config.log_file.as_deref(), false);

    let station = find_station(&config.station_code)
        .ok_or_else(|| format!("Unknown station code '{}'", config.station_code))?;

    println!("📋 Loading latest data from {}...", config.output_dir.display());
    let (path, dataset) = load_latest(&config.output_dir, station.code)?;
    println!("✓ Loaded {} records from {}\n", dataset.len(), path.display());

    let plan = plan_animation(&dataset, mode)
        .ok_or_else(|| format!("{} contains no records", path.display()))?;
    let out = write_plan(&config.output_dir, station.code, &plan, &Local::now())?;
    logging::info(
        Stage::Analysis,
        Some(station.code),
        &format!("Animation plan saved: {}", out.display()),
    );

    let levels = dataset.levels();
    let min = levels.iter().map(|l| l.1).fold(f64::INFINITY, f64::min);
    let max = levels.iter().map(|l| l.1).fold(f64::NEG_INFINITY, f64::max);

    println!("Animation info:");
    println!("  Mode: {:?}", mode);
    if let (Some(first), Some(last)) = (dataset.first_year(), dataset.last_year()) {
        println!("  Data range: {}-{} ({} years)", first, last, dataset.len());
    }
    println!("  Sea level range: {:.3}-{:.3} m", min, max);
    println!("  Total frames: {}", plan.frames.len());
    println!("  Frame duration: {} ms", FRAME_INTERVAL_MS);
    println!("  Year labels: first, current, and every fifth year");

    Ok(())
}
