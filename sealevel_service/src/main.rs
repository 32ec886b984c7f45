//! Quarry Bay Sea Level Crawler
//!
//! Single-shot crawl of the HKO yearly tide feed:
//! 1. Resolves a working feed endpoint from the candidate list
//! 2. Fetches and parses the station's annual records
//! 3. Validates years and levels, discarding unusable rows
//! 4. Writes timestamped full CSV, simplified CSV and metadata JSON
//!
//! Usage:
//!   cargo run --release
//!
//! Configuration:
//!   sealevel.toml in the working directory (optional, defaults otherwise)

use sealevel_service::config::load_config;
use sealevel_service::crawler::run_crawl;
use sealevel_service::logging::{self, LogLevel, Stage};

fn main() {
    println!("🌊 HKO Sea Level Crawler");
    println!("========================\n");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ {}\n", e);
            std::process::exit(1);
        }
    };
    logging::init_logger(LogLevel::Info, config.log_file.as_deref(), false);

    println!("📥 Crawling station {}...", config.station_code);
    println!("   Output directory: {}", config.output_dir.display());
    println!("   Timeout: {} s\n", config.timeout_secs);

    let outcome = match run_crawl(&config) {
        Ok(outcome) => outcome,
        Err(e) => {
            logging::log_crawl_failure(&config.station_code, "Crawl", &e);
            eprintln!("\n❌ Crawl failed: {}\n", e);
            std::process::exit(1);
        }
    };

    let meta = &outcome.metadata;
    println!("\n✓ Crawl complete");
    println!("   Source: {}", outcome.source_url);
    println!(
        "   Records: {} ({}-{})",
        meta.record_count, meta.year_range.0, meta.year_range.1
    );
    if !outcome.warning.is_clean() {
        println!(
            "   Discarded: {} rows, duplicate years replaced: {:?}",
            meta.discarded_count, meta.duplicate_years
        );
    }
    println!("\nGenerated files:");
    for (i, path) in outcome.files.all().iter().enumerate() {
        println!("   {}. {}", i + 1, path.display());
    }
    logging::debug(Stage::System, Some(config.station_code.as_str()), "Crawler exiting");
}
