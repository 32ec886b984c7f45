/// Crawler configuration loader - parses sealevel.toml
///
/// Every setting has a compiled-in default, so the crawler runs with no
/// configuration file at all. A `sealevel.toml` in the working directory
/// overrides individual fields without recompiling the service.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::CrawlError;
use crate::station::QUARRY_BAY;
use crate::validate::Bands;

/// Default configuration file, relative to the working directory.
pub const CONFIG_FILE: &str = "sealevel.toml";

/// Settings for one crawl run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    /// HKO station code to extract from the feed.
    pub station_code: String,
    /// Directory receiving CSV, JSON and report files.
    pub output_dir: PathBuf,
    /// Upper bound on a single HTTP request, in seconds.
    pub timeout_secs: u64,
    /// Earliest accepted year (inclusive).
    pub first_year: i32,
    /// Latest accepted year (inclusive).
    pub last_year: i32,
    /// Lowest plausible annual mean sea level, in metres.
    pub min_level_m: f64,
    /// Highest plausible annual mean sea level, in metres.
    pub max_level_m: f64,
    /// Replaces the built-in candidate endpoints when non-empty.
    pub candidate_urls: Vec<String>,
    /// Optional log file; console only when absent.
    pub log_file: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            station_code: QUARRY_BAY.code.to_string(),
            output_dir: PathBuf::from("."),
            timeout_secs: 30,
            first_year: QUARRY_BAY.first_year,
            last_year: 2024,
            min_level_m: 1.0,
            max_level_m: 2.0,
            candidate_urls: Vec::new(),
            log_file: None,
        }
    }
}

impl CrawlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bands(&self) -> Bands {
        Bands {
            years: self.first_year..=self.last_year,
            level_m: self.min_level_m..=self.max_level_m,
        }
    }

    /// Number of years in the operating range, used for coverage figures.
    pub fn expected_years(&self) -> usize {
        (self.last_year - self.first_year + 1).max(0) as usize
    }

    fn check(self) -> Result<Self, CrawlError> {
        if self.station_code.trim().is_empty() {
            return Err(CrawlError::Config("station_code must not be empty".to_string()));
        }
        if self.first_year > self.last_year {
            return Err(CrawlError::Config(format!(
                "first_year {} is after last_year {}",
                self.first_year, self.last_year
            )));
        }
        if !(self.min_level_m < self.max_level_m) {
            return Err(CrawlError::Config(format!(
                "min_level_m {} must be below max_level_m {}",
                self.min_level_m, self.max_level_m
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CrawlError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(self)
    }
}

/// Parses configuration text. Fields left out keep their defaults.
pub fn parse_config(contents: &str) -> Result<CrawlConfig, CrawlError> {
    let config: CrawlConfig = toml::from_str(contents)
        .map_err(|e| CrawlError::Config(format!("Failed to parse configuration: {}", e)))?;
    config.check()
}

/// Loads configuration from `path`, falling back to the compiled-in
/// defaults when the file does not exist.
pub fn load_config_from(path: &Path) -> Result<CrawlConfig, CrawlError> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(CrawlConfig::default()),
        Err(e) => Err(CrawlError::Config(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Loads `sealevel.toml` from the current working directory.
pub fn load_config() -> Result<CrawlConfig, CrawlError> {
    load_config_from(Path::new(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_quarry_bay_record() {
        let config = CrawlConfig::default();
        assert_eq!(config.station_code, "QUB");
        assert_eq!(config.expected_years(), 71);
        assert!(config.bands().years.contains(&1954));
        assert!(config.bands().years.contains(&2024));
        assert!(config.bands().level_m.contains(&1.28));
        assert!(config.candidate_urls.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = parse_config("output_dir = \"data\"\ntimeout_secs = 5\n").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.first_year, 1954);
        assert_eq!(config.max_level_m, 2.0);
    }

    #[test]
    fn test_candidate_override_parses() {
        let config = parse_config(
            r#"candidate_urls = ["http://localhost:1/a.xml", "http://localhost:1/b.xml"]"#,
        )
        .unwrap();
        assert_eq!(config.candidate_urls.len(), 2);
    }

    #[test]
    fn test_inverted_bands_rejected() {
        let result = parse_config("first_year = 2030\nlast_year = 2000\n");
        assert!(matches!(result, Err(CrawlError::Config(_))));

        let result = parse_config("min_level_m = 2.5\n");
        assert!(matches!(result, Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = parse_config("stations = 3\n");
        assert!(matches!(result, Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config_from(Path::new("definitely/not/here/sealevel.toml")).unwrap();
        assert_eq!(config, CrawlConfig::default());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        // Run from the package root, where sealevel.toml lives.
        let config = load_config().expect("shipped sealevel.toml should parse");
        assert_eq!(config.station_code, "QUB");
        assert_eq!(config.first_year, 1954);
        assert_eq!(config.last_year, 2024);
    }
}
