/// Crawl pipeline orchestration.
///
/// One run resolves the feed, fetches and parses it, cleans the rows into a
/// `Dataset` and persists it. Stages run strictly in sequence and the first
/// error aborts the run; only the validation warning is non-fatal.

use chrono::{DateTime, Local};

use crate::config::CrawlConfig;
use crate::ingest::endpoint::{candidate_urls, resolve_source};
use crate::ingest::fetch::Fetcher;
use crate::logging::{self, Stage};
use crate::model::{CrawlError, Metadata};
use crate::persist::{self, OutputFiles};
use crate::station::{Station, find_station};
use crate::validate::{ValidationWarning, clean};

/// Everything a successful run produced.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub source_url: String,
    pub files: OutputFiles,
    pub metadata: Metadata,
    pub warning: ValidationWarning,
}

/// Runs the crawl against the live feed for the configured station.
pub fn run_crawl(config: &CrawlConfig) -> Result<CrawlOutcome, CrawlError> {
    let station = find_station(&config.station_code).ok_or_else(|| {
        CrawlError::Config(format!("Unknown station code '{}'", config.station_code))
    })?;
    let fetcher = Fetcher::new(config.timeout())?;

    run_crawl_with(config, station, |url| fetcher.fetch(url), Local::now())
}

/// The crawl pipeline with the fetch function and run timestamp supplied
/// by the caller.
pub fn run_crawl_with<F>(
    config: &CrawlConfig,
    station: &Station,
    mut fetch: F,
    now: DateTime<Local>,
) -> Result<CrawlOutcome, CrawlError>
where
    F: FnMut(&str) -> Result<String, CrawlError>,
{
    let code = Some(station.code);

    let candidates = candidate_urls(station, &config.candidate_urls);
    logging::info(
        Stage::Resolve,
        code,
        &format!("Probing {} candidate endpoint(s)", candidates.len()),
    );

    let resolved = resolve_source(&candidates, station.code, |url| {
        logging::debug(Stage::Fetch, code, &format!("GET {}", url));
        let result = fetch(url);
        if let Err(ref e) = result {
            logging::debug(Stage::Fetch, code, &e.to_string());
        }
        result
    })?;
    logging::info(
        Stage::Parse,
        code,
        &format!("{} raw entries from {}", resolved.entries.len(), resolved.url),
    );

    let cleaned = clean(&resolved.entries, &config.bands());
    logging::log_validation_summary(station.code, cleaned.dataset.len(), &cleaned.warning);

    let expected = config.expected_years();
    if !cleaned.dataset.is_empty() && cleaned.dataset.len() < expected {
        logging::debug(
            Stage::Validate,
            code,
            &format!("{} of {} expected years present", cleaned.dataset.len(), expected),
        );
    }

    let metadata = Metadata::describe(
        &cleaned.dataset,
        station,
        &resolved.url,
        cleaned.warning.discarded.len(),
        cleaned.warning.duplicate_years.clone(),
        now,
    )
    .ok_or_else(|| {
        CrawlError::Parse(format!(
            "no usable records for {} after validation ({} entries discarded)",
            station.code,
            cleaned.warning.discarded.len()
        ))
    })?;

    let files = persist::persist(&config.output_dir, &cleaned.dataset, &metadata, &now)?;
    for path in files.all() {
        logging::info(Stage::Persist, code, &format!("Wrote {}", path.display()));
    }

    Ok(CrawlOutcome {
        source_url: resolved.url,
        files,
        metadata,
        warning: cleaned.warning,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use crate::station::QUARRY_BAY;
    use chrono::TimeZone;

    fn config_in(dir: &std::path::Path) -> CrawlConfig {
        CrawlConfig {
            output_dir: dir.to_path_buf(),
            candidate_urls: vec!["https://feed.test/yearly_TIDE.xml".to_string()],
            ..CrawlConfig::default()
        }
    }

    fn run_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 9, 18, 16, 32, 25).unwrap()
    }

    #[test]
    fn test_pipeline_persists_cleaned_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let outcome = run_crawl_with(
            &config,
            &QUARRY_BAY,
            |_| Ok(fixture_hko_json().to_string()),
            run_time(),
        )
        .expect("crawl should succeed");

        assert_eq!(outcome.source_url, "https://feed.test/yearly_TIDE.xml");
        assert_eq!(outcome.metadata.record_count, 3);
        assert_eq!(outcome.metadata.year_range, (1954, 2024));
        assert_eq!(outcome.metadata.discarded_count, 1);
        assert_eq!(outcome.warning.discarded[0].year, Some(1955));
        for path in outcome.files.all() {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_no_usable_records_is_parse_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let body = r#"{"tide":{"data":[{"code":"QUB","yearData":[["1954","9.99"],["1850","1.30"]]}]}}"#;

        let result = run_crawl_with(&config, &QUARRY_BAY, |_| Ok(body.to_string()), run_time());
        assert!(matches!(result, Err(CrawlError::Parse(_))), "got {:?}", result);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_resolution_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let result = run_crawl_with(
            &config,
            &QUARRY_BAY,
            |url| {
                Err(CrawlError::Transport {
                    url: url.to_string(),
                    reason: "connection failed".to_string(),
                })
            },
            run_time(),
        );
        assert!(matches!(result, Err(CrawlError::Resolution { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unknown_station_is_config_error() {
        let config = CrawlConfig {
            station_code: "XXX".to_string(),
            ..CrawlConfig::default()
        };
        assert!(matches!(run_crawl(&config), Err(CrawlError::Config(_))));
    }
}
