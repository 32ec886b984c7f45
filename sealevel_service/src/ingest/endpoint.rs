/// Endpoint resolution for the HKO yearly tide feed.
///
/// The feed location is an external, unversioned dependency, so the
/// crawler keeps an ordered list of candidate URLs and uses the first one
/// that answers with content the parser can read for the station.

use crate::ingest::hko::parse_payload;
use crate::model::{CrawlError, ProbeFailure, RawEntry};
use crate::station::Station;

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

const HKO_TIDE_BASE_URL: &str = "https://www.hko.gov.hk/cis/aws/tide";

/// Builds the ordered candidate list for a station.
///
/// A non-empty `overrides` list (from configuration) replaces the built-in
/// candidates entirely.
///
/// # Example
/// ```
/// use sealevel_service::ingest::endpoint::candidate_urls;
/// use sealevel_service::station::QUARRY_BAY;
///
/// let urls = candidate_urls(&QUARRY_BAY, &[]);
/// assert!(urls[0].ends_with("yearly_TIDE.xml"));
/// ```
pub fn candidate_urls(station: &Station, overrides: &[String]) -> Vec<String> {
    if !overrides.is_empty() {
        return overrides.to_vec();
    }
    vec![
        format!("{}/yearly_TIDE.xml", HKO_TIDE_BASE_URL),
        format!(
            "{}/yearly_TIDE.xml?stn={}",
            HKO_TIDE_BASE_URL,
            urlencoding::encode(station.code)
        ),
    ]
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The first candidate that produced parseable content.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub url: String,
    pub entries: Vec<RawEntry>,
}

/// Probes `candidates` in order with `fetch`, stopping at the first one
/// whose body parses into at least one row for `station_code`.
///
/// # Errors
/// `CrawlError::Resolution` listing every attempt when no candidate works
/// (or the list is empty).
pub fn resolve_source<F>(
    candidates: &[String],
    station_code: &str,
    mut fetch: F,
) -> Result<ResolvedSource, CrawlError>
where
    F: FnMut(&str) -> Result<String, CrawlError>,
{
    let mut attempts = Vec::new();

    for url in candidates {
        let probe = fetch(url).and_then(|body| parse_payload(&body, station_code));
        match probe {
            Ok(entries) => {
                return Ok(ResolvedSource {
                    url: url.clone(),
                    entries,
                });
            }
            Err(error) => attempts.push(ProbeFailure {
                url: url.clone(),
                error,
            }),
        }
    }

    Err(CrawlError::Resolution { attempts })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
