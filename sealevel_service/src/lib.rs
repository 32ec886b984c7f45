/// sealevel_service: HKO Quarry Bay annual mean sea level crawler.
///
/// # Module structure
///
/// ```text
/// sealevel_service
/// ├── model       — shared data types (RawEntry, Record, Dataset, Metadata, CrawlError)
/// ├── config      — crawl configuration loader (sealevel.toml)
/// ├── station     — tide station registry (Quarry Bay)
/// ├── logging     — stage-tagged console/file logging
/// ├── crawler     — sequential crawl pipeline
/// ├── validate    — record cleaning against year and level bands
/// ├── persist     — timestamped CSV/JSON output and CSV reading
/// ├── ingest
/// │   ├── endpoint — candidate feed URLs + first-working resolution
/// │   ├── fetch    — blocking HTTP fetcher
/// │   ├── hko      — JSON / XML / HTML-wrapped payload parsing
/// │   └── fixtures (test only) — representative feed payloads
/// └── analysis
///     ├── trend        — statistics, trends, decadal averages, tidal range
///     ├── report       — plain-text summary report
///     └── decade_cycle — polar decade-cycle projection + animation plan
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod crawler;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod persist;
pub mod station;
pub mod validate;
