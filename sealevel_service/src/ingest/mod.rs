/// Data acquisition for the sea level crawler.
///
/// Submodules, in pipeline order:
/// - `endpoint` — candidate feed URLs and the probe-until-parseable resolver.
/// - `fetch`    — blocking HTTP GET with a bounded timeout.
/// - `hko`      — HKO yearly tide payload parsing (JSON, XML, HTML-wrapped).
/// - `fixtures` (test only) — representative payloads.

pub mod endpoint;
pub mod fetch;
pub mod hko;

#[cfg(test)]
pub(crate) mod fixtures;
