/// Blocking HTTP fetcher for the HKO tide feed.
///
/// One GET per call, bounded by the configured timeout. Anything other
/// than an HTTP 200 with a readable body is a `CrawlError::Transport`.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER};
use std::time::Duration;

use crate::model::CrawlError;

/// HKO rejects requests without a browser-like user agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Page that links to the yearly tide feed.
pub const REFERER_URL: &str = "https://www.hko.gov.hk/en/cis/yearlyTide.htm";

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, application/xml, text/xml, text/html, */*"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| CrawlError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Fetcher { client })
    }

    /// Performs a single GET and returns the body on HTTP 200.
    pub fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CrawlError::Transport {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        response.text().map_err(|e| transport_error(url, &e))
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> CrawlError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "unreadable body"
    } else {
        "request failed"
    };
    CrawlError::Transport {
        url: url.to_string(),
        reason: format!("{}: {}", kind, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_builds_with_timeout() {
        assert!(Fetcher::new(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_closed_port_is_transport_error() {
        let fetcher = Fetcher::new(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/cis/aws/tide/yearly_TIDE.xml");
        match result {
            Err(CrawlError::Transport { url, reason }) => {
                assert!(url.contains("127.0.0.1:9"));
                assert!(!reason.is_empty());
            }
            other => panic!("expected Transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_url_is_transport_error() {
        let fetcher = Fetcher::new(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("not a url");
        assert!(matches!(result, Err(CrawlError::Transport { .. })));
    }
}
