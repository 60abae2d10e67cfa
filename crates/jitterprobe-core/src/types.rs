//! Shared types used across jitterprobe crates.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default HTTP method for a probe request.
pub const DEFAULT_METHOD: &str = "GET";
/// Default per-request timeout (15 s).
pub const DEFAULT_TIMEOUT_MS: u64 = 15 * 1000;
/// Default centre of the probe interval distribution (5 min).
pub const DEFAULT_INTERVAL_MS_CENTRE: f64 = 5.0 * 60.0 * 1000.0;
/// Default spread of the probe interval distribution (1 min).
pub const DEFAULT_INTERVAL_MS_SCALE: f64 = 60.0 * 1000.0;

/// A named endpoint to probe.
///
/// Entries are immutable values. A reconfiguration replaces them wholesale;
/// a probe that is already in flight keeps the version it started with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Unique key, taken from the TOML table name.
    pub key: String,
    pub request: RequestSpec,
    pub response: ResponseSpec,
}

impl Entry {
    pub fn new(key: impl Into<String>, request: RequestSpec, response: ResponseSpec) -> Self {
        Self {
            key: key.into(),
            request,
            response,
        }
    }
}

/// How to issue the probe request and how often.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    /// Raw `"Name: Value"` header lines.
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Mean of the delay before each probe, in milliseconds.
    #[serde(default = "default_interval_ms_centre")]
    pub interval_ms_centre: f64,
    /// Standard deviation of the delay before each probe, in milliseconds.
    #[serde(default = "default_interval_ms_scale")]
    pub interval_ms_scale: f64,
}

impl RequestSpec {
    /// A GET request to `url` with every other field at its default.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: default_method(),
            url: url.into(),
            headers: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interval_ms_centre: DEFAULT_INTERVAL_MS_CENTRE,
            interval_ms_scale: DEFAULT_INTERVAL_MS_SCALE,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Split the configured header lines into `(name, value)` pairs.
    ///
    /// Returns the first malformed line on failure.
    pub fn header_pairs(&self) -> Result<Vec<(&str, &str)>, &str> {
        self.headers
            .iter()
            .map(|line| parse_header(line).ok_or(line.as_str()))
            .collect()
    }
}

/// What the response body must contain for a probe to count as a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseSpec {
    /// Regular expression searched for anywhere in the body.
    pub matcher: String,
}

impl ResponseSpec {
    pub fn new(matcher: impl Into<String>) -> Self {
        Self {
            matcher: matcher.into(),
        }
    }
}

/// Outcome of one completed probe cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeReport {
    pub key: String,
    /// `false` both for a genuine non-match and for a failed probe.
    pub matched: bool,
    pub timestamp: DateTime<Utc>,
}

impl ProbeReport {
    pub fn new(key: impl Into<String>, matched: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            matched,
            timestamp,
        }
    }
}

/// Parse a `"Name: Value"` header line, splitting on the first colon.
///
/// Both halves are trimmed. Returns `None` when there is no colon or the
/// name is empty.
pub fn parse_header(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_interval_ms_centre() -> f64 {
    DEFAULT_INTERVAL_MS_CENTRE
}

fn default_interval_ms_scale() -> f64 {
    DEFAULT_INTERVAL_MS_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_splits_on_first_colon() {
        assert_eq!(
            parse_header("Authorization: Bearer a:b"),
            Some(("Authorization", "Bearer a:b"))
        );
        assert_eq!(parse_header("  X-Empty :  "), Some(("X-Empty", "")));
    }

    #[test]
    fn parse_header_rejects_malformed() {
        assert_eq!(parse_header("no colon here"), None);
        assert_eq!(parse_header(": value"), None);
    }

    #[test]
    fn header_pairs_reports_bad_line() {
        let mut req = RequestSpec::get("http://localhost/");
        req.headers = vec!["Accept: */*".to_string(), "broken".to_string()];
        assert_eq!(req.header_pairs(), Err("broken"));

        req.headers.pop();
        assert_eq!(req.header_pairs(), Ok(vec![("Accept", "*/*")]));
    }

    #[test]
    fn get_uses_defaults() {
        let req = RequestSpec::get("http://localhost/");
        assert_eq!(req.method, "GET");
        assert_eq!(req.timeout(), Duration::from_secs(15));
        assert_eq!(req.interval_ms_centre, 300_000.0);
        assert_eq!(req.interval_ms_scale, 60_000.0);
    }
}
