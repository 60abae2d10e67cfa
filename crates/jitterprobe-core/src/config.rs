//! Entry config file parser.
//!
//! Every top-level table is one entry, keyed by the table name:
//!
//! ```toml
//! [example]
//! request = { url = "https://example.com/", timeout_ms = 5000 }
//! response = { matcher = "Example Domain" }
//! ```
//!
//! Entries are validated one at a time. A malformed entry is rejected on its
//! own and reported in [`EntrySet::rejected`]; the rest still load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Entry, RequestSpec, ResponseSpec};

/// The body of one entry table, before the key is attached.
#[derive(Debug, Deserialize)]
struct EntryTable {
    request: RequestSpec,
    response: ResponseSpec,
}

/// An entry that failed to parse or validate.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RejectedEntry {
    pub key: String,
    pub reason: String,
}

/// The valid entries of one config document, plus the ones left out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntrySet {
    pub entries: Vec<Entry>,
    pub rejected: Vec<RejectedEntry>,
}

impl EntrySet {
    /// Load entries from a file.
    ///
    /// A missing file is an empty set, not an error.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, no entries");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&content)
    }

    /// Parse a TOML document into entries.
    ///
    /// Fails only when the document itself is not valid TOML.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut set = Self::default();

        for (key, value) in table {
            match parse_entry(&key, value) {
                Ok(entry) => set.entries.push(entry),
                Err(e) => {
                    warn!(%key, error = %e, "rejecting config entry");
                    set.rejected.push(RejectedEntry {
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

fn parse_entry(key: &str, value: toml::Value) -> ConfigResult<Entry> {
    if !value.is_table() {
        return Err(ConfigError::invalid(key, "expected a table"));
    }
    let table: EntryTable = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::invalid(key, e.message()))?;
    let entry = Entry::new(key, table.request, table.response);
    validate(&entry)?;
    Ok(entry)
}

/// Check the fields serde cannot: URL, method, headers, pattern, numbers.
pub fn validate(entry: &Entry) -> ConfigResult<()> {
    let key = entry.key.as_str();
    let req = &entry.request;

    let url = url::Url::parse(&req.url)
        .map_err(|e| ConfigError::invalid(key, format!("bad url '{}': {e}", req.url)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            key,
            format!("unsupported url scheme '{}'", url.scheme()),
        ));
    }

    http::Method::from_bytes(req.method.as_bytes())
        .map_err(|_| ConfigError::invalid(key, format!("bad method '{}'", req.method)))?;

    let pairs = req
        .header_pairs()
        .map_err(|line| ConfigError::invalid(key, format!("bad header '{line}'")))?;
    for (name, value) in pairs {
        http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::invalid(key, format!("bad header name '{name}'")))?;
        http::HeaderValue::from_str(value)
            .map_err(|_| ConfigError::invalid(key, format!("bad value for header '{name}'")))?;
    }

    if req.timeout_ms == 0 {
        return Err(ConfigError::invalid(key, "timeout_ms must be positive"));
    }
    // A negative centre is allowed; the sampled delay is floored anyway.
    if !req.interval_ms_centre.is_finite() {
        return Err(ConfigError::invalid(key, "interval_ms_centre must be finite"));
    }
    if !req.interval_ms_scale.is_finite() || req.interval_ms_scale < 0.0 {
        return Err(ConfigError::invalid(
            key,
            "interval_ms_scale must be a non-negative number",
        ));
    }

    regex::Regex::new(&entry.response.matcher)
        .map_err(|e| ConfigError::invalid(key, format!("bad matcher: {e}")))?;

    Ok(())
}
