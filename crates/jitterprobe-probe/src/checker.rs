//! HTTP probe logic.
//!
//! Issues the entry's request and searches the response body for the
//! entry's pattern. The response status is not part of the verdict: a 500
//! page that contains the pattern still matches.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Method};
use tracing::debug;

use jitterprobe_core::{Entry, parse_header};

use crate::Prober;
use crate::error::ProbeError;

const USER_AGENT: &str = concat!("jitterprobe/", env!("CARGO_PKG_VERSION"));

/// Probes entries over HTTP(S) with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    /// Create a prober with its own client.
    pub fn new() -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProbeError::Request)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, entry: &Entry) -> Result<bool, ProbeError> {
        let req = &entry.request;

        let method = Method::from_bytes(req.method.as_bytes())
            .map_err(|_| ProbeError::InvalidMethod(req.method.clone()))?;
        let pattern = Regex::new(&entry.response.matcher)?;

        let mut builder = self
            .client
            .request(method, req.url.as_str())
            .timeout(req.timeout());
        for line in &req.headers {
            let (name, value) =
                parse_header(line).ok_or_else(|| ProbeError::InvalidHeader(line.clone()))?;
            builder = builder.header(name, value);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(req.timeout_ms)
            } else {
                ProbeError::Request(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            debug!(key = %entry.key, %status, url = %req.url, "probe got non-2xx response");
        }

        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(req.timeout_ms)
            } else {
                ProbeError::Body(e)
            }
        })?;

        let matched = pattern.is_match(&body);
        debug!(
            key = %entry.key,
            %status,
            body_len = body.len(),
            matched,
            "probe response checked"
        );
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitterprobe_core::{RequestSpec, ResponseSpec};

    fn entry(url: &str, matcher: &str) -> Entry {
        let mut request = RequestSpec::get(url);
        request.timeout_ms = 500;
        Entry::new("test", request, ResponseSpec::new(matcher))
    }

    #[tokio::test]
    async fn invalid_method_fails_before_request() {
        let prober = HttpProber::new().unwrap();
        let mut e = entry("http://127.0.0.1:1/", ".");
        e.request.method = "NOT A METHOD".to_string();

        let err = prober.probe(&e).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidMethod(_)));
    }

    #[tokio::test]
    async fn invalid_pattern_fails_before_request() {
        let prober = HttpProber::new().unwrap();
        let err = prober.probe(&entry("http://127.0.0.1:1/", "(")).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidPattern(_)));
    }

    #[tokio::test]
    async fn malformed_header_fails_before_request() {
        let prober = HttpProber::new().unwrap();
        let mut e = entry("http://127.0.0.1:1/", ".");
        e.request.headers = vec!["no-colon".to_string()];

        let err = prober.probe(&e).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidHeader(ref h) if h == "no-colon"));
    }

    #[tokio::test]
    async fn closed_port_returns_request_error() {
        // Port 1 won't be listening.
        let prober = HttpProber::new().unwrap();
        let err = prober.probe(&entry("http://127.0.0.1:1/", ".")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Request(_) | ProbeError::Timeout(_)));
    }
}
