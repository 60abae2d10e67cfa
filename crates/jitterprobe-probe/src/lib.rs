//! jitterprobe-probe — the check performed once per probe cycle.
//!
//! A [`Prober`] takes an [`Entry`] and answers one question: does the
//! endpoint's response body match the entry's pattern right now? Any failure
//! along the way (bad method, connection refused, timeout, unreadable body)
//! is a [`ProbeError`]. Callers decide what a failure means; the scheduler
//! counts it as a non-match.

pub mod checker;
pub mod error;

use async_trait::async_trait;
use jitterprobe_core::Entry;

pub use checker::HttpProber;
pub use error::ProbeError;

/// Performs one check against an entry.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Returns whether the response matched the entry's pattern.
    async fn probe(&self, entry: &Entry) -> Result<bool, ProbeError>;
}
