//! One probe cycle: sleep, probe, report.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use jitterprobe_core::{Entry, ProbeReport};
use jitterprobe_probe::Prober;

use crate::jitter::jittered_delay;

/// Run a single cycle for `entry` and return its outcome.
///
/// Never fails: a probe error, or a panic inside the prober, is reported as
/// `matched = false`.
pub(crate) async fn run_cycle(entry: Arc<Entry>, prober: Arc<dyn Prober>) -> ProbeReport {
    let delay = jittered_delay(&entry.request);
    debug!(key = %entry.key, delay_ms = delay.as_millis() as u64, "task sleeping");
    tokio::time::sleep(delay).await;

    debug!(key = %entry.key, url = %entry.request.url, "task probing");
    let probe_entry = Arc::clone(&entry);
    let outcome = tokio::spawn(async move { prober.probe(&probe_entry).await }).await;

    let matched = match outcome {
        Ok(Ok(matched)) => matched,
        Ok(Err(e)) => {
            warn!(key = %entry.key, error = %e, "probe failed, reporting no match");
            false
        }
        Err(e) => {
            warn!(key = %entry.key, error = %e, "probe task panicked, reporting no match");
            false
        }
    };

    debug!(key = %entry.key, matched, "task complete");
    ProbeReport::new(entry.key.clone(), matched, Utc::now())
}
