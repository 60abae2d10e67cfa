//! Status board — last known probe result per key.
//!
//! The board is the consumer end of the scheduler's report queue. `run`
//! drains reports one at a time, so per-key ordering is preserved and the
//! scheduler's tasks never wait on the board.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc, watch};
use tracing::{debug, info};

use jitterprobe_core::ProbeReport;

/// Latest result for one key, with running counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeyStatus {
    pub key: String,
    pub matched: bool,
    pub timestamp: DateTime<Utc>,
    pub total_probes: u64,
    pub total_matches: u64,
    /// Non-matches since the last match.
    pub consecutive_misses: u32,
}

impl KeyStatus {
    fn first(report: &ProbeReport) -> Self {
        Self {
            key: report.key.clone(),
            matched: report.matched,
            timestamp: report.timestamp,
            total_probes: 1,
            total_matches: u64::from(report.matched),
            consecutive_misses: u32::from(!report.matched),
        }
    }

    fn record(&mut self, report: &ProbeReport) {
        self.matched = report.matched;
        self.timestamp = report.timestamp;
        self.total_probes += 1;
        if report.matched {
            self.total_matches += 1;
            self.consecutive_misses = 0;
        } else {
            self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        }
    }
}

/// Shared, cloneable view of the latest results.
#[derive(Clone, Default)]
pub struct StatusBoard {
    results: Arc<RwLock<HashMap<String, KeyStatus>>>,
    initialized: Arc<AtomicBool>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed probe.
    pub async fn record(&self, report: ProbeReport) {
        info!(
            key = %report.key,
            matched = report.matched,
            ts = %report.timestamp,
            "probe result"
        );
        let mut results = self.results.write().await;
        results
            .entry(report.key.clone())
            .and_modify(|s| s.record(&report))
            .or_insert_with(|| KeyStatus::first(&report));
    }

    /// Latest result for `key`, if it has ever completed a probe.
    pub async fn get(&self, key: &str) -> Option<KeyStatus> {
        let results = self.results.read().await;
        results.get(key).cloned()
    }

    /// Latest results for the given keys only, sorted by key.
    ///
    /// Keys that were removed from the configuration keep their last result
    /// on the board but are hidden by passing only the active keys here.
    pub async fn snapshot_for(&self, keys: &[String]) -> Vec<KeyStatus> {
        let results = self.results.read().await;
        let mut out: Vec<KeyStatus> = keys.iter().filter_map(|k| results.get(k).cloned()).collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// Mark the daemon as fully started.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Drain reports into the board until the queue closes or shutdown fires.
    pub async fn run(
        &self,
        mut reports: mpsc::UnboundedReceiver<ProbeReport>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        debug!("status board consumer starting");
        loop {
            tokio::select! {
                report = reports.recv() => match report {
                    Some(report) => self.record(report).await,
                    None => {
                        debug!("report queue closed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    debug!("status board consumer shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(key: &str, matched: bool, secs: i64) -> ProbeReport {
        ProbeReport::new(key, matched, Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[tokio::test]
    async fn record_keeps_latest_and_counts() {
        let board = StatusBoard::new();
        board.record(report("a", true, 10)).await;
        board.record(report("a", false, 20)).await;
        board.record(report("a", false, 30)).await;

        let status = board.get("a").await.unwrap();
        assert!(!status.matched);
        assert_eq!(status.timestamp.timestamp(), 30);
        assert_eq!(status.total_probes, 3);
        assert_eq!(status.total_matches, 1);
        assert_eq!(status.consecutive_misses, 2);

        board.record(report("a", true, 40)).await;
        let status = board.get("a").await.unwrap();
        assert_eq!(status.consecutive_misses, 0);
        assert_eq!(status.total_matches, 2);
    }

    #[tokio::test]
    async fn snapshot_for_filters_inactive_keys() {
        let board = StatusBoard::new();
        board.record(report("b", true, 1)).await;
        board.record(report("a", true, 1)).await;
        board.record(report("gone", false, 1)).await;

        let active = vec!["b".to_string(), "a".to_string(), "never-ran".to_string()];
        let keys: Vec<_> = board
            .snapshot_for(&active)
            .await
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        // Removed keys keep their last result.
        assert!(board.get("gone").await.is_some());
    }

    #[tokio::test]
    async fn run_drains_until_queue_closes() {
        let board = StatusBoard::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(report("a", true, 1)).unwrap();
        tx.send(report("a", false, 2)).unwrap();
        drop(tx);

        board.run(rx, shutdown_rx).await;

        let status = board.get("a").await.unwrap();
        assert_eq!(status.total_probes, 2);
        assert!(!status.matched);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let board = StatusBoard::new();
        let (_tx, rx) = mpsc::unbounded_channel::<ProbeReport>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let consumer = board.clone();
        let handle = tokio::spawn(async move { consumer.run(rx, shutdown_rx).await });
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn initialized_flag() {
        let board = StatusBoard::new();
        assert!(!board.is_initialized());
        board.mark_initialized();
        assert!(board.clone().is_initialized());
    }
}
