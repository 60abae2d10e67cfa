//! Scheduler — keeps one probe cycle in flight per configured entry.
//!
//! The `Scheduler` is the reconciliation loop that:
//! - Replaces the configured entry set atomically on `set_entries`
//! - Spawns a cycle for every configured key that has none running
//! - Respawns a key's next cycle when the previous one completes, using the
//!   entry as configured at that moment
//! - Forwards every completion to the report sink

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use jitterprobe_core::{Entry, ProbeReport};
use jitterprobe_probe::Prober;

use crate::error::{SchedulerError, SchedulerResult};
use crate::sink::ReportSink;
use crate::task;

/// An in-flight cycle for one key.
struct TaskSlot {
    /// Held so `shutdown` can abort the cycle.
    handle: JoinHandle<()>,
    spawned_at: DateTime<Utc>,
}

/// Everything guarded by the scheduler lock.
#[derive(Default)]
struct SchedulerState {
    /// Configured entries by key. The "should be running" set.
    entries: HashMap<String, Arc<Entry>>,
    /// Keys with a cycle in flight. Never more than one slot per key.
    running: HashMap<String, TaskSlot>,
    shut_down: bool,
}

struct Inner {
    state: Mutex<SchedulerState>,
    prober: Arc<dyn Prober>,
    sink: Arc<dyn ReportSink>,
    spawned: AtomicU64,
}

/// Outcome of one `set_entries` reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Entries configured after the call.
    pub entries: usize,
    /// Cycles spawned by this call.
    pub spawned: usize,
    /// Configured keys that already had a cycle in flight.
    pub already_running: usize,
    /// Keys still finishing a cycle but no longer configured.
    pub retired: usize,
}

/// Snapshot of one in-flight cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningTask {
    pub key: String,
    pub spawned_at: DateTime<Utc>,
    /// Whether the key is still configured, i.e. will be rescheduled.
    pub configured: bool,
}

/// Drives recurring probe cycles for a changing set of entries.
///
/// Cheap to clone; clones share state. Must be used inside a tokio runtime.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create a scheduler that probes with `prober` and reports to `sink`.
    pub fn new(prober: Arc<dyn Prober>, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SchedulerState::default()),
                prober,
                sink,
                spawned: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the configured entries and spawn cycles for idle keys.
    ///
    /// Keys that already have a cycle in flight are left alone even if their
    /// entry changed; the next cycle picks up the new version. Keys that were
    /// dropped are not cancelled, only not rescheduled. If `entries` repeats
    /// a key, the last occurrence wins.
    pub async fn set_entries(&self, entries: Vec<Entry>) -> SchedulerResult<ReconcileStats> {
        let mut state = self.inner.state.lock().await;
        if state.shut_down {
            return Err(SchedulerError::ShutDown);
        }

        let mut next = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Some(prev) = next.insert(entry.key.clone(), Arc::new(entry)) {
                warn!(key = %prev.key, "duplicate entry key, keeping the last one");
            }
        }
        state.entries = next;

        let idle: Vec<String> = state
            .entries
            .keys()
            .filter(|key| !state.running.contains_key(*key))
            .cloned()
            .collect();

        let mut stats = ReconcileStats {
            entries: state.entries.len(),
            already_running: state.entries.len() - idle.len(),
            retired: state
                .running
                .keys()
                .filter(|key| !state.entries.contains_key(*key))
                .count(),
            ..ReconcileStats::default()
        };

        debug!(keys = ?idle, "new entries to schedule");
        for key in &idle {
            self.inner.spawn_cycle(&mut state, key);
            stats.spawned += 1;
        }

        info!(
            entries = stats.entries,
            spawned = stats.spawned,
            already_running = stats.already_running,
            retired = stats.retired,
            "entries reconciled"
        );
        Ok(stats)
    }

    /// Configured entries, sorted by key.
    pub async fn entries(&self) -> Vec<Entry> {
        let state = self.inner.state.lock().await;
        let mut entries: Vec<Entry> = state.entries.values().map(|e| (**e).clone()).collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Keys with a cycle in flight, sorted.
    pub async fn running_keys(&self) -> Vec<String> {
        let state = self.inner.state.lock().await;
        let mut keys: Vec<String> = state.running.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// In-flight cycles with their spawn time, sorted by key.
    pub async fn running_tasks(&self) -> Vec<RunningTask> {
        let state = self.inner.state.lock().await;
        let mut tasks: Vec<RunningTask> = state
            .running
            .iter()
            .map(|(key, slot)| RunningTask {
                key: key.clone(),
                spawned_at: slot.spawned_at,
                configured: state.entries.contains_key(key),
            })
            .collect();
        tasks.sort_by(|a, b| a.key.cmp(&b.key));
        tasks
    }

    /// Whether `key` has a cycle in flight.
    pub async fn is_running(&self, key: &str) -> bool {
        let state = self.inner.state.lock().await;
        state.running.contains_key(key)
    }

    /// Total cycles spawned since creation.
    pub fn tasks_spawned(&self) -> u64 {
        self.inner.spawned.load(Ordering::Relaxed)
    }

    /// Stop scheduling: forget all entries and abort in-flight cycles.
    ///
    /// Aborted cycles produce no report. Later `set_entries` calls fail with
    /// [`SchedulerError::ShutDown`].
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.shut_down = true;
        state.entries.clear();
        for (key, slot) in state.running.drain() {
            slot.handle.abort();
            debug!(%key, "probe cycle aborted");
        }
        info!("scheduler shut down");
    }
}

impl Inner {
    /// Spawn a cycle for `key` using the entry currently configured for it.
    ///
    /// Caller holds the lock and has checked that `key` is not running.
    fn spawn_cycle(self: &Arc<Self>, state: &mut SchedulerState, key: &str) {
        let Some(entry) = state.entries.get(key).cloned() else {
            return;
        };

        let inner = Arc::clone(self);
        let prober = Arc::clone(&self.prober);
        let handle = tokio::spawn(async move {
            let report = task::run_cycle(entry, prober).await;
            inner.on_task_complete(report).await;
        });

        state.running.insert(
            key.to_string(),
            TaskSlot {
                handle,
                spawned_at: Utc::now(),
            },
        );
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Called once by every cycle as its last step.
    ///
    /// Frees the key's slot, respawns if the key is still configured, and
    /// reports the outcome either way.
    async fn on_task_complete(self: &Arc<Self>, report: ProbeReport) {
        {
            let mut state = self.state.lock().await;
            if state.running.remove(&report.key).is_none() {
                debug!(key = %report.key, "completed key was not in the running set");
            }

            if !state.shut_down && state.entries.contains_key(&report.key) {
                debug!(key = %report.key, "rescheduling");
                self.spawn_cycle(&mut state, &report.key);
            } else {
                debug!(key = %report.key, "entry no longer configured, not rescheduling");
            }
        }

        self.sink.report(report);
    }
}
