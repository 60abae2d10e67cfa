//! Config file watcher — hot-reloads entries into the scheduler.
//!
//! The notify watcher observes the config file's directory and forwards
//! relevant events over a channel. `run_reload_loop` consumes them, re-reads
//! the file, and hands the result to `Scheduler::set_entries`. A missing or
//! unparseable file clears the entry set.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use jitterprobe_core::{Entry, EntrySet};
use jitterprobe_scheduler::Scheduler;

/// Quiet period used to coalesce bursts of editor events.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// A change to the watched config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    Changed,
    Removed,
}

/// Load entries from `path`, treating any failure as "no entries".
pub fn load_entries(path: &Path) -> Vec<Entry> {
    info!(path = %path.display(), "loading config");
    match EntrySet::from_file(path) {
        Ok(set) => {
            if !set.rejected.is_empty() {
                warn!(rejected = set.rejected.len(), "some config entries were rejected");
            }
            set.into_entries()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config, clearing entries");
            Vec::new()
        }
    }
}

/// Map a notify event to a config event for the file named `file_name`.
pub fn classify(event: &Event, file_name: &OsString) -> Option<ConfigEvent> {
    let touches_config = event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()));
    if !touches_config {
        return None;
    }
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(ConfigEvent::Changed),
        EventKind::Remove(_) => Some(ConfigEvent::Removed),
        _ => None,
    }
}

/// Start watching `path` and forward its events to `events`.
///
/// The returned watcher must be kept alive for events to keep flowing.
pub fn watch_config(
    path: &Path,
    events: mpsc::UnboundedSender<ConfigEvent>,
) -> anyhow::Result<RecommendedWatcher> {
    let path = std::path::absolute(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| anyhow::anyhow!("config path has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", path.display()))?;

    let mut watcher = notify::recommended_watcher(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let Some(change) = classify(&event, &file_name) {
                    debug!(?change, "config file event");
                    let _ = events.send(change);
                }
            }
            Err(e) => warn!(error = %e, "config watcher error"),
        },
    )?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    info!(dir = %dir.display(), "watching config directory for changes");
    Ok(watcher)
}

/// A running config source: the optional watcher and its reload loop.
pub struct ConfigSource {
    /// Dropping the watcher stops event delivery.
    _watcher: Option<RecommendedWatcher>,
    pub handle: JoinHandle<()>,
}

/// Watch `path` (when `watch_file` is set), apply its current contents, then keep
/// applying changes until shutdown.
///
/// The watcher is installed before the initial load so an edit landing in
/// between is queued and applied by the reload loop.
pub async fn start(
    path: PathBuf,
    scheduler: Scheduler,
    watch_file: bool,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<ConfigSource> {
    // Without a watcher the sender is dropped here and the reload loop exits
    // as soon as it starts.
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let watcher = if watch_file {
        Some(watch_config(&path, event_tx)?)
    } else {
        info!("config watching disabled");
        None
    };

    scheduler.set_entries(load_entries(&path)).await?;

    let handle = tokio::spawn(run_reload_loop(path, scheduler, event_rx, shutdown));
    Ok(ConfigSource {
        _watcher: watcher,
        handle,
    })
}

/// Apply config events to the scheduler until the channel closes or
/// shutdown fires.
pub async fn run_reload_loop(
    path: PathBuf,
    scheduler: Scheduler,
    mut events: mpsc::UnboundedReceiver<ConfigEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let mut event = tokio::select! {
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    debug!("config event channel closed");
                    break;
                }
            },
            _ = shutdown.changed() => break,
        };

        tokio::time::sleep(DEBOUNCE).await;
        while let Ok(next) = events.try_recv() {
            event = next;
        }

        let entries = match event {
            ConfigEvent::Changed => load_entries(&path),
            ConfigEvent::Removed => {
                info!(path = %path.display(), "config file removed, clearing entries");
                Vec::new()
            }
        };

        if let Err(e) = scheduler.set_entries(entries).await {
            error!(error = %e, "failed to apply config");
            break;
        }
    }
    debug!("config reload loop stopped");
}
