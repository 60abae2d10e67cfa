//! jitterprobe-scheduler — recurring probe tasks for a changing entry set.
//!
//! The [`Scheduler`] keeps exactly one probe cycle in flight per configured
//! entry. A cycle sleeps for a jittered delay, probes once, and hands its
//! [`ProbeReport`](jitterprobe_core::ProbeReport) back to the scheduler,
//! which spawns the next cycle if the entry is still configured and then
//! forwards the report to the [`ReportSink`].
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── Mutex<SchedulerState>
//!   │   ├── entries: key → Arc<Entry>   (replaced by set_entries)
//!   │   └── running: key → TaskSlot     (at most one per key)
//!   ├── Per-key cycle task (tokio::spawn)
//!   │   ├── jitter::jittered_delay() → sleep
//!   │   ├── Prober::probe() → bool     (errors count as false)
//!   │   └── on_task_complete() → respawn if still configured
//!   └── ReportSink (every completion, configured or not)
//! ```
//!
//! Removing an entry never cancels its in-flight cycle. The cycle finishes,
//! its report is still delivered, and no further cycle is spawned.

pub mod error;
pub mod jitter;
pub mod scheduler;
pub mod sink;
mod task;

pub use error::{SchedulerError, SchedulerResult};
pub use jitter::{MIN_DELAY, jittered_delay};
pub use scheduler::{ReconcileStats, RunningTask, Scheduler};
pub use sink::ReportSink;
