//! Reporting sink for completed probe cycles.

use jitterprobe_core::ProbeReport;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives every completed cycle's outcome.
///
/// Called from whichever task completed, possibly from many tasks at once,
/// and never while the scheduler's state lock is held. Implementations must
/// not block.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: ProbeReport);
}

/// Queue reports for a single consumer.
impl ReportSink for mpsc::UnboundedSender<ProbeReport> {
    fn report(&self, report: ProbeReport) {
        if let Err(e) = self.send(report) {
            debug!(key = %e.0.key, "report receiver dropped, discarding report");
        }
    }
}
