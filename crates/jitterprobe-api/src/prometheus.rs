//! Prometheus text exposition format.
//!
//! Renders the status board into gauges and counters labelled by entry key.

use crate::board::KeyStatus;

/// Render per-key results plus scheduler totals.
pub fn render_prometheus(statuses: &[KeyStatus], running: usize, spawned: u64) -> String {
    let mut out = String::new();

    out.push_str("# HELP jitterprobe_matched Whether the last probe matched (1) or not (0).\n");
    out.push_str("# TYPE jitterprobe_matched gauge\n");
    for s in statuses {
        out.push_str(&format!(
            "jitterprobe_matched{{key=\"{}\"}} {}\n",
            escape_label(&s.key),
            u8::from(s.matched)
        ));
    }

    out.push_str("# HELP jitterprobe_last_probe_timestamp_seconds Unix time of the last completed probe.\n");
    out.push_str("# TYPE jitterprobe_last_probe_timestamp_seconds gauge\n");
    for s in statuses {
        out.push_str(&format!(
            "jitterprobe_last_probe_timestamp_seconds{{key=\"{}\"}} {}\n",
            escape_label(&s.key),
            s.timestamp.timestamp()
        ));
    }

    out.push_str("# HELP jitterprobe_probes_total Completed probes.\n");
    out.push_str("# TYPE jitterprobe_probes_total counter\n");
    for s in statuses {
        out.push_str(&format!(
            "jitterprobe_probes_total{{key=\"{}\"}} {}\n",
            escape_label(&s.key),
            s.total_probes
        ));
    }

    out.push_str("# HELP jitterprobe_matches_total Completed probes that matched.\n");
    out.push_str("# TYPE jitterprobe_matches_total counter\n");
    for s in statuses {
        out.push_str(&format!(
            "jitterprobe_matches_total{{key=\"{}\"}} {}\n",
            escape_label(&s.key),
            s.total_matches
        ));
    }

    out.push_str("# HELP jitterprobe_consecutive_misses Non-matches since the last match.\n");
    out.push_str("# TYPE jitterprobe_consecutive_misses gauge\n");
    for s in statuses {
        out.push_str(&format!(
            "jitterprobe_consecutive_misses{{key=\"{}\"}} {}\n",
            escape_label(&s.key),
            s.consecutive_misses
        ));
    }

    out.push_str("# HELP jitterprobe_running_tasks Probe cycles currently in flight.\n");
    out.push_str("# TYPE jitterprobe_running_tasks gauge\n");
    out.push_str(&format!("jitterprobe_running_tasks {running}\n"));

    out.push_str("# HELP jitterprobe_tasks_spawned_total Probe cycles spawned since start.\n");
    out.push_str("# TYPE jitterprobe_tasks_spawned_total counter\n");
    out.push_str(&format!("jitterprobe_tasks_spawned_total {spawned}\n"));

    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn status(key: &str, matched: bool) -> KeyStatus {
        KeyStatus {
            key: key.to_string(),
            matched,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            total_probes: 5,
            total_matches: 3,
            consecutive_misses: if matched { 0 } else { 2 },
        }
    }

    #[test]
    fn render_contains_all_metrics() {
        let output = render_prometheus(&[status("home", true), status("api", false)], 2, 17);

        assert!(output.contains("jitterprobe_matched{key=\"home\"} 1"));
        assert!(output.contains("jitterprobe_matched{key=\"api\"} 0"));
        assert!(output.contains("jitterprobe_last_probe_timestamp_seconds{key=\"home\"} 1700000000"));
        assert!(output.contains("jitterprobe_probes_total{key=\"api\"} 5"));
        assert!(output.contains("jitterprobe_matches_total{key=\"api\"} 3"));
        assert!(output.contains("jitterprobe_consecutive_misses{key=\"api\"} 2"));
        assert!(output.contains("jitterprobe_running_tasks 2"));
        assert!(output.contains("jitterprobe_tasks_spawned_total 17"));
    }

    #[test]
    fn render_empty() {
        let output = render_prometheus(&[], 0, 0);
        assert!(output.contains("# TYPE jitterprobe_matched gauge"));
        assert!(!output.contains("key="));
    }

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(escape_label("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}
