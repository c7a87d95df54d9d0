// src/telemetry.rs
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

/// One-time metric descriptions. Which recorder (if any) receives them is up to the embedder.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("extract_markers_total", "Draw-ball markers read from pages.");
        describe_counter!("extract_runs_total", "Same-color runs grouped from markers.");
        describe_counter!(
            "extract_runs_dropped_total",
            "Runs dropped as unmapped (unknown color or exhausted sequence)."
        );
        describe_counter!(
            "extract_validation_mismatch_total",
            "Results whose number count differs from the expected one."
        );
        describe_counter!("slot_fetch_attempts_total", "Slot/page fetch attempts, retries included.");
        describe_counter!("slot_fetch_errors_total", "Fetches that failed after every retry.");
        describe_counter!("slot_fallback_total", "Slots that fell back to yesterday's page.");
        describe_counter!("slot_pending_total", "Slots left pending after fallback.");
        describe_counter!(
            "snapshot_preserved_total",
            "Empty results replaced by the previous known-good value."
        );
        describe_counter!("snapshot_anomalies_total", "Anomalies reported after reconciliation.");
        describe_counter!("notify_failures_total", "Notification deliveries that failed.");
        describe_gauge!("cycle_last_run_ts", "Unix ts when a cycle last finished.");
    });
}
