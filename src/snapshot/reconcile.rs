// src/snapshot/reconcile.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use metrics::counter;

use super::anomaly::{Anomaly, AnomalyKind};
use super::{content_digest, Snapshot};
use crate::extract::types::{DrawResult, DrawStatus, GameKey};

/// One key's outcome for this cycle, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleEntry {
    pub result: DrawResult,
    /// Set when the fetch hard-failed after every retry.
    pub fetch_error: Option<String>,
}

impl CycleEntry {
    pub fn ok(result: DrawResult) -> Self {
        Self {
            result,
            fetch_error: None,
        }
    }

    pub fn failed(result: DrawResult, error: impl Into<String>) -> Self {
        Self {
            result,
            fetch_error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub snapshot: Snapshot,
    pub anomalies: Vec<Anomaly>,
    /// Keys whose empty result was replaced by the previous value.
    pub preserved: Vec<GameKey>,
    /// Keys in cycle order (the snapshot map itself is sorted).
    pub order: Vec<GameKey>,
    /// Content differs from the previous snapshot (always true on first run).
    pub changed: bool,
}

impl Reconciliation {
    pub fn results_in_order(&self) -> impl Iterator<Item = &DrawResult> + '_ {
        self.order
            .iter()
            .filter_map(move |k| self.snapshot.results.get(k))
    }

    fn fresh_with_status(&self, status: DrawStatus) -> impl Iterator<Item = &DrawResult> + '_ {
        self.results_in_order()
            .filter(move |r| r.status == status && r.has_principal())
            .filter(move |r| !self.preserved.contains(&r.game))
    }

    /// Fresh values for today (page mode counts as today).
    pub fn confirmed_today(&self) -> impl Iterator<Item = &DrawResult> + '_ {
        self.fresh_with_status(DrawStatus::Completed)
    }

    pub fn previous_day(&self) -> impl Iterator<Item = &DrawResult> + '_ {
        self.fresh_with_status(DrawStatus::PreviousDay)
    }
}

/// Merge this cycle's entries into the previous snapshot.
///
/// An entry without a principal value never overwrites a previous one that
/// has it. Only keys present in `entries` end up in the new snapshot.
/// Applying the same entries to the output again changes nothing.
pub fn reconcile(
    entries: Vec<CycleEntry>,
    previous: Option<&Snapshot>,
    now: DateTime<Utc>,
) -> Reconciliation {
    let mut results: BTreeMap<GameKey, DrawResult> = BTreeMap::new();
    let mut order: Vec<GameKey> = Vec::new();
    let mut preserved: Vec<GameKey> = Vec::new();
    let mut failures: BTreeMap<GameKey, String> = BTreeMap::new();

    for entry in entries {
        let key = entry.result.game.clone();
        if !order.contains(&key) {
            order.push(key.clone());
        }
        if let Some(err) = entry.fetch_error {
            failures.insert(key.clone(), err);
        } else {
            failures.remove(&key);
        }

        let prior = previous
            .and_then(|p| p.get(&key))
            .filter(|p| p.has_principal());

        let chosen = match prior {
            Some(prior) if !entry.result.has_principal() => {
                tracing::warn!(
                    target: "snapshot",
                    key = %key, kept = %prior.numbers_display(), status = prior.status.label(),
                    "empty result, keeping previous value"
                );
                counter!("snapshot_preserved_total").increment(1);
                if !preserved.contains(&key) {
                    preserved.push(key.clone());
                }
                prior.clone()
            }
            _ => {
                preserved.retain(|k| k != &key);
                entry.result
            }
        };
        results.insert(key, chosen);
    }

    let mut anomalies = Vec::new();
    for key in &order {
        let Some(r) = results.get(key) else { continue };
        let anomaly = if let Some(err) = failures.get(key) {
            Some(Anomaly::slot(
                key.clone(),
                &r.display_name,
                AnomalyKind::FetchFailed,
                Some(err.clone()),
            ))
        } else if !r.has_principal() {
            Some(Anomaly::slot(key.clone(), &r.display_name, AnomalyKind::Missing, None))
        } else if preserved.contains(key) {
            Some(Anomaly::slot(
                key.clone(),
                &r.display_name,
                AnomalyKind::Preserved,
                Some(format!("kept {}", r.numbers_display())),
            ))
        } else {
            None
        };
        anomalies.extend(anomaly);
    }
    counter!("snapshot_anomalies_total").increment(anomalies.len() as u64);

    let snapshot = Snapshot::new(results, now);
    let changed = previous
        .map(|p| content_digest(&p.results) != snapshot.digest)
        .unwrap_or(true);

    tracing::info!(
        target: "snapshot",
        total = snapshot.total_results, preserved = preserved.len(),
        anomalies = anomalies.len(), changed,
        "reconciled"
    );

    Reconciliation {
        snapshot,
        anomalies,
        preserved,
        order,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 22, 0, 0).unwrap()
    }

    fn result(key: &str, nums: &[&str], status: DrawStatus) -> DrawResult {
        let mut r = DrawResult::new(GameKey::new(key), key.to_uppercase(), now());
        r.numbers = nums.iter().map(|s| s.to_string()).collect();
        r.status = status;
        r
    }

    fn prev(results: Vec<DrawResult>) -> Snapshot {
        let map = results.into_iter().map(|r| (r.game.clone(), r)).collect();
        Snapshot::new(map, now())
    }

    #[test]
    fn empty_result_keeps_previous_value_and_flags_it() {
        let old = prev(vec![result("x", &["4", "2"], DrawStatus::Completed)]);
        let out = reconcile(
            vec![CycleEntry::ok(result("x", &[], DrawStatus::Pending))],
            Some(&old),
            now(),
        );
        let x = out.snapshot.get(&"x".into()).unwrap();
        assert_eq!(x.numbers, vec!["4", "2"]);
        assert_eq!(out.preserved, vec![GameKey::new("x")]);
        assert_eq!(out.anomalies.len(), 1);
        assert_eq!(out.anomalies[0].kind, AnomalyKind::Preserved);
        assert!(!out.changed);
    }

    #[test]
    fn fresh_completed_replaces_previous_day() {
        let old = prev(vec![result("y", &["11"], DrawStatus::PreviousDay)]);
        let out = reconcile(
            vec![CycleEntry::ok(result("y", &["27"], DrawStatus::Completed))],
            Some(&old),
            now(),
        );
        let y = out.snapshot.get(&"y".into()).unwrap();
        assert_eq!(y.status, DrawStatus::Completed);
        assert_eq!(y.numbers, vec!["27"]);
        assert!(out.anomalies.is_empty());
        assert!(out.changed);
        assert_eq!(out.confirmed_today().count(), 1);
    }

    #[test]
    fn fetch_failure_is_distinct_from_missing() {
        let out = reconcile(
            vec![
                CycleEntry::failed(result("a", &[], DrawStatus::Pending), "timed out"),
                CycleEntry::ok(result("b", &[], DrawStatus::Pending)),
            ],
            None,
            now(),
        );
        let kinds: Vec<_> = out.anomalies.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AnomalyKind::FetchFailed, AnomalyKind::Missing]);
        assert_eq!(out.anomalies[0].detail.as_deref(), Some("timed out"));
        assert!(out.changed);
    }

    #[test]
    fn keys_absent_from_the_cycle_are_not_carried() {
        let old = prev(vec![
            result("a", &["1"], DrawStatus::Completed),
            result("gone", &["9"], DrawStatus::Completed),
        ]);
        let out = reconcile(
            vec![CycleEntry::ok(result("a", &["2"], DrawStatus::Completed))],
            Some(&old),
            now(),
        );
        assert_eq!(out.snapshot.total_results, 1);
        assert!(out.snapshot.get(&"gone".into()).is_none());
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let old = prev(vec![result("x", &["4", "2"], DrawStatus::Completed)]);
        let entries = vec![
            CycleEntry::ok(result("x", &[], DrawStatus::Pending)),
            CycleEntry::ok(result("z", &["5"], DrawStatus::PreviousDay)),
        ];
        let first = reconcile(entries.clone(), Some(&old), now());
        let second = reconcile(entries, Some(&first.snapshot), now());
        assert_eq!(second.snapshot, first.snapshot);
        assert!(!second.changed);
        assert_eq!(second.previous_day().count(), 1);
    }
}
