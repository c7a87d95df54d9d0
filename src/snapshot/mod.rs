// src/snapshot/mod.rs
//! The only state that survives between runs: last known-good results per key.

pub mod anomaly;
pub mod reconcile;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::SnapshotError;
use crate::extract::types::{DrawResult, GameKey};

pub use anomaly::{Anomaly, AnomalyKind};
pub use reconcile::{reconcile, CycleEntry, Reconciliation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated_at: DateTime<Utc>,
    pub total_results: usize,
    /// Content digest; see [`content_digest`].
    #[serde(default)]
    pub digest: String,
    pub results: BTreeMap<GameKey, DrawResult>,
}

impl Snapshot {
    pub fn new(results: BTreeMap<GameKey, DrawResult>, updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            total_results: results.len(),
            digest: content_digest(&results),
            results,
        }
    }

    pub fn get(&self, key: &GameKey) -> Option<&DrawResult> {
        self.results.get(key)
    }
}

/// SHA-256 over key, numbers, status and draw date of every result.
/// Fetch timestamps are left out so an unchanged board hashes the same.
pub fn content_digest(results: &BTreeMap<GameKey, DrawResult>) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    for (key, r) in results {
        hasher.update(key.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(r.numbers.join(",").as_bytes());
        hasher.update(b"|");
        hasher.update(r.status.label().as_bytes());
        hasher.update(b"|");
        hasher.update(r.draw_date.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// `Ok(None)` when the file does not exist yet (first run).
pub async fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let raw = match fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let snap = serde_json::from_str(&raw).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(snap))
}

/// Write to a sibling temp file, then rename over the target.
pub async fn save(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let body = serde_json::to_vec_pretty(snapshot)?;
    let write_err = |source: std::io::Error| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await.map_err(write_err)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, &body).await.map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    tracing::info!(
        target: "snapshot",
        path = %path.display(), total = snapshot.total_results, digest = %snapshot.digest,
        "snapshot written"
    );
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::types::DrawStatus;
    use chrono::TimeZone;

    fn result(key: &str, nums: &[&str], at: DateTime<Utc>) -> DrawResult {
        let mut r = DrawResult::new(GameKey::new(key), key, at);
        r.numbers = nums.iter().map(|s| s.to_string()).collect();
        r.status = DrawStatus::Completed;
        r
    }

    fn one(r: DrawResult) -> BTreeMap<GameKey, DrawResult> {
        let mut m = BTreeMap::new();
        m.insert(r.game.clone(), r);
        m
    }

    #[test]
    fn digest_ignores_fetch_time_but_not_numbers() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 5, 11, 0, 0).unwrap();
        let a = one(result("pega3_2pm", &["1", "2", "3"], t0));
        let b = one(result("pega3_2pm", &["1", "2", "3"], t1));
        let c = one(result("pega3_2pm", &["1", "2", "4"], t0));
        assert_eq!(content_digest(&a), content_digest(&b));
        assert_ne!(content_digest(&a), content_digest(&c));
        assert_eq!(content_digest(&a).len(), 64);
    }

    #[tokio::test]
    async fn missing_file_is_first_run_and_save_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("snap.json");
        assert!(load(&path).await.unwrap().is_none());

        let t0 = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        let snap = Snapshot::new(one(result("juga3_3pm", &["482"], t0)), t0);
        save(&path, &snap).await.unwrap();
        assert!(!tmp_path(&path).exists());

        let back = load(&path).await.unwrap().unwrap();
        assert_eq!(back, snap);

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["total_results"], 1);
        assert_eq!(v["results"]["juga3_3pm"]["numbers"][0], "482");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }));
    }
}
