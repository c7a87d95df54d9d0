// src/snapshot/anomaly.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::types::GameKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// No principal value after reconciliation.
    Missing,
    /// This cycle came back empty; the previous value was kept (stale).
    Preserved,
    /// Fetch hard-failed after every retry.
    FetchFailed,
    /// Snapshot could not be read or written.
    Persistence,
    /// Run-level failure, e.g. the renderer could not start.
    General,
}

impl AnomalyKind {
    pub fn is_error(self) -> bool {
        matches!(
            self,
            AnomalyKind::FetchFailed | AnomalyKind::Persistence | AnomalyKind::General
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            AnomalyKind::Missing => "missing",
            AnomalyKind::Preserved => "stale (previous value kept)",
            AnomalyKind::FetchFailed => "fetch failed",
            AnomalyKind::Persistence => "persistence error",
            AnomalyKind::General => "run error",
        }
    }
}

/// Something the notifier should hear about. Never an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// None for run-level anomalies.
    pub key: Option<GameKey>,
    pub display_name: String,
    pub kind: AnomalyKind,
    #[serde(default)]
    pub detail: Option<String>,
}

impl Anomaly {
    pub fn slot(
        key: GameKey,
        display_name: impl Into<String>,
        kind: AnomalyKind,
        detail: Option<String>,
    ) -> Self {
        Self {
            key: Some(key),
            display_name: display_name.into(),
            kind,
            detail,
        }
    }

    pub fn run_level(kind: AnomalyKind, detail: impl Into<String>) -> Self {
        Self {
            key: None,
            display_name: "cycle".to_string(),
            kind,
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_name, self.kind.label())?;
        if let Some(d) = &self.detail {
            write!(f, " ({d})")?;
        }
        Ok(())
    }
}
