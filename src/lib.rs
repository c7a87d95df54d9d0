// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod extract;
pub mod notify;
pub mod runner;
pub mod slots;
pub mod snapshot;
pub mod source;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::error::{FetchError, SnapshotError};
pub use crate::extract::types::{DrawResult, DrawStatus, GameKey, PageGame};
pub use crate::notify::{NotificationEvent, Notifier, NotifierMux};
pub use crate::runner::{CycleReport, Mode, RunOptions};
pub use crate::snapshot::{Anomaly, AnomalyKind, Snapshot};
