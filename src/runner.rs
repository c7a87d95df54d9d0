// src/runner.rs
//! One cycle per mode: load the previous snapshot, resolve every key,
//! reconcile, persist once, notify.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use metrics::gauge;

use crate::config::EngineConfig;
use crate::extract::dates::format_date;
use crate::extract::{extract_page, pending_result, PageExtraction};
use crate::notify::{NotificationEvent, NotifierMux};
use crate::slots::{fetch_with_retry, resolve_slot, RetryPolicy, SlotRenderer};
use crate::snapshot::{self, reconcile, Anomaly, AnomalyKind, CycleEntry, Reconciliation, Snapshot};
use crate::source::PageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One fetch per configured slot, with day fallback.
    Slots,
    /// One whole-page fetch, color grouping.
    Page,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Slots => "slots",
            Mode::Page => "page",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub persist: bool,
    pub notify: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            persist: true,
            notify: true,
        }
    }
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self {
            persist: false,
            notify: false,
        }
    }
}

/// Page-mode counters for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageStats {
    pub markers: usize,
    pub games: usize,
    pub valid: usize,
    pub warnings: usize,
    pub dropped_runs: usize,
}

impl From<&PageExtraction> for PageStats {
    fn from(x: &PageExtraction) -> Self {
        Self {
            markers: x.marker_count,
            games: x.results.len(),
            valid: x.valid_count(),
            warnings: x.warning_count(),
            dropped_runs: x.dropped.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub mode: Mode,
    /// None when the cycle was aborted before anything was resolved.
    pub reconciliation: Option<Reconciliation>,
    /// Persistence and session failures.
    pub run_anomalies: Vec<Anomaly>,
    pub persisted: bool,
    pub page: Option<PageStats>,
}

impl CycleReport {
    pub fn is_run_error(&self) -> bool {
        !self.run_anomalies.is_empty()
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> + '_ {
        self.reconciliation
            .iter()
            .flat_map(|r| r.anomalies.iter())
            .chain(self.run_anomalies.iter())
    }

    pub fn changed(&self) -> bool {
        self.reconciliation.as_ref().is_some_and(|r| r.changed)
    }
}

/// Previous snapshot plus whether it may be overwritten.
struct Prior {
    snapshot: Option<Snapshot>,
    writable: bool,
    anomaly: Option<Anomaly>,
}

async fn load_prior(path: &Path) -> Prior {
    match snapshot::load(path).await {
        Ok(snapshot) => Prior {
            snapshot,
            writable: true,
            anomaly: None,
        },
        Err(e) => {
            // Unreadable history is never clobbered.
            tracing::error!(target: "runner", error = %e, "previous snapshot unreadable, will not persist");
            Prior {
                snapshot: None,
                writable: false,
                anomaly: Some(Anomaly::run_level(AnomalyKind::Persistence, e.to_string())),
            }
        }
    }
}

async fn notify_anomaly(mux: &NotifierMux, opts: RunOptions, a: &Anomaly, now: DateTime<Utc>) {
    if opts.notify {
        mux.notify(&NotificationEvent::anomaly(a, now)).await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn finish(
    mode: Mode,
    entries: Vec<CycleEntry>,
    prior: Prior,
    path: &Path,
    mux: &NotifierMux,
    opts: RunOptions,
    now: DateTime<Utc>,
    page: Option<PageStats>,
) -> CycleReport {
    let rec = reconcile(entries, prior.snapshot.as_ref(), now);
    let mut run_anomalies: Vec<Anomaly> = prior.anomaly.into_iter().collect();

    let mut persisted = false;
    if opts.persist && prior.writable {
        match snapshot::save(path, &rec.snapshot).await {
            Ok(()) => persisted = true,
            Err(e) => {
                tracing::error!(target: "runner", error = %e, "snapshot not persisted");
                run_anomalies.push(Anomaly::run_level(AnomalyKind::Persistence, e.to_string()));
            }
        }
    }

    for r in rec.results_in_order() {
        tracing::info!(
            target: "runner",
            key = %r.game, status = r.status.label(), numbers = %r.numbers_display(),
            preserved = rec.preserved.contains(&r.game),
            "final"
        );
    }
    gauge!("cycle_last_run_ts").set(now.timestamp() as f64);

    if opts.notify {
        let ev = NotificationEvent::summary(&rec, &run_anomalies, now);
        mux.notify(&ev).await;
    }

    tracing::info!(
        target: "runner",
        %mode, total = rec.snapshot.total_results, anomalies = rec.anomalies.len() + run_anomalies.len(),
        persisted, changed = rec.changed,
        "cycle finished"
    );

    CycleReport {
        mode,
        reconciliation: Some(rec),
        run_anomalies,
        persisted,
        page,
    }
}

/// Per-slot mode. Slots run strictly one after another with pacing in between.
pub async fn run_slot_cycle<R>(
    cfg: &EngineConfig,
    renderer: &R,
    mux: &NotifierMux,
    opts: RunOptions,
    now: DateTime<Utc>,
) -> CycleReport
where
    R: SlotRenderer + ?Sized,
{
    crate::telemetry::ensure_described();
    let prior = load_prior(&cfg.snapshot_path).await;
    let policy = RetryPolicy::from(&cfg.fetch);
    let today = cfg.local_date(now);
    tracing::info!(
        target: "runner",
        renderer = renderer.name(), %today, slots = cfg.slots.table.len(),
        "slot cycle started"
    );

    let mut entries = Vec::with_capacity(cfg.slots.table.len());
    for (i, slot) in cfg.slots.table.iter().enumerate() {
        if i > 0 && !cfg.fetch.pacing().is_zero() {
            tokio::time::sleep(cfg.fetch.pacing()).await;
        }
        let entry = resolve_slot(renderer, &cfg.slots, slot, &policy, today, now).await;
        if let Some(err) = &entry.fetch_error {
            let a = Anomaly::slot(
                entry.result.game.clone(),
                &entry.result.display_name,
                AnomalyKind::FetchFailed,
                Some(err.clone()),
            );
            notify_anomaly(mux, opts, &a, now).await;
        }
        entries.push(entry);
    }

    finish(Mode::Slots, entries, prior, &cfg.snapshot_path, mux, opts, now, None).await
}

/// Whole-page mode. A failed page fetch leaves every catalog game pending
/// with the error, so reconciliation keeps the previous values.
pub async fn run_page_cycle<S>(
    cfg: &EngineConfig,
    source: &S,
    mux: &NotifierMux,
    opts: RunOptions,
    now: DateTime<Utc>,
) -> CycleReport
where
    S: PageSource + ?Sized,
{
    crate::telemetry::ensure_described();
    let prior = load_prior(&cfg.page_snapshot_path).await;
    let policy = RetryPolicy::from(&cfg.fetch);
    let fallback_date = format_date(cfg.local_date(now), &cfg.page.fallback_date_format);
    tracing::info!(target: "runner", source = source.name(), url = %cfg.page.url, "page cycle started");

    let (entries, stats) =
        match fetch_with_retry(&policy, source.name(), move || source.fetch_page()).await {
            Ok(doc) => {
                let x = extract_page(&doc, &cfg.page, &cfg.games, now, cfg.offset());
                let stats = PageStats::from(&x);
                let missing: Vec<_> = x.missing(&cfg.games).collect();
                let mut entries: Vec<CycleEntry> =
                    x.results.into_iter().map(CycleEntry::ok).collect();
                entries.extend(
                    missing
                        .into_iter()
                        .map(|g| CycleEntry::ok(pending_result(g, &cfg.games, &x.draw_date, now))),
                );
                (entries, Some(stats))
            }
            Err(e) => {
                let err = e.to_string();
                let a = Anomaly::run_level(AnomalyKind::FetchFailed, err.clone());
                notify_anomaly(mux, opts, &a, now).await;
                let entries = cfg
                    .games
                    .games
                    .iter()
                    .map(|g| {
                        CycleEntry::failed(
                            pending_result(g.game, &cfg.games, &fallback_date, now),
                            err.clone(),
                        )
                    })
                    .collect();
                (entries, None)
            }
        };

    finish(Mode::Page, entries, prior, &cfg.page_snapshot_path, mux, opts, now, stats).await
}

/// The rendering session could not be started: nothing is resolved or
/// written, one general anomaly is reported.
pub async fn abort_cycle(
    mode: Mode,
    error: impl fmt::Display,
    mux: &NotifierMux,
    opts: RunOptions,
    now: DateTime<Utc>,
) -> CycleReport {
    let a = Anomaly::run_level(AnomalyKind::General, error.to_string());
    tracing::error!(target: "runner", %mode, error = %error, "cycle aborted");
    notify_anomaly(mux, opts, &a, now).await;
    CycleReport {
        mode,
        reconciliation: None,
        run_anomalies: vec![a],
        persisted: false,
        page: None,
    }
}
