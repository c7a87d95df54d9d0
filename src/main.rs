//! Draw results binary: one cycle per invocation.
//! Runs per-slot or whole-page mode, persists the snapshot and notifies.
//!
//! Usage: `loto-results [slots|page] [--file <markup.html>] [--dry-run]`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loto_results::config;
use loto_results::notify::NotifierMux;
use loto_results::runner::{self, CycleReport, Mode, RunOptions};
use loto_results::slots::HttpSlotRenderer;
use loto_results::source::MarkupSource;

#[derive(Debug)]
struct Args {
    mode: Mode,
    file: Option<PathBuf>,
    dry_run: bool,
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        mode: Mode::Slots,
        file: None,
        dry_run: false,
    };
    while let Some(a) = it.next() {
        match a.as_str() {
            "slots" => args.mode = Mode::Slots,
            "page" => args.mode = Mode::Page,
            "--dry-run" => args.dry_run = true,
            "--file" => {
                let p = it.next().context("--file needs a path")?;
                args.file = Some(PathBuf::from(p));
            }
            other => bail!("unknown argument `{other}`"),
        }
    }
    if args.file.is_some() && args.mode != Mode::Page {
        bail!("--file is only supported in page mode");
    }
    Ok(args)
}

/// `RUST_LOG` scopes the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("loto_results=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run(args: Args) -> Result<CycleReport> {
    let cfg = config::load_default().context("loading configuration")?;
    let opts = if args.dry_run {
        RunOptions::dry_run()
    } else {
        RunOptions::default()
    };
    let mux = if opts.notify {
        NotifierMux::from_env()
    } else {
        NotifierMux::new()
    };
    let now = Utc::now();

    let report = match args.mode {
        Mode::Slots => match HttpSlotRenderer::new(&cfg.slots, &cfg.fetch) {
            Ok(renderer) => runner::run_slot_cycle(&cfg, &renderer, &mux, opts, now).await,
            Err(e) => runner::abort_cycle(Mode::Slots, e, &mux, opts, now).await,
        },
        Mode::Page => {
            let source = match args.file {
                Some(path) => Ok(MarkupSource::from_file(path)),
                None => MarkupSource::from_url(&cfg.page.url, &cfg.fetch),
            };
            match source {
                Ok(source) => runner::run_page_cycle(&cfg, &source, &mux, opts, now).await,
                Err(e) => runner::abort_cycle(Mode::Page, e, &mux, opts, now).await,
            }
        }
    };
    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e:#}\nusage: loto-results [slots|page] [--file <markup.html>] [--dry-run]");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(report) => {
            let anomalies = report.anomalies().count();
            if let Some(p) = report.page {
                tracing::info!(
                    markers = p.markers, games = p.games, valid = p.valid,
                    warnings = p.warnings, dropped_runs = p.dropped_runs,
                    "page summary"
                );
            }
            tracing::info!(
                mode = %report.mode, anomalies, persisted = report.persisted,
                changed = report.changed(),
                "done"
            );
            if report.is_run_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}
