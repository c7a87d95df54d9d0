// src/notify/mod.rs
//! Outbound notifications. The engine decides *whether* something is worth
//! reporting; the sinks here only deliver text. Delivery failures are logged
//! and counted, never propagated to the run.

pub mod discord;
pub mod email;
pub mod slack;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::extract::types::DrawResult;
use crate::snapshot::{Anomaly, Reconciliation};

pub use discord::DiscordNotifier;
pub use email::EmailSender;
pub use slack::SlackNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEvent {
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub ts: DateTime<Utc>,
}

impl NotificationEvent {
    /// Detail message for one failed slot, sent as soon as it happens.
    pub fn anomaly(a: &Anomaly, ts: DateTime<Utc>) -> Self {
        let severity = if a.kind.is_error() {
            Severity::Error
        } else {
            Severity::Warning
        };
        Self {
            title: format!("{}: {}", a.display_name, a.kind.label()),
            body: a.to_string(),
            severity,
            ts,
        }
    }

    /// End-of-run summary. `extra` carries run-level anomalies that are not
    /// part of the reconciliation (persistence, session).
    pub fn summary(rec: &Reconciliation, extra: &[Anomaly], ts: DateTime<Utc>) -> Self {
        let today: Vec<&DrawResult> = rec.confirmed_today().collect();
        let previous: Vec<&DrawResult> = rec.previous_day().collect();
        let anomalies: Vec<&Anomaly> = rec.anomalies.iter().chain(extra).collect();

        let severity = if anomalies.iter().any(|a| a.kind.is_error()) {
            Severity::Error
        } else if anomalies.is_empty() {
            Severity::Info
        } else {
            Severity::Warning
        };
        Self {
            title: format!(
                "Draw results: {} today, {} previous day, {} anomalies",
                today.len(),
                previous.len(),
                anomalies.len()
            ),
            body: format_summary(&today, &previous, &anomalies),
            severity,
            ts,
        }
    }
}

fn result_line(r: &DrawResult) -> String {
    match &r.draw_time {
        Some(t) => format!("- {} ({}): {}", r.display_name, t, r.numbers_display()),
        None => format!("- {}: {}", r.display_name, r.numbers_display()),
    }
}

/// Three sections: confirmed today, fallback to previous day, anomalies.
pub fn format_summary(today: &[&DrawResult], previous: &[&DrawResult], anomalies: &[&Anomaly]) -> String {
    let mut out = String::new();
    let mut section = |title: &str, lines: Vec<String>| {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("{title} ({})\n", lines.len()));
        if lines.is_empty() {
            out.push_str("—\n");
        }
        for l in lines {
            out.push_str(&l);
            out.push('\n');
        }
    };
    section("Confirmed today", today.iter().map(|r| result_line(r)).collect());
    section("Previous day", previous.iter().map(|r| result_line(r)).collect());
    section("Anomalies", anomalies.iter().map(|a| format!("- {a}")).collect());
    out
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, ev: &NotificationEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fan-out to every configured channel.
#[derive(Default)]
pub struct NotifierMux {
    sinks: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Notifier + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Channels whose environment is set; the rest stay disabled.
    pub fn from_env() -> Self {
        let mut mux = Self::new();
        if let Some(d) = DiscordNotifier::from_env() {
            mux = mux.with(d);
        }
        if let Some(s) = SlackNotifier::from_env() {
            mux = mux.with(s);
        }
        match EmailSender::from_env() {
            Ok(Some(e)) => mux = mux.with(e),
            Ok(None) => {}
            Err(e) => tracing::warn!(target: "notify", error = %format!("{e:#}"), "email disabled"),
        }
        tracing::info!(target: "notify", channels = ?mux.channel_names(), "notifiers configured");
        mux
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver to every sink; returns how many accepted it.
    pub async fn notify(&self, ev: &NotificationEvent) -> usize {
        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.send(ev).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    counter!("notify_failures_total").increment(1);
                    tracing::warn!(
                        target: "notify",
                        channel = sink.name(), error = %format!("{e:#}"),
                        "notification not delivered"
                    );
                }
            }
        }
        delivered
    }
}
