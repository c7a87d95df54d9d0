// src/notify/slack.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::{NotificationEvent, Notifier, Severity};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn from_env() -> Option<Self> {
        std::env::var("SLACK_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }

    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
        }
    }
}

pub(crate) fn slack_text(ev: &NotificationEvent) -> String {
    let marker = match ev.severity {
        Severity::Info => "",
        Severity::Warning => ":warning: ",
        Severity::Error => ":rotating_light: ",
    };
    format!("{marker}*{}*\n```{}```", ev.title, ev.body.trim_end())
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        let body = serde_json::json!({ "text": slack_text(ev) });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
