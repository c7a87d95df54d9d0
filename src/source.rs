// src/source.rs
//! Where whole-page markup comes from. The engine only consumes markup; these
//! are the thin I/O wrappers around it.

use std::path::PathBuf;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::extract::markup::Document;

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self) -> Result<Document, FetchError>;
    fn name(&self) -> &'static str;
}

/// Shared HTTP client: browser user agent and a per-request timeout.
/// Failing to build it means no session, which ends the cycle.
pub fn build_client(fetch: &FetchConfig) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(fetch.user_agent.clone())
        .timeout(fetch.timeout())
        .build()
        .map_err(|e| FetchError::Session(e.to_string()))
}

pub struct MarkupSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    File(PathBuf),
    Http { url: String, client: Client },
}

impl MarkupSource {
    /// Markup already in memory (tests, replays).
    pub fn from_fixture(markup: impl Into<String>) -> Self {
        Self {
            mode: Mode::Fixture(markup.into()),
        }
    }

    /// A page saved to disk earlier.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::File(path.into()),
        }
    }

    pub fn from_url(url: impl Into<String>, fetch: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client: build_client(fetch)?,
            },
        })
    }
}

#[async_trait]
impl PageSource for MarkupSource {
    async fn fetch_page(&self) -> Result<Document, FetchError> {
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| FetchError::Transport(format!("{}: {e}", path.display())))?,
            Mode::Http { url, client } => {
                let resp = match client.get(url.as_str()).send().await {
                    Ok(resp) => resp,
                    Err(e) => {
                        tracing::warn!(target: "runner", error = ?e, %url, "page http error");
                        counter!("slot_fetch_errors_total").increment(1);
                        return Err(e.into());
                    }
                };
                let resp = resp.error_for_status()?;
                resp.text().await?
            }
        };
        Ok(Document::parse(&body))
    }

    fn name(&self) -> &'static str {
        match self.mode {
            Mode::Fixture(_) => "fixture",
            Mode::File(_) => "file",
            Mode::Http { .. } => "http",
        }
    }
}
