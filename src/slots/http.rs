// src/slots/http.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

use super::SlotRenderer;
use crate::config::{FetchConfig, SlotConfig, SlotsConfig};
use crate::error::FetchError;
use crate::extract::markup::{ClassQuery, Document};
use crate::source::build_client;

/// Renderer for slot pages that are server-rendered. Pages that need a
/// browser go through another `SlotRenderer`.
pub struct HttpSlotRenderer {
    client: Client,
    base_url: String,
    markers: ClassQuery,
}

impl HttpSlotRenderer {
    pub fn new(cfg: &SlotsConfig, fetch: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(fetch)?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            markers: ClassQuery::new(&cfg.marker_class),
        })
    }

    /// `{base}{path}?date=YYYY-MM-DD`
    pub fn slot_url(&self, slot: &SlotConfig, date: NaiveDate) -> String {
        format!("{}{}?date={}", self.base_url, slot.path, date.format("%Y-%m-%d"))
    }
}

#[async_trait]
impl SlotRenderer for HttpSlotRenderer {
    async fn render(&self, slot: &SlotConfig, date: NaiveDate) -> Result<Document, FetchError> {
        let url = self.slot_url(slot, date);
        tracing::debug!(target: "slots", %url, "GET");
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let doc = Document::parse(&body);
        // Same contract as waiting for the selector in a browser.
        if doc.select(&self.markers).next().is_none() {
            return Err(FetchError::MarkersMissing(self.markers.to_string()));
        }
        Ok(doc)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_url_carries_iso_date() {
        let cfg = SlotsConfig::default();
        let r = HttpSlotRenderer::new(&cfg, &FetchConfig::default()).unwrap();
        let slot = cfg.find("pega3_2pm").unwrap();
        let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(
            r.slot_url(slot, d),
            "https://loteriasdehonduras.com/loto-hn/pega-3-2pm?date=2026-01-05"
        );
    }
}
