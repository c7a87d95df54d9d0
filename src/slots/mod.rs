// src/slots/mod.rs
//! Per-slot mode: each configured slot is fetched on its own, today first,
//! then yesterday when today shows nothing.

pub mod http;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use metrics::counter;

use crate::config::{SlotConfig, SlotsConfig};
use crate::error::FetchError;
use crate::extract::dates::{extract_draw_date, format_date};
use crate::extract::markup::{ClassQuery, Document};
use crate::extract::types::{DrawResult, DrawStatus, GameKey};
use crate::extract::validate;
use crate::snapshot::CycleEntry;

pub use http::HttpSlotRenderer;
pub use retry::{fetch_with_retry, RetryPolicy};

/// External fetch-and-render collaborator. One session is reused for every
/// slot of a run, one call at a time.
#[async_trait]
pub trait SlotRenderer: Send + Sync {
    /// Page for `slot` scoped to `date`. `Err` is a hard failure (transport,
    /// timeout, markers never appeared); an empty but loaded page is `Ok`.
    async fn render(&self, slot: &SlotConfig, date: NaiveDate) -> Result<Document, FetchError>;

    fn name(&self) -> &'static str;
}

/// Which markers count on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayScope {
    /// Historical elements excluded.
    Today,
    /// Every marker; on a past date all of them are historical.
    Yesterday,
}

pub fn marker_query(cfg: &SlotsConfig, scope: DayScope) -> ClassQuery {
    let q = ClassQuery::new(&cfg.marker_class);
    match scope {
        DayScope::Today => q.excluding(&cfg.historical_class),
        DayScope::Yesterday => q,
    }
}

/// Non-empty marker texts in document order, at most `limit` (0 = no limit).
pub fn collect_values(doc: &Document, query: &ClassQuery, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    for el in doc.select(query) {
        let text = el.text.trim();
        if text.is_empty() {
            continue;
        }
        out.push(text.to_string());
        if limit > 0 && out.len() >= limit {
            break;
        }
    }
    out
}

pub fn empty_result(cfg: &SlotsConfig, slot: &SlotConfig, now: DateTime<Utc>) -> DrawResult {
    let mut r = DrawResult::new(GameKey::new(&slot.key), &slot.display_name, now);
    r.logo_ref = Some(cfg.logo_ref(slot));
    r.draw_time = slot.draw_time.clone();
    r
}

fn fill(result: &mut DrawResult, slot: &SlotConfig, values: Vec<String>, status: DrawStatus) {
    result.numbers = values;
    result.status = status;
    if slot.split_digits {
        result.digits = result
            .principal()
            .map(validate::digits_of)
            .unwrap_or_default();
    }
    let expected = (slot.expected_count > 0).then_some(slot.expected_count);
    validate::finalize(result, expected);
}

/// Resolve one slot: today → yesterday → pending.
///
/// A hard failure on today's page ends the slot as pending with the error
/// attached. Yesterday's page failing only because no markers appeared is
/// treated as nothing published; any other failure there is also reported.
pub async fn resolve_slot<R>(
    renderer: &R,
    cfg: &SlotsConfig,
    slot: &SlotConfig,
    policy: &RetryPolicy,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> CycleEntry
where
    R: SlotRenderer + ?Sized,
{
    let mut result = empty_result(cfg, slot, now);
    result.draw_date = format_date(today, &cfg.fallback_date_format);

    let label = format!("{}@{}", slot.key, today);
    let today_doc = match fetch_with_retry(policy, &label, move || renderer.render(slot, today)).await {
        Ok(doc) => doc,
        Err(e) => {
            result.status = DrawStatus::Pending;
            counter!("slot_pending_total").increment(1);
            return CycleEntry::failed(result, e.to_string());
        }
    };

    let values = collect_values(
        &today_doc,
        &marker_query(cfg, DayScope::Today),
        slot.expected_count,
    );
    if !values.is_empty() {
        fill(&mut result, slot, values, DrawStatus::Completed);
        result.draw_date = draw_date_of(&today_doc, cfg, today);
        log_resolved(&result);
        return CycleEntry::ok(result);
    }

    let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
        result.status = DrawStatus::Pending;
        counter!("slot_pending_total").increment(1);
        return CycleEntry::ok(result);
    };
    tracing::debug!(target: "slots", key = %slot.key, %yesterday, "nothing today, trying yesterday");
    counter!("slot_fallback_total").increment(1);

    let label = format!("{}@{}", slot.key, yesterday);
    let entry = match fetch_with_retry(policy, &label, move || renderer.render(slot, yesterday)).await {
        Ok(doc) => {
            let values = collect_values(
                &doc,
                &marker_query(cfg, DayScope::Yesterday),
                slot.expected_count,
            );
            result.draw_date = draw_date_of(&doc, cfg, today);
            if values.is_empty() {
                result.status = DrawStatus::Pending;
            } else {
                fill(&mut result, slot, values, DrawStatus::PreviousDay);
            }
            CycleEntry::ok(result)
        }
        Err(FetchError::MarkersMissing(_)) => {
            result.draw_date = draw_date_of(&today_doc, cfg, today);
            result.status = DrawStatus::Pending;
            CycleEntry::ok(result)
        }
        Err(e) => {
            result.status = DrawStatus::Pending;
            CycleEntry::failed(result, e.to_string())
        }
    };

    if entry.result.status == DrawStatus::Pending {
        counter!("slot_pending_total").increment(1);
    }
    log_resolved(&entry.result);
    entry
}

fn draw_date_of(doc: &Document, cfg: &SlotsConfig, today: NaiveDate) -> String {
    extract_draw_date(doc.text(), &cfg.date_patterns, today, &cfg.fallback_date_format)
}

fn log_resolved(r: &DrawResult) {
    tracing::info!(
        target: "slots",
        key = %r.game, status = r.status.label(), numbers = %r.numbers_display(),
        draw_date = %r.draw_date,
        "slot resolved"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::markup::Element;

    fn doc(items: &[(&str, &str)]) -> Document {
        let els = items
            .iter()
            .enumerate()
            .map(|(i, (class, text))| Element::new("div", class, *text, i))
            .collect();
        Document::from_elements(els, "")
    }

    #[test]
    fn today_scope_skips_historical_and_stops_at_limit() {
        let cfg = SlotsConfig::default();
        let d = doc(&[
            ("score-shape past-score-ball", "9"),
            ("score-shape", "1"),
            ("score-shape", ""),
            ("score-shape", "2"),
            ("score-shape", "3"),
            ("score-shape", "4"),
        ]);
        let today = collect_values(&d, &marker_query(&cfg, DayScope::Today), 3);
        assert_eq!(today, vec!["1", "2", "3"]);
        let all = collect_values(&d, &marker_query(&cfg, DayScope::Yesterday), 0);
        assert_eq!(all, vec!["9", "1", "2", "3", "4"]);
    }

    #[test]
    fn digit_split_only_for_flagged_slots() {
        let cfg = SlotsConfig::default();
        let slot = cfg.find("juga3_9pm").unwrap();
        let mut r = empty_result(&cfg, slot, Utc::now());
        fill(&mut r, slot, vec!["407".into()], DrawStatus::Completed);
        assert_eq!(r.digits, vec!["4", "0", "7"]);
        assert!(r.valid);
        assert_eq!(r.logo_ref.as_deref(), Some("/logos/juga3.png"));
        assert_eq!(r.draw_time.as_deref(), Some("9:00 PM"));

        let slot = cfg.find("premia2_2pm").unwrap();
        let mut r = empty_result(&cfg, slot, Utc::now());
        fill(&mut r, slot, vec!["12".into()], DrawStatus::Completed);
        assert!(r.digits.is_empty());
        assert!(!r.valid);
    }
}
