// src/extract/mod.rs
//! Whole-page extraction: markup → markers → runs → games → validated results.
//! Everything here is synchronous and pure apart from logging and metrics.

pub mod classify;
pub mod dates;
pub mod logos;
pub mod markers;
pub mod markup;
pub mod runs;
pub mod types;
pub mod validate;

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::{GameCatalog, PageConfig};

pub use classify::{classify_runs, ClassifyState, Classified, DropReason, DroppedRun};
pub use markers::{extract_markers, MarkerSelector};
pub use markup::{ClassQuery, Document, Element};
pub use runs::group_runs;
pub use types::{DrawResult, DrawStatus, GameKey, Marker, PageGame, Run};

/// Outcome of one whole-page pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PageExtraction {
    /// One per game found on the page, in first-seen order.
    pub results: Vec<DrawResult>,
    pub dropped: Vec<DroppedRun>,
    pub draw_date: String,
    pub marker_count: usize,
}

impl PageExtraction {
    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.valid).count()
    }

    pub fn warning_count(&self) -> usize {
        self.results.iter().filter(|r| r.warning.is_some()).count()
    }

    /// Catalog games the page did not show, in catalog order.
    pub fn missing<'a>(&'a self, catalog: &'a GameCatalog) -> impl Iterator<Item = PageGame> + 'a {
        catalog
            .games
            .iter()
            .map(|g| g.game)
            .filter(move |g| !self.results.iter().any(|r| r.game == GameKey::from(*g)))
    }
}

/// Empty placeholder for a game that produced nothing this cycle.
pub fn pending_result(
    game: PageGame,
    catalog: &GameCatalog,
    draw_date: &str,
    now: DateTime<Utc>,
) -> DrawResult {
    let mut r = DrawResult::new(game.into(), catalog.display_name(game), now);
    r.draw_date = draw_date.to_string();
    r.status = DrawStatus::Pending;
    r
}

pub fn extract_page(
    doc: &Document,
    page: &PageConfig,
    catalog: &GameCatalog,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> PageExtraction {
    let today = now.with_timezone(&offset).date_naive();
    let draw_date =
        dates::extract_draw_date(doc.text(), &page.date_patterns, today, &page.fallback_date_format);
    let logos = logos::discover_logos(doc, catalog, &page.logo_base_url);

    let selector = MarkerSelector::new(&page.marker_class, &page.color_prefix);
    let markers = extract_markers(doc, &selector);
    let runs = group_runs(&markers);
    tracing::info!(
        target: "extract",
        markers = markers.len(), runs = runs.len(), %draw_date,
        "page grouped"
    );

    let state = classify_runs(&runs, catalog);

    let results = state
        .results
        .into_iter()
        .map(|c| {
            let mut r = DrawResult::new(c.game.into(), catalog.display_name(c.game), now);
            r.logo_ref = logos.get(&c.game).cloned();
            r.numbers = c.numbers;
            r.draw_date = draw_date.clone();
            // Validation runs on the merged numbers, after every continuation.
            validate::finalize(&mut r, catalog.expected_count(c.game));
            r.status = if r.has_principal() {
                DrawStatus::Completed
            } else {
                DrawStatus::Pending
            };
            tracing::info!(
                target: "extract",
                game = %r.game, numbers = %r.numbers_display(), valid = r.valid,
                "game extracted"
            );
            r
        })
        .collect();

    PageExtraction {
        results,
        dropped: state.dropped,
        draw_date,
        marker_count: markers.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn page_pipeline_end_to_end() {
        let html = r#"
        <p>Lunes 05 de Enero, 2026 a las 09:00 PM</p>
        <div class="esferas esfera-azul"><span>1</span></div>
        <div class="esferas esfera-azul"><span>1</span></div>
        <div class="esferas esfera-azul"><span>9</span></div>
        <div class="esferas esfera-marron"><span>4x</span></div>
        <div class="esferas esfera-naranja"><span>5</span></div>
        "#;
        let cfg = crate::config::EngineConfig::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 6, 4, 0, 0).unwrap();
        let out = extract_page(
            &Document::parse(html),
            &cfg.page,
            &cfg.games,
            now,
            cfg.offset(),
        );

        assert_eq!(out.marker_count, 5);
        assert_eq!(out.draw_date, "Lunes 05 de Enero, 2026 a las 09:00 PM");
        assert_eq!(out.results.len(), 2);
        assert_eq!(out.results[0].numbers, vec!["1", "1", "9"]);
        assert!(out.results[0].valid);
        assert_eq!(out.results[1].multiplier, None);
        assert_eq!(out.results[1].numbers, vec!["4x"]);
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.valid_count(), 2);
        assert_eq!(out.missing(&cfg.games).count(), 5);
    }

    #[test]
    fn broken_fallback_format_still_extracts() {
        let mut cfg = crate::config::EngineConfig::default();
        cfg.page.fallback_date_format = "%Q".to_string();
        let html = r#"<div class="esferas esfera-azul"><span>4</span></div>"#;
        let now = Utc.with_ymd_and_hms(2026, 1, 7, 18, 0, 0).unwrap();
        let out = extract_page(&Document::parse(html), &cfg.page, &cfg.games, now, cfg.offset());
        assert_eq!(out.draw_date, "2026-01-07");
        assert_eq!(out.results[0].numbers, vec!["4"]);
    }
}
