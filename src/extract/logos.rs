// src/extract/logos.rs
use std::collections::HashMap;

use crate::config::games::GameCatalog;
use crate::extract::markup::{Document, Element};
use crate::extract::types::PageGame;

/// Lazy-loading attributes first; plain `src` is often a placeholder.
fn image_source(img: &Element) -> Option<&str> {
    ["data-lazy-src", "data-src", "src"]
        .iter()
        .filter_map(|a| img.attr(a))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub fn absolutize(src: &str, base_url: &str) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else if src.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), src)
    } else {
        src.to_string()
    }
}

/// Match each `img` against the catalog's logo keywords (catalog order is the
/// priority order). The first image found for a game wins.
pub fn discover_logos(
    doc: &Document,
    catalog: &GameCatalog,
    base_url: &str,
) -> HashMap<PageGame, String> {
    let mut found: HashMap<PageGame, String> = HashMap::new();

    for img in doc.by_tag("img") {
        let Some(src) = image_source(img) else {
            continue;
        };
        if src.contains("data:image/svg") {
            continue;
        }
        let haystack = format!(
            "{} {} {}",
            src,
            img.attr("alt").unwrap_or_default(),
            img.attr("title").unwrap_or_default()
        )
        .to_uppercase();

        let hit = catalog.games.iter().find(|g| {
            !found.contains_key(&g.game)
                && g
                    .logo_keyword
                    .as_deref()
                    .is_some_and(|k| !k.is_empty() && haystack.contains(&k.to_uppercase()))
        });
        if let Some(spec) = hit {
            let url = absolutize(src, base_url);
            tracing::debug!(target: "extract", game = %spec.game, %url, "logo");
            found.insert(spec.game, url);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_lazy_source_and_skips_svg_placeholders() {
        let doc = Document::parse(
            r#"
            <img src="data:image/svg+xml;base64,AAA" alt="PEGA 3">
            <img src="data:image/svg+xml;base64,AAA" data-lazy-src="/img/pega3.png" alt="Pega 3">
            <img src="//cdn.loto.hn/diaria.png">
            "#,
        );
        let logos = discover_logos(&doc, &GameCatalog::default(), "https://loto.hn/");
        assert_eq!(logos[&PageGame::Pega3], "https://loto.hn/img/pega3.png");
        assert_eq!(logos[&PageGame::Diaria], "https://cdn.loto.hn/diaria.png");
        assert_eq!(logos.len(), 2);
    }

    #[test]
    fn first_image_per_game_wins_and_later_keywords_are_tried() {
        let doc = Document::parse(
            r#"
            <img src="https://x/super-premio.png">
            <img src="https://x/other.png" title="Loto Super Premio">
            <img src="https://x/juga-super.png">
            "#,
        );
        let logos = discover_logos(&doc, &GameCatalog::default(), "https://loto.hn");
        assert_eq!(logos[&PageGame::Superpremio], "https://x/super-premio.png");
        // SUPER is taken, so JUGA still gets this image.
        assert_eq!(logos[&PageGame::Jugatres], "https://x/juga-super.png");
    }
}
