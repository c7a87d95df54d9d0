// src/extract/markers.rs
use metrics::counter;

use crate::extract::markup::Document;
use crate::extract::types::Marker;

/// Which elements are draw balls and where their color lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSelector {
    /// Exact class token carried by every ball, e.g. `esferas`.
    pub marker_class: String,
    /// Prefix of the color class, e.g. `esfera-` in `esfera-gris`.
    pub color_prefix: String,
}

impl MarkerSelector {
    pub fn new(marker_class: impl Into<String>, color_prefix: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
            color_prefix: color_prefix.into(),
        }
    }

    /// `esfera-gris` → `gris`; `esfera-amarillo-big` → `amarillo`.
    pub fn color_from_class(&self, class: &str) -> Option<String> {
        if class == self.marker_class || !class.contains(&self.color_prefix) {
            return None;
        }
        let stripped = class.replace(&self.color_prefix, "");
        let color = stripped.split('-').next().unwrap_or_default().to_lowercase();
        (!color.is_empty()).then_some(color)
    }
}

/// Ordered markers of a page. Elements without a color or text are skipped.
pub fn extract_markers(doc: &Document, selector: &MarkerSelector) -> Vec<Marker> {
    let mut out = Vec::new();
    for el in doc.elements() {
        if !el.has_class(&selector.marker_class) {
            continue;
        }
        let Some(color) = el.classes().find_map(|c| selector.color_from_class(c)) else {
            tracing::trace!(target: "extract", position = el.position, "marker without color");
            continue;
        };
        // Ball text is a single token; drop any inner whitespace.
        let text: String = el.text.split_whitespace().collect();
        if text.is_empty() {
            continue;
        }
        tracing::debug!(target: "extract", %color, %text, position = el.position, "marker");
        out.push(Marker::new(color, text, el.position));
    }
    counter!("extract_markers_total").increment(out.len() as u64);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel() -> MarkerSelector {
        MarkerSelector::new("esferas", "esfera-")
    }

    #[test]
    fn color_comes_from_prefixed_class() {
        let s = sel();
        assert_eq!(s.color_from_class("esfera-gris"), Some("gris".into()));
        assert_eq!(s.color_from_class("esfera-Amarillo-lg"), Some("amarillo".into()));
        assert_eq!(s.color_from_class("esferas"), None);
        assert_eq!(s.color_from_class("ball"), None);
    }

    #[test]
    fn markers_keep_document_order_and_skip_noise() {
        let doc = Document::parse(
            r#"
            <div class="esferas esfera-gris"><span>12</span></div>
            <div class="esferas"><span>99</span></div>
            <div class="esferas esfera-azul"><span>  </span></div>
            <div class="esferas esfera-azul"><span> 0 7 </span></div>
            <div class="other esfera-rojo"><span>3</span></div>
            "#,
        );
        let m = extract_markers(&doc, &sel());
        assert_eq!(m.len(), 2);
        assert_eq!((m[0].color.as_str(), m[0].text.as_str()), ("gris", "12"));
        assert_eq!((m[1].color.as_str(), m[1].text.as_str()), ("azul", "07"));
        assert!(m[0].position < m[1].position);
    }
}
