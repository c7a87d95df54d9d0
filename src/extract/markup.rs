// src/extract/markup.rs
//! Lenient reader for static markup. Produces every element in document
//! order with its attributes and inner text, which is all the extractors
//! need from a page. Real-world HTML is assumed: unclosed tags, void tags
//! without `/>`, entities, inline scripts.

use std::fmt;

use once_cell::sync::OnceCell;
use regex::Regex;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "template", "noscript"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Concatenated descendant text, whitespace collapsed.
    pub text: String,
    /// Index in document order.
    pub position: usize,
}

impl Element {
    pub fn new(tag: impl Into<String>, class: &str, text: impl Into<String>, position: usize) -> Self {
        Self {
            tag: tag.into(),
            attrs: vec![("class".to_string(), class.to_string())],
            text: text.into(),
            position,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn class_attr(&self) -> &str {
        self.attr("class").unwrap_or_default()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_attr().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// `[class*="contains"]:not([class*="exclude"])…` over the raw class attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassQuery {
    pub contains: String,
    pub excludes: Vec<String>,
}

impl ClassQuery {
    pub fn new(contains: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            excludes: Vec::new(),
        }
    }

    pub fn excluding(mut self, class: impl Into<String>) -> Self {
        self.excludes.push(class.into());
        self
    }

    pub fn matches(&self, el: &Element) -> bool {
        let class = el.class_attr();
        class.contains(&self.contains) && !self.excludes.iter().any(|x| class.contains(x.as_str()))
    }
}

impl fmt::Display for ClassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[class*=\"{}\"]", self.contains)?;
        for x in &self.excludes {
            write!(f, ":not([class*=\"{x}\"])")?;
        }
        Ok(())
    }
}

/// A parsed (or externally rendered) page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    elements: Vec<Element>,
    text: String,
}

impl Document {
    /// Build from an already rendered element list, e.g. a browser collaborator.
    pub fn from_elements(elements: Vec<Element>, text: impl Into<String>) -> Self {
        Self {
            elements,
            text: text.into(),
        }
    }

    pub fn parse(markup: &str) -> Self {
        static RE_TOKEN: OnceCell<Regex> = OnceCell::new();
        let re = RE_TOKEN.get_or_init(|| {
            Regex::new(
                r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#,
            )
            .unwrap()
        });

        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut body = String::new();
        let mut pos = 0usize;

        while let Some(caps) = re.captures_at(markup, pos) {
            let Some(whole) = caps.get(0) else { break };
            push_text(&markup[pos..whole.start()], &open, &mut elements, &mut body);
            pos = whole.end();

            // Comments, doctype and processing instructions carry no name.
            let Some(tag) = caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) else {
                continue;
            };

            if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                if let Some(idx) = open.iter().rposition(|&i| elements[i].tag == tag) {
                    open.truncate(idx);
                }
                continue;
            }

            let raw_attrs = caps.get(3).map_or("", |m| m.as_str());
            let self_closing = raw_attrs.trim_end().ends_with('/');
            let position = elements.len();
            elements.push(Element {
                tag: tag.clone(),
                attrs: parse_attrs(raw_attrs),
                text: String::new(),
                position,
            });

            if RAW_TEXT_TAGS.contains(&tag.as_str()) {
                if !self_closing {
                    pos = skip_raw_text(markup, pos, &tag);
                }
            } else if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
                open.push(position);
            }
        }

        push_text(&markup[pos..], &open, &mut elements, &mut body);

        for el in &mut elements {
            el.text = collapse_ws(&el.text);
        }

        Self {
            elements,
            text: collapse_ws(&body),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Visible text of the whole page, whitespace collapsed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn select<'a>(&'a self, query: &'a ClassQuery) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| query.matches(e))
    }

    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements
            .iter()
            .filter(move |e| e.tag.eq_ignore_ascii_case(tag))
    }
}

/// Offset just past `</tag ...>`, or end of input when it never closes.
fn skip_raw_text(markup: &str, from: usize, tag: &str) -> usize {
    let close = format!("</{tag}");
    let rest = markup[from..].to_ascii_lowercase();
    match rest.find(&close) {
        Some(rel) => {
            let at = from + rel;
            markup[at..].find('>').map_or(markup.len(), |gt| at + gt + 1)
        }
        None => markup.len(),
    }
}

fn push_text(raw: &str, open: &[usize], elements: &mut [Element], body: &mut String) {
    if raw.is_empty() {
        return;
    }
    let decoded = html_escape::decode_html_entities(raw);
    for &i in open {
        elements[i].text.push_str(&decoded);
    }
    body.push(' ');
    body.push_str(&decoded);
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    static RE_ATTR: OnceCell<Regex> = OnceCell::new();
    let re = RE_ATTR.get_or_init(|| {
        Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
    });

    re.captures_iter(raw)
        .filter_map(|c| {
            let key = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or("", |m| m.as_str());
            Some((key, html_escape::decode_html_entities(value).to_string()))
        })
        .collect()
}

/// Collapse runs of whitespace (incl. NBSP) to one space and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_text_spans_nested_elements() {
        let doc = Document::parse(
            r#"<div class="esferas esfera-gris"><span> 1&nbsp;2 </span></div><p>x</p>"#,
        );
        let els = doc.elements();
        assert_eq!(els[0].tag, "div");
        assert_eq!(els[0].text, "1 2");
        assert!(els[0].has_class("esfera-gris"));
        assert_eq!(els[1].tag, "span");
        assert_eq!(els[2].text, "x");
    }

    #[test]
    fn void_and_self_closing_tags_do_not_swallow_siblings() {
        let doc = Document::parse(
            r#"<div id=a><img src="/a.png" alt='A'><br/><b>7</b></div><i>8</i>"#,
        );
        let div = &doc.elements()[0];
        assert_eq!(div.attr("id"), Some("a"));
        assert_eq!(div.text, "7");
        let img = doc.by_tag("img").next().unwrap();
        assert_eq!(img.attr("src"), Some("/a.png"));
        assert_eq!(img.attr("alt"), Some("A"));
        assert_eq!(doc.elements().last().unwrap().text, "8");
    }

    #[test]
    fn scripts_and_comments_are_skipped() {
        let doc = Document::parse(
            "<!DOCTYPE html><script>if (a<b) { x = '<div>'; }</script><!-- <p>no</p> --><p>yes</p>",
        );
        assert_eq!(doc.text(), "yes");
        assert_eq!(doc.by_tag("p").count(), 1);
    }

    #[test]
    fn unclosed_elements_still_collect_text() {
        let doc = Document::parse("<ul><li>one<li>two</ul>");
        let li: Vec<_> = doc.by_tag("li").map(|e| e.text.as_str()).collect();
        // The first <li> is never closed, so it also sees its sibling's text.
        assert_eq!(li, vec!["onetwo", "two"]);
    }

    #[test]
    fn class_query_excludes_historical_elements() {
        let doc = Document::parse(
            r#"<div class="score-shape a">1</div><div class="score-shape past-score-ball">2</div>"#,
        );
        let q = ClassQuery::new("score-shape").excluding("past-score-ball");
        let got: Vec<_> = doc.select(&q).map(|e| e.text.as_str()).collect();
        assert_eq!(got, vec!["1"]);
        assert_eq!(
            q.to_string(),
            r#"[class*="score-shape"]:not([class*="past-score-ball"])"#
        );
    }
}
