// src/extract/dates.rs
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Used when a configured format cannot render a date.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Compiled date patterns keyed by source; `None` marks a pattern that failed to compile.
static PATTERNS: Lazy<Mutex<HashMap<String, Option<Regex>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn compiled(pattern: &str) -> Option<Regex> {
    if let Ok(cache) = PATTERNS.lock() {
        if let Some(hit) = cache.get(pattern) {
            return hit.clone();
        }
    }
    let re = match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(target: "extract", %pattern, error = %e, "invalid date pattern");
            None
        }
    };
    if let Ok(mut cache) = PATTERNS.lock() {
        cache.insert(pattern.to_string(), re.clone());
    }
    re
}

/// `Err` with the offending format when chrono cannot parse it.
pub fn check_date_format(fmt: &str) -> Result<(), String> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        Err(format!("invalid date format `{fmt}`"))
    } else {
        Ok(())
    }
}

/// `date` in `fmt`, or ISO `YYYY-MM-DD` when `fmt` is unusable.
pub fn format_date(date: NaiveDate, fmt: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(fmt)).is_ok() {
        return out;
    }
    tracing::warn!(target: "extract", format = %fmt, "unusable date format, using ISO");
    date.format(ISO_DATE_FORMAT).to_string()
}

/// First capture of the first matching pattern, else `today` in `fallback_fmt`.
/// Patterns that fail to compile are skipped; each pattern is compiled once per process.
pub fn extract_draw_date(
    text: &str,
    patterns: &[String],
    today: NaiveDate,
    fallback_fmt: &str,
) -> String {
    for p in patterns {
        let Some(re) = compiled(p) else {
            continue;
        };
        if let Some(caps) = re.captures(text) {
            let m = caps.get(1).or_else(|| caps.get(0));
            if let Some(m) = m {
                return m.as_str().trim().to_string();
            }
        }
    }
    format_date(today, fallback_fmt)
}
