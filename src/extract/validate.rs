// src/extract/validate.rs
use metrics::counter;

use crate::extract::types::DrawResult;

/// Multiplier-like token: contains an `x` (any case) and is at most 3 chars, e.g. `2x`, `X10`.
pub fn is_multiplier(token: &str) -> bool {
    let t = token.trim();
    t.chars().count() <= 3 && t.chars().any(|c| c.eq_ignore_ascii_case(&'x'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Plain numbers followed by the multiplier, if one was isolated.
    pub numbers: Vec<String>,
    pub multiplier: Option<String>,
}

/// Pull the first multiplier token out and re-append it at the end.
/// When nothing but the multiplier would remain, the input is returned as is.
pub fn split_multiplier(numbers: &[String]) -> Split {
    let Some(idx) = numbers.iter().position(|n| is_multiplier(n)) else {
        return Split {
            numbers: numbers.to_vec(),
            multiplier: None,
        };
    };

    let mut plain: Vec<String> = numbers.to_vec();
    let mult = plain.remove(idx);
    if plain.is_empty() {
        return Split {
            numbers: numbers.to_vec(),
            multiplier: None,
        };
    }
    plain.push(mult.clone());
    Split {
        numbers: plain,
        multiplier: Some(mult),
    }
}

/// `None` when the count matches (or nothing is expected), otherwise the warning text.
pub fn validate_count(found: usize, expected: Option<usize>) -> Option<String> {
    match expected {
        Some(n) if n != found => Some(format!("expected {n} numbers, found {found}")),
        _ => None,
    }
}

/// `"123"` → `["1","2","3"]`; anything not purely ASCII digits yields nothing.
pub fn digits_of(value: &str) -> Vec<String> {
    let v = value.trim();
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return Vec::new();
    }
    v.chars().map(String::from).collect()
}

/// Split the multiplier and set `valid`/`warning`. Without an expected count
/// every result is valid. With one, an empty result is invalid but carries no
/// warning; its absence is reported by reconciliation instead.
pub fn finalize(result: &mut DrawResult, expected: Option<usize>) {
    let split = split_multiplier(&result.numbers);
    result.numbers = split.numbers;
    result.multiplier = split.multiplier;

    if result.numbers.is_empty() && expected.is_some() {
        result.valid = false;
        result.warning = None;
        return;
    }

    result.warning = validate_count(result.numbers.len(), expected);
    result.valid = result.warning.is_none();
    if let Some(w) = &result.warning {
        counter!("extract_validation_mismatch_total").increment(1);
        tracing::warn!(target: "extract", game = %result.game, warning = %w, numbers = ?result.numbers, "cardinality mismatch");
    }
}
