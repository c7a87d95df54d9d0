// src/extract/types.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One colored draw-ball element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub color: String,
    pub text: String,
    pub position: usize,
}

impl Marker {
    pub fn new(color: impl Into<String>, text: impl Into<String>, position: usize) -> Self {
        Self {
            color: color.into(),
            text: text.into(),
            position,
        }
    }
}

/// Maximal run of consecutive same-color markers. Values keep duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub color: String,
    pub values: Vec<String>,
}

/// Games published on the whole-page results board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageGame {
    Bingo,
    Jugatres,
    Premia2,
    Superpremio,
    Diaria,
    Multix,
    Pega3,
}

impl PageGame {
    pub const ALL: [PageGame; 7] = [
        PageGame::Bingo,
        PageGame::Jugatres,
        PageGame::Premia2,
        PageGame::Superpremio,
        PageGame::Diaria,
        PageGame::Multix,
        PageGame::Pega3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PageGame::Bingo => "bingo",
            PageGame::Jugatres => "jugatres",
            PageGame::Premia2 => "premia2",
            PageGame::Superpremio => "superpremio",
            PageGame::Diaria => "diaria",
            PageGame::Multix => "multix",
            PageGame::Pega3 => "pega3",
        }
    }
}

impl fmt::Display for PageGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a result: a page game (`pega3`) or a slot key (`pega3_2pm`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameKey(String);

impl GameKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<PageGame> for GameKey {
    fn from(g: PageGame) -> Self {
        Self(g.as_str().to_string())
    }
}

impl From<&str> for GameKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    #[default]
    Unknown,
    Completed,
    PreviousDay,
    Pending,
}

impl DrawStatus {
    pub fn label(self) -> &'static str {
        match self {
            DrawStatus::Unknown => "unknown",
            DrawStatus::Completed => "completed",
            DrawStatus::PreviousDay => "previous_day",
            DrawStatus::Pending => "pending",
        }
    }
}

/// Canonical output unit, one per game (page mode) or slot (slot mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    pub game: GameKey,
    pub display_name: String,
    #[serde(default)]
    pub logo_ref: Option<String>,
    /// Never deduplicated; a trailing multiplier token stays at the end.
    #[serde(default)]
    pub numbers: Vec<String>,
    /// Principal value split into single digits, for digit-per-ball games.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub digits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<String>,
    #[serde(default)]
    pub draw_date: String,
    #[serde(default)]
    pub draw_time: Option<String>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub status: DrawStatus,
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DrawResult {
    pub fn new(game: GameKey, display_name: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            game,
            display_name: display_name.into(),
            logo_ref: None,
            numbers: Vec::new(),
            digits: Vec::new(),
            multiplier: None,
            draw_date: String::new(),
            draw_time: None,
            fetched_at,
            status: DrawStatus::Unknown,
            valid: false,
            warning: None,
        }
    }

    /// First winning number, if any. Blank tokens count as absent.
    pub fn principal(&self) -> Option<&str> {
        self.numbers
            .first()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn has_principal(&self) -> bool {
        self.principal().is_some()
    }

    /// Numbers joined the way they are shown to people.
    pub fn numbers_display(&self) -> String {
        if self.numbers.is_empty() {
            "—".to_string()
        } else {
            self.numbers.join(" - ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 21, 0, 0).unwrap()
    }

    #[test]
    fn principal_ignores_blank_first_token() {
        let mut r = DrawResult::new("pega3_2pm".into(), "Pega 3 2:00 PM", ts());
        assert_eq!(r.principal(), None);
        r.numbers = vec!["  ".into(), "5".into()];
        assert!(!r.has_principal());
        r.numbers = vec!["07".into(), "5".into()];
        assert_eq!(r.principal(), Some("07"));
    }

    #[test]
    fn serializes_keys_and_status_as_plain_strings() {
        let mut r = DrawResult::new(PageGame::Premia2.into(), "Premia 2", ts());
        r.status = DrawStatus::PreviousDay;
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["game"], serde_json::json!("premia2"));
        assert_eq!(v["status"], serde_json::json!("previous_day"));
        assert!(v.get("digits").is_none());
        assert!(v.get("warning").is_none());
    }
}
