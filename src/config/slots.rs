// src/config/slots.rs
use serde::{Deserialize, Serialize};

/// One independently fetched game + draw time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub key: String,
    pub display_name: String,
    /// Path under `SlotsConfig::base_url`; the date is passed as `?date=YYYY-MM-DD`.
    pub path: String,
    /// None for once-daily games.
    #[serde(default)]
    pub draw_time: Option<String>,
    /// Marker texts collected before stopping.
    pub expected_count: usize,
    /// Logo file name under `SlotsConfig::logo_prefix`; defaults to `<key>.png`.
    #[serde(default)]
    pub logo: Option<String>,
    /// Principal value is also exposed digit by digit.
    #[serde(default)]
    pub split_digits: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    pub base_url: String,
    pub marker_class: String,
    pub historical_class: String,
    pub date_patterns: Vec<String>,
    pub fallback_date_format: String,
    pub logo_prefix: String,
    pub table: Vec<SlotConfig>,
}

impl SlotsConfig {
    pub fn logo_ref(&self, slot: &SlotConfig) -> String {
        match &slot.logo {
            Some(file) => format!("{}{}", self.logo_prefix, file),
            None => format!("{}{}.png", self.logo_prefix, slot.key),
        }
    }

    pub fn find(&self, key: &str) -> Option<&SlotConfig> {
        self.table.iter().find(|s| s.key == key)
    }
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://loteriasdehonduras.com".to_string(),
            marker_class: "score-shape".to_string(),
            historical_class: "past-score-ball".to_string(),
            date_patterns: vec![r"\b(\d{2}-\d{2})\b".to_string()],
            fallback_date_format: "%d-%m".to_string(),
            logo_prefix: "/logos/".to_string(),
            table: default_table(),
        }
    }
}

fn slot(
    key: &str,
    name: &str,
    path: &str,
    time: Option<&str>,
    expected: usize,
    logo: &str,
) -> SlotConfig {
    SlotConfig {
        key: key.to_string(),
        display_name: name.to_string(),
        path: path.to_string(),
        draw_time: time.map(str::to_string),
        expected_count: expected,
        logo: Some(logo.to_string()),
        split_digits: key.starts_with("juga3"),
    }
}

/// Published slots, in fetch order.
pub fn default_table() -> Vec<SlotConfig> {
    vec![
        slot("juga3_11am", "Jugá 3 11:00 AM", "/loto-hn/juga-3-11am", Some("11:00 AM"), 1, "juga3.png"),
        slot("juga3_3pm", "Jugá 3 3:00 PM", "/loto-hn/juga-3-3pm", Some("3:00 PM"), 1, "juga3.png"),
        slot("juga3_9pm", "Jugá 3 9:00 PM", "/loto-hn/juga-3-9pm", Some("9:00 PM"), 1, "juga3.png"),
        slot("premia2_10am", "Premia 2 10:00 AM", "/loto-hn/premia2-10am", Some("10:00 AM"), 2, "premia2.png"),
        slot("premia2_2pm", "Premia 2 2:00 PM", "/loto-hn/premia2-2pm", Some("2:00 PM"), 2, "premia2.png"),
        slot("premia2_9pm", "Premia 2 9:00 PM", "/loto-hn/premia2-9pm", Some("9:00 PM"), 2, "premia2.png"),
        slot("pega3_10am", "Pega 3 10:00 AM", "/loto-hn/pega-3-10am", Some("10:00 AM"), 3, "pega3.png"),
        slot("pega3_2pm", "Pega 3 2:00 PM", "/loto-hn/pega-3-2pm", Some("2:00 PM"), 3, "pega3.png"),
        slot("pega3_9pm", "Pega 3 9:00 PM", "/loto-hn/pega-3-9pm", Some("9:00 PM"), 3, "pega3.png"),
        slot("la_diaria_10am", "La Diaria 10:00 AM", "/loto-hn/la-diaria-10am", Some("10:00 AM"), 3, "la_diaria.png"),
        slot("la_diaria_2pm", "La Diaria 2:00 PM", "/loto-hn/la-diaria-2pm", Some("2:00 PM"), 3, "la_diaria.png"),
        slot("la_diaria_9pm", "La Diaria 9:00 PM", "/loto-hn/la-diaria-9pm", Some("9:00 PM"), 3, "la_diaria.png"),
        slot("super_premio", "Super Premio", "/loto-hn/loto-super-premio", None, 6, "super_premio.png"),
    ]
}
