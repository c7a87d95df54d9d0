// src/config/mod.rs
pub mod games;
pub mod slots;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

pub use games::{Color, ColorBinding, ColorRule, GameCatalog, GameSpec};
pub use slots::{SlotConfig, SlotsConfig};

pub const ENV_CONFIG_PATH: &str = "LOTO_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/loto.toml";
pub const DEFAULT_JSON_PATH: &str = "config/loto.json";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Retry, timeout and pacing policy for every external fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    /// Pause between consecutive slots.
    pub pacing_ms: u64,
    pub user_agent: String,
}

impl FetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay_ms: 2_000,
            timeout_secs: 30,
            pacing_ms: 1_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Whole-page (color grouping) mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub url: String,
    pub marker_class: String,
    pub color_prefix: String,
    pub date_patterns: Vec<String>,
    pub fallback_date_format: String,
    /// Used to absolutize root-relative logo URLs.
    pub logo_base_url: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: "https://loto.hn".to_string(),
            marker_class: "esferas".to_string(),
            color_prefix: "esfera-".to_string(),
            date_patterns: vec![
                // "Lunes 05 de Enero, 2026 a las 03:00 PM"
                r"(\w+\s+\d{2}\s+de\s+\w+,\s+\d{4}\s+a\s+las\s+\d{2}:\d{2}\s+[AP]M)".to_string(),
                r"(\d{2}\s+de\s+\w+,\s+\d{4})".to_string(),
            ],
            fallback_date_format: "%d/%m/%Y".to_string(),
            logo_base_url: "https://loto.hn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Local time of the publishing site; decides "today" and "yesterday".
    pub timezone_offset_hours: i32,
    pub snapshot_path: PathBuf,
    pub page_snapshot_path: PathBuf,
    pub fetch: FetchConfig,
    pub page: PageConfig,
    pub games: GameCatalog,
    pub slots: SlotsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone_offset_hours: -6,
            snapshot_path: PathBuf::from("resultados_hoy.json"),
            page_snapshot_path: PathBuf::from("resultados_loto_hn.json"),
            fetch: FetchConfig::default(),
            page: PageConfig::default(),
            games: GameCatalog::default(),
            slots: SlotsConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Reject settings that would only fail later, mid-cycle.
    pub fn validate(&self) -> Result<()> {
        for (field, fmt) in [
            ("page.fallback_date_format", &self.page.fallback_date_format),
            ("slots.fallback_date_format", &self.slots.fallback_date_format),
        ] {
            crate::extract::dates::check_date_format(fmt).map_err(|e| anyhow!("{field}: {e}"))?;
        }
        Ok(())
    }

    /// Calendar date at the publishing site for instant `now`.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset()).date_naive()
    }
}

/// Load configuration from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration using env var + fallbacks:
/// 1) $LOTO_CONFIG_PATH
/// 2) config/loto.toml
/// 3) config/loto.json
/// 4) built-in defaults
pub fn load_default() -> Result<EngineConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(EngineConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<EngineConfig> {
    let looks_json = s.trim_start().starts_with('{');
    if hint_ext == "json" || (hint_ext != "toml" && looks_json) {
        if let Ok(v) = serde_json::from_str::<EngineConfig>(s) {
            return Ok(v);
        }
    }
    match toml::from_str::<EngineConfig>(s) {
        Ok(v) => Ok(v),
        Err(toml_err) => serde_json::from_str::<EngineConfig>(s)
            .map_err(|_| anyhow!("unsupported config format: {toml_err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::{env, fs};

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = r#"
timezone_offset_hours = -5

[fetch]
attempts = 5
"#;
        let cfg = parse_config(s, "toml").unwrap();
        assert_eq!(cfg.timezone_offset_hours, -5);
        assert_eq!(cfg.fetch.attempts, 5);
        assert_eq!(cfg.fetch.pacing_ms, 1_000);
        assert_eq!(cfg.slots.table.len(), 13);
    }

    #[test]
    fn json_is_sniffed_without_extension() {
        let cfg = parse_config(r#"{ "fetch": { "timeout_secs": 7 } }"#, "").unwrap();
        assert_eq!(cfg.fetch.timeout_secs, 7);
    }

    #[test]
    fn unknown_date_specifier_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("loto.toml");
        fs::write(&p, "[slots]\nfallback_date_format = \"%d-%Q\"\n").unwrap();

        let err = load_from(&p).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("slots.fallback_date_format"), "{msg}");
        assert!(msg.contains("loto.toml"), "{msg}");
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn local_date_uses_site_offset() {
        let cfg = EngineConfig::default();
        // 03:00 UTC is still the previous evening at UTC-6.
        let now = Utc.with_ymd_and_hms(2026, 1, 6, 3, 0, 0).unwrap();
        assert_eq!(
            cfg.local_date(now),
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so the repo's own config/ is not picked up.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_CONFIG_PATH);

        let v = load_default().unwrap();
        assert_eq!(v, EngineConfig::default());

        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join(DEFAULT_TOML_PATH), "timezone_offset_hours = 0\n").unwrap();
        assert_eq!(load_default().unwrap().timezone_offset_hours, 0);

        let p_env = tmp.path().join("override.json");
        fs::write(&p_env, r#"{ "timezone_offset_hours": 2 }"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(load_default().unwrap().timezone_offset_hours, 2);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
