// src/config/games.rs
//! Whole-page game catalog: the color palette, the color → game rule table
//! and per-game display data. Supplied to the classifier and validator as a
//! value so tests can swap any part of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::types::PageGame;

/// Canonical marker colors after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Gray,
    Yellow,
    Purple,
    Green,
    Maroon,
    Red,
    Blue,
    Pink,
}

/// How a run of one color is turned into a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorRule {
    /// The nth run of this color on the page is the nth game; later runs are unmapped.
    Sequence { games: Vec<PageGame> },
    /// Appends to `game` when it already exists, otherwise starts it.
    Continuation { game: PageGame },
    /// Always `game` (still merged by key when it repeats).
    Fixed { game: PageGame },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBinding {
    pub color: Color,
    pub rule: ColorRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSpec {
    pub game: PageGame,
    pub display_name: String,
    #[serde(default)]
    pub expected_count: Option<usize>,
    /// Upper-case keyword searched in logo `src alt title`.
    #[serde(default)]
    pub logo_keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameCatalog {
    /// Raw color token (as found in the class name) → canonical color.
    pub palette: BTreeMap<String, Color>,
    pub rules: Vec<ColorBinding>,
    /// Listed in logo keyword priority order.
    pub games: Vec<GameSpec>,
}

impl GameCatalog {
    pub fn color_of(&self, raw: &str) -> Option<Color> {
        self.palette.get(&raw.trim().to_lowercase()).copied()
    }

    pub fn rule_for(&self, color: Color) -> Option<&ColorRule> {
        self.rules
            .iter()
            .find(|b| b.color == color)
            .map(|b| &b.rule)
    }

    pub fn spec(&self, game: PageGame) -> Option<&GameSpec> {
        self.games.iter().find(|g| g.game == game)
    }

    pub fn display_name(&self, game: PageGame) -> String {
        self.spec(game)
            .map(|g| g.display_name.clone())
            .unwrap_or_else(|| game.as_str().to_string())
    }

    pub fn expected_count(&self, game: PageGame) -> Option<usize> {
        self.spec(game).and_then(|g| g.expected_count)
    }
}

impl Default for GameCatalog {
    fn default() -> Self {
        let palette = [
            ("gris", Color::Gray),
            ("gray", Color::Gray),
            ("grey", Color::Gray),
            ("amarillo", Color::Yellow),
            ("yellow", Color::Yellow),
            ("morado", Color::Purple),
            ("purple", Color::Purple),
            ("verde", Color::Green),
            ("light", Color::Green),
            ("green", Color::Green),
            ("marron", Color::Maroon),
            ("maroon", Color::Maroon),
            ("brown", Color::Maroon),
            ("rojo", Color::Red),
            ("red", Color::Red),
            ("azul", Color::Blue),
            ("blue", Color::Blue),
            ("rosa", Color::Pink),
            ("pink", Color::Pink),
        ]
        .into_iter()
        .map(|(k, c)| (k.to_string(), c))
        .collect();

        let rules = vec![
            ColorBinding {
                color: Color::Gray,
                rule: ColorRule::Sequence {
                    games: vec![PageGame::Bingo, PageGame::Jugatres],
                },
            },
            ColorBinding {
                color: Color::Yellow,
                rule: ColorRule::Sequence {
                    games: vec![PageGame::Premia2, PageGame::Superpremio],
                },
            },
            ColorBinding {
                color: Color::Purple,
                rule: ColorRule::Continuation {
                    game: PageGame::Premia2,
                },
            },
            ColorBinding {
                color: Color::Green,
                rule: ColorRule::Continuation {
                    game: PageGame::Diaria,
                },
            },
            ColorBinding {
                color: Color::Maroon,
                rule: ColorRule::Fixed {
                    game: PageGame::Multix,
                },
            },
            ColorBinding {
                color: Color::Red,
                rule: ColorRule::Fixed {
                    game: PageGame::Multix,
                },
            },
            ColorBinding {
                color: Color::Blue,
                rule: ColorRule::Fixed {
                    game: PageGame::Pega3,
                },
            },
            ColorBinding {
                color: Color::Pink,
                rule: ColorRule::Fixed {
                    game: PageGame::Jugatres,
                },
            },
        ];

        let game = |game, name: &str, expected, keyword: &str| GameSpec {
            game,
            display_name: name.to_string(),
            expected_count: Some(expected),
            logo_keyword: Some(keyword.to_string()),
        };
        let games = vec![
            game(PageGame::Bingo, "Bingo Con Todo", 7, "BINGO"),
            game(PageGame::Diaria, "La Diaria", 3, "DIARIA"),
            game(PageGame::Multix, "Multi-X", 1, "MULTI"),
            game(PageGame::Pega3, "Pega 3", 3, "PEGA"),
            // 2 yellow + 2 purple balls
            game(PageGame::Premia2, "Premia 2", 4, "PREMIA"),
            game(PageGame::Superpremio, "Loto Super Premio", 6, "SUPER"),
            game(PageGame::Jugatres, "Juga Tres", 3, "JUGA"),
        ];

        Self {
            palette,
            rules,
            games,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_and_english_tokens_resolve_to_same_color() {
        let c = GameCatalog::default();
        assert_eq!(c.color_of("gris"), Some(Color::Gray));
        assert_eq!(c.color_of("Gray"), Some(Color::Gray));
        assert_eq!(c.color_of("light"), Some(Color::Green));
        assert_eq!(c.color_of("naranja"), None);
    }

    #[test]
    fn default_catalog_covers_every_page_game() {
        let c = GameCatalog::default();
        for g in PageGame::ALL {
            assert!(c.spec(g).is_some(), "missing spec for {g}");
        }
        assert_eq!(c.expected_count(PageGame::Bingo), Some(7));
        assert_eq!(c.display_name(PageGame::Superpremio), "Loto Super Premio");
    }

    #[test]
    fn rules_parse_from_toml() {
        let s = r#"
[palette]
naranja = "red"

[[rules]]
color = "gray"
rule = { kind = "sequence", games = ["jugatres", "bingo"] }

[[rules]]
color = "red"
rule = { kind = "fixed", game = "multix" }
"#;
        let c: GameCatalog = toml::from_str(s).unwrap();
        assert_eq!(c.color_of("naranja"), Some(Color::Red));
        assert_eq!(
            c.rule_for(Color::Gray),
            Some(&ColorRule::Sequence {
                games: vec![PageGame::Jugatres, PageGame::Bingo]
            })
        );
        // Unspecified sections keep their defaults.
        assert_eq!(c.games, GameCatalog::default().games);
    }
}
