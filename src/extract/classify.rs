// src/extract/classify.rs
//! Run → game resolution. A small state machine keyed by
//! `(color, nth occurrence of that color)`; counters live in the state value
//! and start from zero for every page.
//!
//! The purple/green continuation rules guess at how the board is laid out.
//! If the upstream markup changes they can silently merge unrelated runs;
//! they are kept exactly as observed until the page exposes a per-game id.

use std::collections::HashMap;

use metrics::counter;

use crate::config::games::{Color, ColorRule, GameCatalog};
use crate::extract::types::{PageGame, Run};

/// Numbers gathered for one game, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub game: PageGame,
    pub numbers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Color token not in the palette.
    UnknownColor,
    /// Palette knows the color, the rule table does not.
    NoRule(Color),
    /// More runs of a sequenced color than games mapped to it.
    SequenceExhausted { color: Color, occurrence: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRun {
    pub run: Run,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyState {
    occurrences: HashMap<Color, usize>,
    pub results: Vec<Classified>,
    pub dropped: Vec<DroppedRun>,
}

impl ClassifyState {
    pub fn occurrences(&self, color: Color) -> usize {
        self.occurrences.get(&color).copied().unwrap_or(0)
    }

    pub fn get(&self, game: PageGame) -> Option<&Classified> {
        self.results.iter().find(|c| c.game == game)
    }

    /// Apply one run. Pure with respect to everything but `self`.
    pub fn step(mut self, run: &Run, catalog: &GameCatalog) -> Self {
        let Some(color) = catalog.color_of(&run.color) else {
            return self.drop_run(run, DropReason::UnknownColor);
        };

        let (game, continuation) = match catalog.rule_for(color) {
            None => return self.drop_run(run, DropReason::NoRule(color)),
            Some(ColorRule::Sequence { games }) => {
                let n = self.occurrences.entry(color).or_insert(0);
                *n += 1;
                let occurrence = *n;
                match games.get(occurrence - 1) {
                    Some(g) => (*g, false),
                    None => {
                        return self.drop_run(
                            run,
                            DropReason::SequenceExhausted { color, occurrence },
                        )
                    }
                }
            }
            Some(ColorRule::Continuation { game }) => (*game, true),
            Some(ColorRule::Fixed { game }) => (*game, false),
        };

        match self.results.iter_mut().find(|c| c.game == game) {
            Some(existing) => {
                tracing::debug!(
                    target: "extract",
                    %game, color = %run.color, continuation, values = ?run.values,
                    "appending run to existing game"
                );
                existing.numbers.extend(run.values.iter().cloned());
            }
            None => {
                tracing::debug!(
                    target: "extract",
                    %game, color = %run.color, values = ?run.values,
                    "new game from run"
                );
                self.results.push(Classified {
                    game,
                    numbers: run.values.clone(),
                });
            }
        }
        self
    }

    fn drop_run(mut self, run: &Run, reason: DropReason) -> Self {
        tracing::warn!(
            target: "extract",
            color = %run.color, values = ?run.values, reason = ?reason,
            "unmapped run dropped"
        );
        counter!("extract_runs_dropped_total").increment(1);
        self.dropped.push(DroppedRun {
            run: run.clone(),
            reason,
        });
        self
    }
}

/// Classify the runs of one page, in document order.
pub fn classify_runs(runs: &[Run], catalog: &GameCatalog) -> ClassifyState {
    counter!("extract_runs_total").increment(runs.len() as u64);
    runs.iter()
        .fold(ClassifyState::default(), |state, run| state.step(run, catalog))
}
