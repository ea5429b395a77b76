//! Leaderboard derived from duck snapshots.
//!
//! Both ends compute it from the same `DuckState`s, so it lives next to the
//! wire types rather than in the simulation.

use std::fmt;

use crate::{DuckState, PlayerId};

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub scale: f32,
    /// `scale * 100`, truncated.
    pub score: u32,
}

/// Ducks ranked by size, largest first. Ties go to the lower player id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scoreboard {
    entries: Vec<ScoreEntry>,
}

impl Scoreboard {
    pub fn from_ducks<'a>(ducks: impl IntoIterator<Item = &'a DuckState>) -> Self {
        let mut entries: Vec<ScoreEntry> = ducks
            .into_iter()
            .map(|duck| ScoreEntry {
                player_id: duck.id,
                name: duck.name.clone(),
                scale: duck.scale,
                score: score_for(duck.scale),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.scale
                .total_cmp(&a.scale)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn leader(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }

    /// 1-based rank of a player, if present.
    pub fn rank_of(&self, player_id: PlayerId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.player_id == player_id)
            .map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Score shown to players for a given scale: `scale * 100`, truncated.
pub fn score_for(scale: f32) -> u32 {
    (scale * 100.0).trunc().max(0.0) as u32
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>2}. {:<16} {:>6}", i + 1, entry.name, entry.score)?;
        }
        Ok(())
    }
}
