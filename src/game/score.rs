//! Score Aggregator
//!
//! End-of-match records and the final ranking.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::participant::{ParticipantId, VariantIndex};
use crate::TICK_RATE;

/// Captured result for one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Ticks spent as an active fighter
    pub survival_ticks: u32,
    /// Lives at match end (negative if eliminated)
    pub lives: i32,
    /// Cosmetic variant, for the end screen
    pub variant: VariantIndex,
}

impl ScoreRecord {
    /// Survival time in seconds.
    pub fn survival_seconds(&self) -> f32 {
        self.survival_ticks as f32 / TICK_RATE as f32
    }

    /// More lives first; among equal lives, less time exposed as a fighter.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .lives
            .cmp(&self.lives)
            .then(self.survival_ticks.cmp(&other.survival_ticks))
    }
}

/// Score records for the current match.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    records: BTreeMap<ParticipantId, ScoreRecord>,
}

impl ScoreBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a participant's result. First write wins; returns false on duplicates.
    pub fn record(
        &mut self,
        id: ParticipantId,
        survival_ticks: u32,
        lives: i32,
        variant: VariantIndex,
    ) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.records.insert(id, ScoreRecord { survival_ticks, lives, variant });
        true
    }

    /// Participant ids, best first.
    ///
    /// Ties on (lives, survival time) fall back to id order, so the ranking
    /// only depends on record content.
    pub fn rank(&self) -> Vec<ParticipantId> {
        let mut entries: Vec<(&ParticipantId, &ScoreRecord)> = self.records.iter().collect();
        entries.sort_by(|(id_a, a), (id_b, b)| a.rank_cmp(b).then(id_a.cmp(id_b)));
        entries.into_iter().map(|(id, _)| *id).collect()
    }

    /// Ranking with 1-based placements.
    pub fn placements(&self) -> Vec<(u8, ParticipantId, ScoreRecord)> {
        self.rank()
            .into_iter()
            .enumerate()
            .filter_map(|(i, id)| self.records.get(&id).map(|r| (i as u8 + 1, id, *r)))
            .collect()
    }

    /// Look up one record.
    pub fn get(&self, id: ParticipantId) -> Option<&ScoreRecord> {
        self.records.get(&id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records yet?
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clear every record.
    pub fn reset(&mut self) {
        self.records.clear();
    }
}
