//! Match Snapshot
//!
//! Read-only view of the match for the presentation layer (HUD, end screen).

use serde::{Serialize, Deserialize};

use crate::game::participant::{ParticipantId, Placement, Role, VariantIndex};
use crate::game::score::ScoreRecord;
use crate::game::state::{MatchPhase, MatchState};

/// One participant as the HUD sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantView {
    /// Participant ID
    pub id: ParticipantId,
    /// God or fighter (none before the match starts)
    pub role: Option<Role>,
    /// Character variant
    pub variant: VariantIndex,
    /// Lives left (zero is the last life)
    pub lives: i32,
    /// Lives as displayed (the last life counts as one)
    pub visual_lives: i32,
    /// Current health
    pub health: i32,
    /// Health after a restore
    pub max_health: i32,
    /// Still in the match?
    pub alive: bool,
    /// Where the participant stands
    pub placement: Placement,
    /// Ticks survived before elimination
    pub survival_ticks: u32,
}

/// Snapshot of a match at one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Tick the snapshot was taken on
    pub tick: u32,
    /// Current phase
    pub phase: MatchPhase,
    /// Current god
    pub god: Option<ParticipantId>,
    /// Ticks left before a forced swap
    pub round_ticks_remaining: u32,
    /// Round timer counting?
    pub round_timer_running: bool,
    /// Every joined participant, by id
    pub participants: Vec<ParticipantView>,
    /// End-of-match placements (empty until the match ends)
    pub placements: Vec<(u8, ParticipantId, ScoreRecord)>,
}

impl MatchSnapshot {
    /// Capture the current state.
    pub fn capture(state: &MatchState) -> Self {
        let participants = state
            .registry
            .roster()
            .map(|p| ParticipantView {
                id: p.id,
                role: p.role,
                variant: p.variant,
                lives: p.lives,
                visual_lives: p.visual_lives(),
                health: p.health,
                max_health: p.max_health,
                alive: p.alive,
                placement: p.placement,
                survival_ticks: p.survival_ticks,
            })
            .collect();

        Self {
            tick: state.tick,
            phase: state.phase,
            god: state.god(),
            round_ticks_remaining: state.round_timer.remaining_ticks(),
            round_timer_running: state.round_timer.is_running(),
            participants,
            placements: state.scores.placements(),
        }
    }

    /// Look up one participant.
    pub fn participant(&self, id: ParticipantId) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}
