//! Game Events
//!
//! Everything the presentation layer reacts to. Events are queued on the
//! match state during a tick and handed out once in the `TickResult`.

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};

use crate::game::participant::{ParticipantId, Role, VariantIndex};
use crate::game::spawn::{SlotId, SpawnPose};
use crate::game::state::MatchPhase;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Eliminations first
    Elimination = 0,
    /// Then life and health changes
    Health = 1,
    /// Then role swaps
    RoleSwap = 2,
    /// Then placements
    Placement = 3,
    /// Then phase and lifecycle changes
    Lifecycle = 4,
    /// Lowest priority
    Other = 255,
}

/// Why a swap happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapTrigger {
    /// A fighter lost a life
    LifeLost,
    /// The round timer ran out
    TimeUp,
}

/// Where a participant was placed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpawnTarget {
    /// A fighter slot
    Slot(SlotId),
    /// The god slot
    God,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A participant joined and got a variant
    ParticipantJoined {
        /// Who joined
        participant: ParticipantId,
        /// Character variant drawn for them
        variant: VariantIndex,
    },

    /// Match phase changed
    PhaseChanged {
        /// Phase before the change
        old_phase: MatchPhase,
        /// Phase after the change
        new_phase: MatchPhase,
    },

    /// Roles were assigned and play begins
    MatchStarted {
        /// The first god
        god: ParticipantId,
        /// Everyone else, in join order
        fighters: Vec<ParticipantId>,
    },

    /// A participant was put into the arena
    Placed {
        /// Who was placed
        participant: ParticipantId,
        /// Role they were placed for
        role: Role,
        /// Fighter slot or god slot
        target: SpawnTarget,
        /// Position and facing
        pose: SpawnPose,
    },

    /// Health changed without costing a life
    HealthChanged {
        /// Whose health changed
        participant: ParticipantId,
        /// Health after the change
        health: i32,
        /// Health after a restore
        max_health: i32,
    },

    /// A life was spent
    LifeLost {
        /// Who lost the life
        participant: ParticipantId,
        /// Lives after the loss (zero is the last life)
        lives_left: i32,
    },

    /// God and fighter exchanged roles
    RoleSwapped {
        /// Promoted to god
        new_god: ParticipantId,
        /// Demoted to fighter
        new_fighter: ParticipantId,
        /// What caused the swap
        trigger: SwapTrigger,
        /// Clear the level of hazards and projectiles
        purge_level: bool,
    },

    /// A swap was suppressed inside the grace window; the fighter respawned
    Respawned {
        /// Fighter that respawned
        participant: ParticipantId,
    },

    /// Lives dropped below zero; out of the match
    ParticipantEliminated {
        /// Who is out
        participant: ParticipantId,
    },

    /// The round timer ran out
    RoundTimeUp,

    /// Every fighter is out; load the next stage
    MatchEnded {
        /// Best first
        ranking: Vec<ParticipantId>,
        /// Ticks from start to end
        duration_ticks: u32,
    },

    /// The match was reset back to the lobby
    MatchReset {
        /// Roster kept (restart) or cleared (unjoin all)
        keep_roster: bool,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Participant involved (for tie-breaking)
    pub participant: Option<ParticipantId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let participant = match &data {
            GameEventData::ParticipantJoined { participant, .. }
            | GameEventData::Placed { participant, .. }
            | GameEventData::HealthChanged { participant, .. }
            | GameEventData::LifeLost { participant, .. }
            | GameEventData::Respawned { participant }
            | GameEventData::ParticipantEliminated { participant } => Some(*participant),
            GameEventData::MatchStarted { god, .. } => Some(*god),
            GameEventData::RoleSwapped { new_god, .. } => Some(*new_god),
            _ => None,
        };

        Self {
            tick,
            priority,
            participant,
            data,
        }
    }

    /// Create participant joined event.
    pub fn joined(tick: u32, participant: ParticipantId, variant: VariantIndex) -> Self {
        Self::new(
            tick,
            EventPriority::Lifecycle,
            GameEventData::ParticipantJoined { participant, variant },
        )
    }

    /// Create phase changed event.
    pub fn phase_changed(tick: u32, old_phase: MatchPhase, new_phase: MatchPhase) -> Self {
        Self::new(
            tick,
            EventPriority::Lifecycle,
            GameEventData::PhaseChanged { old_phase, new_phase },
        )
    }

    /// Create match started event.
    pub fn match_started(tick: u32, god: ParticipantId, fighters: Vec<ParticipantId>) -> Self {
        Self::new(
            tick,
            EventPriority::Lifecycle,
            GameEventData::MatchStarted { god, fighters },
        )
    }

    /// Create placement event.
    pub fn placed(
        tick: u32,
        participant: ParticipantId,
        role: Role,
        target: SpawnTarget,
        pose: SpawnPose,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Placement,
            GameEventData::Placed { participant, role, target, pose },
        )
    }

    /// Create health changed event.
    pub fn health_changed(tick: u32, participant: ParticipantId, health: i32, max_health: i32) -> Self {
        Self::new(
            tick,
            EventPriority::Health,
            GameEventData::HealthChanged { participant, health, max_health },
        )
    }

    /// Create life lost event.
    pub fn life_lost(tick: u32, participant: ParticipantId, lives_left: i32) -> Self {
        Self::new(
            tick,
            EventPriority::Health,
            GameEventData::LifeLost { participant, lives_left },
        )
    }

    /// Create role swapped event.
    pub fn role_swapped(
        tick: u32,
        new_god: ParticipantId,
        new_fighter: ParticipantId,
        trigger: SwapTrigger,
        purge_level: bool,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::RoleSwap,
            GameEventData::RoleSwapped { new_god, new_fighter, trigger, purge_level },
        )
    }

    /// Create respawned event.
    pub fn respawned(tick: u32, participant: ParticipantId) -> Self {
        Self::new(tick, EventPriority::RoleSwap, GameEventData::Respawned { participant })
    }

    /// Create participant eliminated event.
    pub fn eliminated(tick: u32, participant: ParticipantId) -> Self {
        Self::new(
            tick,
            EventPriority::Elimination,
            GameEventData::ParticipantEliminated { participant },
        )
    }

    /// Create round time up event.
    pub fn round_time_up(tick: u32) -> Self {
        Self::new(tick, EventPriority::Other, GameEventData::RoundTimeUp)
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, ranking: Vec<ParticipantId>, duration_ticks: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Lifecycle,
            GameEventData::MatchEnded { ranking, duration_ticks },
        )
    }

    /// Create match reset event.
    pub fn match_reset(tick: u32, keep_roster: bool) -> Self {
        Self::new(tick, EventPriority::Lifecycle, GameEventData::MatchReset { keep_roster })
    }

    /// Order for handing events out: by tick, then priority.
    ///
    /// Use with a stable sort; events of equal priority keep the order they
    /// were pushed in.
    pub fn processing_order(&self, other: &Self) -> Ordering {
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
    }
}
