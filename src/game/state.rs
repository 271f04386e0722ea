//! Match State
//!
//! The aggregate the tick loop mutates. It owns the match phase and is built
//! from an explicitly supplied registry, spawn allocator and score board.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::MatchConfig;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::game::deferred::DeferredQueue;
use crate::game::events::GameEvent;
use crate::game::participant::{ParticipantId, Placement, Role};
use crate::game::registry::EntityRegistry;
use crate::game::score::ScoreBoard;
use crate::game::spawn::SpawnAllocator;
use crate::game::timer::RoundTimer;

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Participants joining
    #[default]
    Lobby,
    /// Countdown before start
    Countdown { ticks_remaining: u32 },
    /// Active gameplay
    InProgress,
    /// Every fighter is out, results captured
    Ended,
}

impl MatchPhase {
    /// Stable tag for hashing.
    pub fn tag(self) -> u8 {
        match self {
            MatchPhase::Lobby => 0,
            MatchPhase::Countdown { .. } => 1,
            MatchPhase::InProgress => 2,
            MatchPhase::Ended => 3,
        }
    }

    /// Lowercase name for logging.
    pub fn name(self) -> &'static str {
        match self {
            MatchPhase::Lobby => "lobby",
            MatchPhase::Countdown { .. } => "countdown",
            MatchPhase::InProgress => "in_progress",
            MatchPhase::Ended => "ended",
        }
    }
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Match identifier
    pub match_id: [u8; 16],

    /// Current tick (advances on every `tick()` call)
    pub tick: u32,

    /// Current match phase
    pub phase: MatchPhase,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// Tunables
    pub config: MatchConfig,

    /// Participants
    pub registry: EntityRegistry,

    /// Spawn slots of the loaded stage
    pub spawns: SpawnAllocator,

    /// End-of-match records
    pub scores: ScoreBoard,

    /// Swap countdown
    pub round_timer: RoundTimer,

    /// Work scheduled for later ticks
    pub deferred: DeferredQueue,

    /// Tick of the most recent god promotion by swap
    pub god_promoted_at: Option<u32>,

    /// Tick the match entered `InProgress`
    pub started_at: Option<u32>,

    /// Events generated this tick (drained each tick)
    pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a match with fresh components built from `config`.
    pub fn new(match_id: [u8; 16], rng_seed: u64, config: MatchConfig) -> Self {
        let registry = EntityRegistry::new(config.variant_count, config.max_lives, config.max_health);
        Self::with_parts(match_id, rng_seed, config, registry, SpawnAllocator::new(), ScoreBoard::new())
    }

    /// Create a match around explicitly supplied components.
    pub fn with_parts(
        match_id: [u8; 16],
        rng_seed: u64,
        config: MatchConfig,
        registry: EntityRegistry,
        spawns: SpawnAllocator,
        scores: ScoreBoard,
    ) -> Self {
        let round_timer = RoundTimer::new(config.round_ticks);
        Self {
            match_id,
            tick: 0,
            phase: MatchPhase::Lobby,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            config,
            registry,
            spawns,
            scores,
            round_timer,
            deferred: DeferredQueue::new(),
            god_promoted_at: None,
            started_at: None,
            pending_events: Vec::new(),
        }
    }

    /// Move to a new phase, emitting `PhaseChanged` if it differs in kind.
    pub fn set_phase(&mut self, new_phase: MatchPhase) {
        let old_phase = self.phase;
        self.phase = new_phase;
        if old_phase.tag() != new_phase.tag() {
            debug!("phase {} -> {}", old_phase.name(), new_phase.name());
            self.push_event(GameEvent::phase_changed(self.tick, old_phase, new_phase));
        }
    }

    /// Match in progress?
    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, MatchPhase::InProgress)
    }

    /// Check if match has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended)
    }

    /// Was a god promoted within the swap grace window?
    pub fn god_recently_promoted(&self) -> bool {
        self.god_promoted_at
            .is_some_and(|at| self.tick.saturating_sub(at) < self.config.swap_grace_ticks)
    }

    /// Current god.
    pub fn god(&self) -> Option<ParticipantId> {
        self.registry.god()
    }

    /// Number of alive fighters.
    pub fn alive_fighter_count(&self) -> usize {
        self.registry.alive_fighters().len()
    }

    /// Ticks since the match started.
    pub fn elapsed_ticks(&self) -> u32 {
        self.started_at.map_or(0, |start| self.tick.saturating_sub(start))
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            hasher.update_u8(self.phase.tag());
            if let MatchPhase::Countdown { ticks_remaining } = self.phase {
                hasher.update_u32(ticks_remaining);
            }
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            for p in self.registry.roster() {
                hasher.update_u32(p.id.0);
                hasher.update_u8(match p.role {
                    None => 0,
                    Some(Role::God) => 1,
                    Some(Role::Fighter) => 2,
                });
                hasher.update_u8(p.variant.0);
                hasher.update_i32(p.lives);
                hasher.update_i32(p.health);
                hasher.update_bool(p.alive);
                hasher.update_u32(p.survival_ticks);
                match p.placement {
                    Placement::Unplaced => hasher.update_u8(0),
                    Placement::Slot(slot) => {
                        hasher.update_u8(1);
                        hasher.update_u32(slot.0 as u32);
                    }
                    Placement::GodSlot => hasher.update_u8(2),
                    Placement::PendingGod { due_tick } => {
                        hasher.update_u8(3);
                        hasher.update_u32(due_tick);
                    }
                }
            }

            for id in self.registry.active_ids() {
                hasher.update_u32(id.0);
            }

            for slot in self.spawns.slots() {
                hasher.update_f32(slot.pose.position[0]);
                hasher.update_f32(slot.pose.position[1]);
                hasher.update_f32(slot.pose.position[2]);
                hasher.update_bool(slot.used);
            }

            for (placement, id, record) in self.scores.placements() {
                hasher.update_u8(placement);
                hasher.update_u32(id.0);
                hasher.update_u32(record.survival_ticks);
                hasher.update_i32(record.lives);
            }

            hasher.update_u32(self.round_timer.remaining_ticks());
            hasher.update_bool(self.round_timer.is_running());
            hasher.update_opt_u32(self.god_promoted_at);
            hasher.update_opt_u32(self.started_at);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Events queued so far this tick.
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.pending_events
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;

    #[test]
    fn test_new_state_is_lobby() {
        let state = MatchState::new([0; 16], 1, MatchConfig::default());
        assert_eq!(state.phase, MatchPhase::Lobby);
        assert_eq!(state.god(), None);
        assert_eq!(state.elapsed_ticks(), 0);
    }

    #[test]
    fn test_set_phase_emits_only_on_kind_change() {
        let mut state = MatchState::new([0; 16], 1, MatchConfig::default());
        state.set_phase(MatchPhase::Countdown { ticks_remaining: 3 });
        state.set_phase(MatchPhase::Countdown { ticks_remaining: 2 });

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].data,
            GameEventData::PhaseChanged { old_phase: MatchPhase::Lobby, .. }
        ));
    }

    #[test]
    fn test_hash_determinism() {
        let mut state1 = MatchState::new([0; 16], 12345, MatchConfig::default());
        let mut state2 = MatchState::new([0; 16], 12345, MatchConfig::default());

        for i in 0..3 {
            state1.registry.join(ParticipantId(i), &mut state1.rng).unwrap();
            state2.registry.join(ParticipantId(i), &mut state2.rng).unwrap();
        }

        assert_eq!(state1.compute_hash(), state2.compute_hash());

        state2.registry.get_mut(ParticipantId(1)).unwrap().lives -= 1;
        assert_ne!(state1.compute_hash(), state2.compute_hash());
    }

    #[test]
    fn test_grace_window() {
        let config = MatchConfig { swap_grace_ticks: 10, ..Default::default() };
        let mut state = MatchState::new([0; 16], 1, config);
        assert!(!state.god_recently_promoted());

        state.tick = 100;
        state.god_promoted_at = Some(95);
        assert!(state.god_recently_promoted());

        state.tick = 105;
        assert!(!state.god_recently_promoted());
    }
}
