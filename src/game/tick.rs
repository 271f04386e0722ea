//! Authoritative Match Tick
//!
//! The single entry point the engine calls once per frame step. Everything
//! happens in a fixed order so two runs fed the same commands stay identical.

use tracing::debug;

use crate::error::{GambitError, GambitResult};
use crate::game::command::{CommandLog, MatchCommand};
use crate::game::events::GameEvent;
use crate::game::lifecycle;
use crate::game::participant::ParticipantId;
use crate::game::spawn::{NeverOccupied, OccupancyQuery};
use crate::game::state::{MatchPhase, MatchState};
use crate::game::swap;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether match ended this tick
    pub match_ended: bool,
    /// Final ranking (on the tick the match ended)
    pub ranking: Option<Vec<ParticipantId>>,
    /// Recoverable errors; the offending operation was skipped
    pub skipped: Vec<GambitError>,
}

impl TickResult {
    /// Keep going on recoverable errors, abort on fatal ones.
    fn absorb(&mut self, outcome: GambitResult<()>, what: &str) -> GambitResult<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!("Skipped {}: {}", what, e);
                self.skipped.push(e);
                Ok(())
            }
        }
    }
}

/// Run one match tick.
///
/// # Arguments
///
/// * `state` - The match state (will be mutated)
/// * `commands` - Collaborator input queued since the last tick, in order
/// * `occupancy` - Geometric check for spawn slots
///
/// # Errors
///
/// Only configuration problems (e.g. no spawn slots when the match must
/// start) abort the tick. Everything else is reported in `skipped`.
pub fn tick(
    state: &mut MatchState,
    commands: &[MatchCommand],
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<TickResult> {
    let mut result = TickResult::default();

    // 0. Advance tick counter
    state.tick += 1;

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        "tick {} phase {} commands {} deferred {}",
        state.tick,
        state.phase.name(),
        commands.len(),
        state.deferred.len()
    );

    // A countdown started by this tick's commands first counts on the next tick
    let counting_down = matches!(state.phase, MatchPhase::Countdown { .. });

    // 1. Apply collaborator commands
    for command in commands {
        let outcome = apply_command(state, command, occupancy);
        result.absorb(outcome, command.kind())?;
    }

    // 2. Run deferred actions that came due
    for action in state.deferred.drain_due(state.tick) {
        let outcome = lifecycle::run_deferred(state, action, occupancy);
        result.absorb(outcome, "deferred action")?;
    }

    // 3. Phase timers
    match state.phase {
        MatchPhase::Countdown { .. } if counting_down => {
            let outcome = lifecycle::advance_countdown(state, occupancy);
            result.absorb(outcome, "countdown")?;
        }
        MatchPhase::InProgress => {
            state.registry.accumulate_survival();
            if state.round_timer.advance() {
                let outcome = swap::handle_time_up(state, occupancy).map(|_| ());
                result.absorb(outcome, "round time up")?;
            }
        }
        MatchPhase::Countdown { .. } | MatchPhase::Lobby | MatchPhase::Ended => {}
    }

    // 4. Check end conditions
    if lifecycle::check_end_conditions(state) {
        result.match_ended = true;
        result.ranking = Some(state.scores.rank());
    }

    // Collect events in processing order
    result.events = state.take_events();
    result.events.sort_by(GameEvent::processing_order);

    Ok(result)
}

/// Run one tick and append its commands to `log`.
pub fn tick_recorded(
    state: &mut MatchState,
    commands: &[MatchCommand],
    occupancy: &dyn OccupancyQuery,
    log: &mut CommandLog,
) -> GambitResult<TickResult> {
    log.record(state.tick.saturating_add(1), commands);
    tick(state, commands, occupancy)
}

fn apply_command(
    state: &mut MatchState,
    command: &MatchCommand,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<()> {
    match command {
        MatchCommand::Join(id) => lifecycle::join(state, *id, occupancy).map(|_| ()),
        MatchCommand::Ready => lifecycle::ready(state).map(|_| ()),
        MatchCommand::CountdownElapsed => lifecycle::try_start(state, occupancy).map(|_| ()),
        MatchCommand::Damage { participant, amount } => {
            lifecycle::apply_damage(state, *participant, *amount, occupancy).map(|_| ())
        }
        MatchCommand::Heal { participant, amount } => {
            lifecycle::apply_heal(state, *participant, *amount)
        }
        MatchCommand::TimerExpired => swap::handle_time_up(state, occupancy).map(|_| ()),
        MatchCommand::LoadStage { slots, god_slot } => {
            lifecycle::load_stage(state, slots, *god_slot)
        }
        MatchCommand::Restart => lifecycle::restart(state),
        MatchCommand::UnjoinAll => {
            lifecycle::unjoin_all(state);
            Ok(())
        }
    }
}

/// Replay a match from recorded commands.
///
/// Returns the final state and every event. Headless: no slot is ever
/// occupied.
pub fn replay_match(
    initial_state: MatchState,
    log: &CommandLog,
    tick_count: u32,
) -> GambitResult<(MatchState, Vec<GameEvent>)> {
    let mut state = initial_state;
    let mut all_events = Vec::new();

    for _ in 0..tick_count {
        let next = state.tick.saturating_add(1);
        let result = tick(&mut state, log.commands_at(next), &NeverOccupied)?;
        all_events.extend(result.events);
    }

    Ok((state, all_events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::game::events::{GameEventData, SwapTrigger};
    use crate::game::participant::Placement;
    use crate::game::spawn::SpawnPose;

    fn load_stage() -> MatchCommand {
        MatchCommand::LoadStage {
            slots: (0..6)
                .map(|i| SpawnPose::new(i as f32 * 3.0, 0.0, -4.0, 0.0))
                .collect(),
            god_slot: Some(SpawnPose::new(0.0, 12.0, 8.0, 180.0)),
        }
    }

    fn joins(count: u32) -> Vec<MatchCommand> {
        let mut commands = vec![load_stage()];
        commands.extend((0..count).map(|i| MatchCommand::Join(ParticipantId(i))));
        commands
    }

    fn god_count(state: &MatchState) -> usize {
        state.registry.alive().iter().filter(|p| p.is_god()).count()
    }

    /// Join, ready and run the countdown out.
    fn start(state: &mut MatchState, count: u32, events: &mut Vec<GameEvent>) {
        events.extend(tick(state, &joins(count), &NeverOccupied).unwrap().events);
        events.extend(tick(state, &[MatchCommand::Ready], &NeverOccupied).unwrap().events);
        while !state.is_in_progress() {
            events.extend(tick(state, &[], &NeverOccupied).unwrap().events);
        }
    }

    /// Hit the first alive fighter hard every tick until the match ends.
    fn fight_to_the_end(state: &mut MatchState, events: &mut Vec<GameEvent>) -> TickResult {
        for _ in 0..10_000 {
            let commands: Vec<MatchCommand> = state
                .registry
                .alive_fighters()
                .first()
                .map(|&participant| MatchCommand::Damage { participant, amount: 1000 })
                .into_iter()
                .collect();

            let result = tick(state, &commands, &NeverOccupied).unwrap();
            events.extend(result.events.iter().cloned());
            if result.match_ended {
                return result;
            }
            assert_eq!(god_count(state), 1);
        }
        panic!("match never ended");
    }

    #[test]
    fn test_four_joins_one_god_three_fighters() {
        let mut state = MatchState::new([0; 16], 4242, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 4, &mut events);

        assert_eq!(god_count(&state), 1);
        let fighters = state.registry.alive_fighters();
        assert_eq!(fighters.len(), 3);

        let mut slots: Vec<u16> = fighters
            .iter()
            .filter_map(|id| match state.registry.get(*id).unwrap().placement {
                Placement::Slot(slot) => Some(slot.0),
                _ => None,
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots.len(), 3);

        let started = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::MatchStarted { .. }))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn test_round_length_scales_with_participants() {
        let mut state = MatchState::new([0; 16], 1, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 4, &mut events);
        assert_eq!(state.round_timer.length_ticks(), state.config.scaled_round_ticks(4));
    }

    #[test]
    fn test_ready_alone_is_noop() {
        let mut state = MatchState::new([0; 16], 1, MatchConfig::default());
        tick(&mut state, &joins(1), &NeverOccupied).unwrap();
        let result = tick(&mut state, &[MatchCommand::Ready], &NeverOccupied).unwrap();

        assert_eq!(state.phase, MatchPhase::Lobby);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_full_match_ends_once_with_records() {
        let mut state = MatchState::new([5; 16], 777, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 4, &mut events);

        let result = fight_to_the_end(&mut state, &mut events);
        assert!(state.is_ended());

        let ranking = result.ranking.unwrap();
        assert_eq!(ranking.len(), 4);
        assert_eq!(state.scores.len(), 4);
        for p in state.registry.roster() {
            assert_eq!(state.scores.get(p.id).unwrap().variant, p.variant);
        }

        // Nothing more happens once ended.
        for _ in 0..5 {
            events.extend(tick(&mut state, &[], &NeverOccupied).unwrap().events);
        }
        let ended = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::MatchEnded { .. }))
            .count();
        assert_eq!(ended, 1);

        let eliminated = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::ParticipantEliminated { .. }))
            .count();
        assert_eq!(eliminated, 3);
    }

    #[test]
    fn test_elimination_drops_fighter_count_by_one() {
        let config = MatchConfig { max_lives: 0, ..Default::default() };
        let mut state = MatchState::new([0; 16], 31, config);
        let mut events = Vec::new();
        start(&mut state, 4, &mut events);

        let before = state.alive_fighter_count();
        let target = state.registry.alive_fighters()[1];
        let result = tick(
            &mut state,
            &[MatchCommand::Damage { participant: target, amount: 1 << 20 }],
            &NeverOccupied,
        )
        .unwrap();

        assert_eq!(state.alive_fighter_count(), before - 1);
        let fired: Vec<_> = result
            .events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::ParticipantEliminated { participant } if participant == target))
            .collect();
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn test_round_timer_swaps_and_keeps_one_god() {
        let config = MatchConfig {
            round_ticks: 30,
            extra_ticks_per_participant: 0,
            god_spawn_delay_ticks: 10,
            swap_grace_ticks: 10,
            ..Default::default()
        };
        let mut state = MatchState::new([9; 16], 8080, config);
        let mut events = Vec::new();
        start(&mut state, 3, &mut events);

        for _ in 0..200 {
            let result = tick(&mut state, &[], &NeverOccupied).unwrap();
            events.extend(result.events);
            if state.is_ended() {
                break;
            }
            assert_eq!(god_count(&state), 1);
        }

        let time_ups = events
            .iter()
            .filter(|e| matches!(e.data, GameEventData::RoundTimeUp))
            .count();
        assert!(time_ups > 0);
    }

    #[test]
    fn test_countdown_starts_match_after_configured_ticks() {
        let config = MatchConfig { countdown_ticks: 5, ..Default::default() };
        let mut state = MatchState::new([0; 16], 3, config);
        tick(&mut state, &joins(2), &NeverOccupied).unwrap();
        tick(&mut state, &[MatchCommand::Ready], &NeverOccupied).unwrap();
        let ready_tick = state.tick;
        assert_eq!(state.phase, MatchPhase::Countdown { ticks_remaining: 5 });

        while !state.is_in_progress() {
            tick(&mut state, &[], &NeverOccupied).unwrap();
            assert!(state.tick <= ready_tick + 5);
        }
        assert_eq!(state.tick, ready_tick + 5);
    }

    #[test]
    fn test_timer_expired_command_swaps_god() {
        let mut state = MatchState::new([6; 16], 606, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 3, &mut events);
        let old_god = state.god().unwrap();

        let result = tick(&mut state, &[MatchCommand::TimerExpired], &NeverOccupied).unwrap();

        assert!(result.skipped.is_empty());
        assert!(result.events.iter().any(|e| matches!(e.data, GameEventData::RoundTimeUp)));
        let swapped = result.events.iter().any(|e| {
            matches!(
                e.data,
                GameEventData::RoleSwapped { new_fighter, trigger: SwapTrigger::TimeUp, .. }
                    if new_fighter == old_god
            )
        });
        assert!(swapped);
        assert_ne!(state.god(), Some(old_god));
        assert_eq!(god_count(&state), 1);
    }

    #[test]
    fn test_heal_command_restores_health() {
        let mut state = MatchState::new([0; 16], 11, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 3, &mut events);
        let fighter = state.registry.alive_fighters()[0];

        tick(&mut state, &[MatchCommand::Damage { participant: fighter, amount: 40 }], &NeverOccupied)
            .unwrap();
        let result = tick(
            &mut state,
            &[MatchCommand::Heal { participant: fighter, amount: 15 }],
            &NeverOccupied,
        )
        .unwrap();

        assert_eq!(state.registry.get(fighter).unwrap().health, 75);
        let healed = result.events.iter().any(|e| {
            matches!(
                e.data,
                GameEventData::HealthChanged { participant, health: 75, max_health: 100 }
                    if participant == fighter
            )
        });
        assert!(healed);
    }

    #[test]
    fn test_load_stage_after_match_clears_scores() {
        let mut state = MatchState::new([1; 16], 321, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 3, &mut events);
        fight_to_the_end(&mut state, &mut events);
        assert_eq!(state.scores.len(), 3);

        let result = tick(&mut state, &[load_stage()], &NeverOccupied).unwrap();
        assert!(result.skipped.is_empty());
        assert!(state.scores.is_empty());
        assert!(state.scores.placements().is_empty());
    }

    #[test]
    fn test_final_elimination_reported_before_match_end() {
        let mut state = MatchState::new([7; 16], 70, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 2, &mut events);
        let result = fight_to_the_end(&mut state, &mut events);

        let position = |wanted: fn(&GameEventData) -> bool| {
            result.events.iter().position(|e| wanted(&e.data)).unwrap()
        };
        let eliminated = position(|d| matches!(d, GameEventData::ParticipantEliminated { .. }));
        let ended = position(|d| matches!(d, GameEventData::MatchEnded { .. }));
        assert!(eliminated < ended);
    }

    #[test]
    fn test_recoverable_errors_are_skipped() {
        let mut state = MatchState::new([0; 16], 1, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 2, &mut events);

        let result = tick(
            &mut state,
            &[
                MatchCommand::Damage { participant: ParticipantId(42), amount: 5 },
                MatchCommand::Join(ParticipantId(0)),
            ],
            &NeverOccupied,
        )
        .unwrap();

        assert_eq!(result.skipped.len(), 2);
        assert!(matches!(result.skipped[0], GambitError::NotFound(_)));
        assert!(matches!(result.skipped[1], GambitError::AlreadyJoined(_)));
    }

    #[test]
    fn test_missing_stage_aborts_tick() {
        let mut state = MatchState::new([0; 16], 1, MatchConfig::default());
        tick(
            &mut state,
            &[MatchCommand::Join(ParticipantId(0)), MatchCommand::Join(ParticipantId(1))],
            &NeverOccupied,
        )
        .unwrap();

        let result = tick(
            &mut state,
            &[MatchCommand::Ready, MatchCommand::CountdownElapsed],
            &NeverOccupied,
        );
        assert!(matches!(result, Err(GambitError::ConfigError(_))));
    }

    #[test]
    fn test_restart_plays_again() {
        let mut state = MatchState::new([2; 16], 55, MatchConfig::default());
        let mut events = Vec::new();
        start(&mut state, 3, &mut events);
        fight_to_the_end(&mut state, &mut events);

        tick(&mut state, &[MatchCommand::Restart, MatchCommand::Ready], &NeverOccupied).unwrap();
        while !state.is_in_progress() {
            tick(&mut state, &[], &NeverOccupied).unwrap();
        }
        assert_eq!(god_count(&state), 1);
        assert_eq!(state.alive_fighter_count(), 2);
    }

    #[test]
    fn test_tick_determinism() {
        let mut state1 = MatchState::new([0; 16], 12345, MatchConfig::default());
        let mut state2 = MatchState::new([0; 16], 12345, MatchConfig::default());
        let mut events1 = Vec::new();
        let mut events2 = Vec::new();

        start(&mut state1, 4, &mut events1);
        start(&mut state2, 4, &mut events2);
        fight_to_the_end(&mut state1, &mut events1);
        fight_to_the_end(&mut state2, &mut events2);

        assert_eq!(state1.tick, state2.tick);
        assert_eq!(state1.compute_hash(), state2.compute_hash());
        assert_eq!(state1.scores.rank(), state2.scores.rank());
        assert_eq!(events1, events2);
    }

    #[test]
    fn test_replay_determinism() {
        let initial = MatchState::new([8; 16], 99999, MatchConfig::default());
        let mut live = initial.clone();
        let mut log = CommandLog::new();

        tick_recorded(&mut live, &joins(3), &NeverOccupied, &mut log).unwrap();
        tick_recorded(&mut live, &[MatchCommand::Ready], &NeverOccupied, &mut log).unwrap();
        for _ in 0..400 {
            let commands: Vec<MatchCommand> = live
                .registry
                .alive_fighters()
                .first()
                .filter(|_| live.tick % 7 == 0)
                .map(|&participant| MatchCommand::Damage { participant, amount: 60 })
                .into_iter()
                .collect();
            tick_recorded(&mut live, &commands, &NeverOccupied, &mut log).unwrap();
        }

        let (replayed, _) = replay_match(initial, &log, live.tick).unwrap();
        assert_eq!(replayed.tick, live.tick);
        assert_eq!(replayed.compute_hash(), live.compute_hash());
    }
}
