//! Match Lifecycle
//!
//! Lobby, countdown, initial setup, damage routing, elimination and the end
//! of the match. Every operation takes the match state explicitly.

use tracing::{debug, info, warn};

use crate::error::{GambitError, GambitResult};
use crate::game::deferred::DeferredAction;
use crate::game::events::{GameEvent, SpawnTarget, SwapTrigger};
use crate::game::participant::{DamageOutcome, ParticipantId, Placement, Role, VariantIndex};
use crate::game::spawn::{OccupancyQuery, SpawnPose};
use crate::game::state::{MatchPhase, MatchState};
use crate::game::swap;
use crate::game::timer::RoundTimer;

// =============================================================================
// LOBBY
// =============================================================================

/// Add a participant. Late joiners during play are placed as fighters.
pub fn join(
    state: &mut MatchState,
    id: ParticipantId,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<VariantIndex> {
    if state.is_ended() {
        return Err(GambitError::InvalidState("cannot join an ended match"));
    }

    let variant = state.registry.join(id, &mut state.rng)?;
    info!("Participant {} joined with variant {}", id, variant.0);
    state.push_event(GameEvent::joined(state.tick, id, variant));
    state
        .deferred
        .schedule_once(state.tick.saturating_add(1), DeferredAction::RescaleRoundTimer);

    if state.is_in_progress() {
        state.registry.assign_role(id, Role::Fighter)?;
        place_fighter(state, id, occupancy)?;
    }

    Ok(variant)
}

/// Lobby asked to start. Returns true if the countdown began.
pub fn ready(state: &mut MatchState) -> GambitResult<bool> {
    if state.phase != MatchPhase::Lobby {
        return Err(GambitError::InvalidState("ready outside the lobby"));
    }

    let count = state.registry.active_count();
    if count < state.config.effective_min_participants() {
        debug!("Ready ignored: {} participant(s) joined", count);
        return Ok(false);
    }

    state.set_phase(MatchPhase::Countdown {
        ticks_remaining: state.config.countdown_ticks,
    });
    info!("Countdown started with {} participants", count);
    Ok(true)
}

/// Advance the internal countdown by one tick, starting the match at zero.
///
/// `ticks_remaining` counts the ticks left before play begins, so a countdown
/// of N started on tick T starts the match on tick T + N.
pub fn advance_countdown(state: &mut MatchState, occupancy: &dyn OccupancyQuery) -> GambitResult<()> {
    let MatchPhase::Countdown { ticks_remaining } = state.phase else {
        return Ok(());
    };

    let remaining = ticks_remaining.saturating_sub(1);
    state.phase = MatchPhase::Countdown { ticks_remaining: remaining };
    if remaining > 0 {
        return Ok(());
    }

    try_start(state, occupancy).map(|_| ())
}

/// Countdown finished (internal or external). Returns true if play began.
///
/// `ready` already checked the participant count; the check here only guards
/// hand-built states, which stay at a zero countdown and retry every tick.
pub fn try_start(state: &mut MatchState, occupancy: &dyn OccupancyQuery) -> GambitResult<bool> {
    if !matches!(state.phase, MatchPhase::Countdown { .. }) {
        return Err(GambitError::InvalidState("match start outside the countdown"));
    }

    let count = state.registry.active_count();
    if count < state.config.effective_min_participants() {
        debug!("Start deferred: {} participant(s) active", count);
        return Ok(false);
    }

    state.spawns.ensure_ready()?;
    setup_participants(state, occupancy)?;
    Ok(true)
}

/// Assign roles, place everyone and start the round timer.
fn setup_participants(state: &mut MatchState, occupancy: &dyn OccupancyQuery) -> GambitResult<()> {
    let active: Vec<ParticipantId> = state.registry.active_ids().to_vec();

    let god = if state.config.god_first {
        active.first().copied()
    } else {
        state.rng.choose(&active).copied()
    }
    .ok_or(GambitError::InvalidState("no participants to set up"))?;

    state.scores.reset();
    state.spawns.reset_used();
    state.god_promoted_at = None;

    let mut fighters = Vec::with_capacity(active.len().saturating_sub(1));
    for &id in &active {
        if id == god {
            state.registry.assign_role(id, Role::God)?;
            place_god(state, id)?;
        } else {
            state.registry.assign_role(id, Role::Fighter)?;
            place_fighter(state, id, occupancy)?;
            fighters.push(id);
        }
    }

    state.round_timer.set_length(state.config.scaled_round_ticks(active.len()));
    state.round_timer.reset();
    state.started_at = Some(state.tick);
    state.set_phase(MatchPhase::InProgress);

    info!("Match started: god {} vs {} fighter(s)", god, fighters.len());
    state.push_event(GameEvent::match_started(state.tick, god, fighters));
    Ok(())
}

// =============================================================================
// PLACEMENT
// =============================================================================

/// Place a fighter at a random free slot.
///
/// Returns false when every candidate slot was occupied; a retry is then
/// scheduled and the fighter stays unplaced until it succeeds.
pub fn place_fighter(
    state: &mut MatchState,
    id: ParticipantId,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<bool> {
    let slot = match state.spawns.pick_random_unused(&mut state.rng, occupancy) {
        Ok(slot) => slot,
        Err(GambitError::ResourceExhausted(reason)) => {
            warn!("Placement of {} deferred: {}", id, reason);
            let due = state.tick.saturating_add(state.config.placement_retry_ticks.max(1));
            state
                .deferred
                .schedule_once(due, DeferredAction::RetryPlacement { participant: id });
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    state.registry.active_mut(id)?.placement = Placement::Slot(slot.id);
    state.push_event(GameEvent::placed(
        state.tick,
        id,
        Role::Fighter,
        SpawnTarget::Slot(slot.id),
        slot.pose,
    ));
    Ok(true)
}

/// Put the god at the god slot.
pub fn place_god(state: &mut MatchState, id: ParticipantId) -> GambitResult<SpawnPose> {
    let pose = state.spawns.god_slot()?;
    state.registry.active_mut(id)?.placement = Placement::GodSlot;
    state.push_event(GameEvent::placed(state.tick, id, Role::God, SpawnTarget::God, pose));
    Ok(pose)
}

// =============================================================================
// HEALTH
// =============================================================================

/// Route combat damage. A lost life triggers a swap; no lives left eliminates.
pub fn apply_damage(
    state: &mut MatchState,
    id: ParticipantId,
    amount: u32,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<DamageOutcome> {
    if !state.is_in_progress() {
        return Err(GambitError::InvalidState("damage outside of play"));
    }

    let one_hit_kill = state.config.one_hit_kill;
    let participant = state.registry.active_mut(id)?;
    let max_health = participant.max_health;
    let outcome = participant.damage(amount, one_hit_kill);

    match outcome {
        DamageOutcome::Ignored => {}
        DamageOutcome::Hurt { health } => {
            state.push_event(GameEvent::health_changed(state.tick, id, health, max_health));
        }
        DamageOutcome::LifeLost { lives_left } => {
            debug!("{} lost a life ({} left)", id, lives_left);
            state.push_event(GameEvent::life_lost(state.tick, id, lives_left));
            swap::request_swap(state, id, SwapTrigger::LifeLost, occupancy)?;
        }
        DamageOutcome::Eliminated => eliminate(state, id),
    }

    Ok(outcome)
}

/// Heal a participant.
pub fn apply_heal(state: &mut MatchState, id: ParticipantId, amount: u32) -> GambitResult<()> {
    let participant = state.registry.active_mut(id)?;
    let max_health = participant.max_health;
    if let Some(health) = participant.heal(amount) {
        state.push_event(GameEvent::health_changed(state.tick, id, health, max_health));
    }
    Ok(())
}

/// Take a participant out of play. Emits `ParticipantEliminated` once.
pub fn eliminate(state: &mut MatchState, id: ParticipantId) {
    if !state.registry.remove_participant(id) {
        return;
    }
    state.spawns.reset_used();
    state.deferred.cancel_for(id);
    info!("Participant {} eliminated ({} fighter(s) left)", id, state.alive_fighter_count());
    state.push_event(GameEvent::eliminated(state.tick, id));
}

// =============================================================================
// END OF MATCH
// =============================================================================

/// End the match once no fighters remain. Returns true on the ending tick.
pub fn check_end_conditions(state: &mut MatchState) -> bool {
    if !state.is_in_progress() || state.alive_fighter_count() > 0 {
        return false;
    }

    let records: Vec<_> = state
        .registry
        .roster()
        .map(|p| (p.id, p.survival_ticks, p.lives, p.variant))
        .collect();
    for (id, survival_ticks, lives, variant) in records {
        state.scores.record(id, survival_ticks, lives, variant);
    }

    let ranking = state.scores.rank();
    let duration = state.elapsed_ticks();

    state.round_timer.stop();
    state.deferred.clear();
    state.set_phase(MatchPhase::Ended);

    info!("Match ended after {} ticks, winner {:?}", duration, ranking.first());
    state.push_event(GameEvent::match_ended(state.tick, ranking, duration));
    true
}

// =============================================================================
// STAGE AND RESETS
// =============================================================================

/// A stage finished loading: take its spawn slots and clear old scores.
pub fn load_stage(
    state: &mut MatchState,
    slots: &[SpawnPose],
    god_slot: Option<SpawnPose>,
) -> GambitResult<()> {
    if state.is_in_progress() {
        return Err(GambitError::InvalidState("stage load during play"));
    }
    state.spawns.load_slots(slots, god_slot)?;
    state.scores.reset();
    info!("Stage loaded with {} spawn slot(s)", slots.len());
    Ok(())
}

/// Play again with the same participants.
pub fn restart(state: &mut MatchState) -> GambitResult<()> {
    if !state.is_ended() {
        return Err(GambitError::InvalidState("restart before the match ended"));
    }

    state.registry.reactivate_all();
    state.spawns.reset_used();
    clear_match_progress(state);
    state.set_phase(MatchPhase::Lobby);

    info!("Match restarted with {} participant(s)", state.registry.active_count());
    state.push_event(GameEvent::match_reset(state.tick, true));
    Ok(())
}

/// Drop every participant and return to a fresh lobby.
pub fn unjoin_all(state: &mut MatchState) {
    state.registry.clear();
    state.spawns.clear();
    state.scores.reset();
    clear_match_progress(state);
    state.set_phase(MatchPhase::Lobby);

    info!("All participants removed");
    state.push_event(GameEvent::match_reset(state.tick, false));
}

fn clear_match_progress(state: &mut MatchState) {
    state.deferred.clear();
    state.round_timer = RoundTimer::new(state.config.round_ticks);
    state.god_promoted_at = None;
    state.started_at = None;
}

// =============================================================================
// DEFERRED ACTIONS
// =============================================================================

/// Run one deferred action that came due this tick.
pub fn run_deferred(
    state: &mut MatchState,
    action: DeferredAction,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<()> {
    match action {
        DeferredAction::SpawnGod { participant } => swap::spawn_pending_god(state, participant),
        DeferredAction::RescaleRoundTimer => {
            let length = state.config.scaled_round_ticks(state.registry.participant_count());
            state.round_timer.set_length(length);
            if state.is_in_progress() {
                state.round_timer.reset();
            }
            debug!("Round length now {} ticks", length);
            Ok(())
        }
        DeferredAction::RetryPlacement { participant } => {
            let still_unplaced = state.is_in_progress()
                && state.registry.get(participant).is_some_and(|p| {
                    p.is_active_fighter() && p.placement == Placement::Unplaced
                });
            if still_unplaced {
                place_fighter(state, participant, occupancy)?;
            }
            Ok(())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::game::events::GameEventData;
    use crate::game::spawn::{NeverOccupied, SpawnSlot};

    fn stage() -> Vec<SpawnPose> {
        (0..4).map(|i| SpawnPose::new(i as f32 * 4.0, 0.0, 0.0, 90.0)).collect()
    }

    fn lobby(count: u32) -> MatchState {
        let mut state = MatchState::new([7; 16], 99, MatchConfig::default());
        load_stage(&mut state, &stage(), Some(SpawnPose::new(0.0, 10.0, 0.0, 180.0))).unwrap();
        for i in 0..count {
            join(&mut state, ParticipantId(i), &NeverOccupied).unwrap();
        }
        state
    }

    fn started(count: u32) -> MatchState {
        let mut state = lobby(count);
        assert!(ready(&mut state).unwrap());
        assert!(try_start(&mut state, &NeverOccupied).unwrap());
        state.take_events();
        state
    }

    #[test]
    fn test_ready_needs_two_participants() {
        let mut state = lobby(1);
        assert!(!ready(&mut state).unwrap());
        assert_eq!(state.phase, MatchPhase::Lobby);

        join(&mut state, ParticipantId(1), &NeverOccupied).unwrap();
        assert!(ready(&mut state).unwrap());
        assert!(matches!(state.phase, MatchPhase::Countdown { .. }));
    }

    #[test]
    fn test_setup_one_god_distinct_slots() {
        let state = started(4);

        assert!(state.is_in_progress());
        let god = state.god().unwrap();
        assert_eq!(state.registry.get(god).unwrap().placement, Placement::GodSlot);

        let fighters = state.registry.alive_fighters();
        assert_eq!(fighters.len(), 3);

        let mut slots: Vec<_> = fighters
            .iter()
            .map(|id| state.registry.get(*id).unwrap().placement)
            .collect();
        slots.sort_by_key(|p| match p {
            Placement::Slot(s) => s.0,
            _ => u16::MAX,
        });
        slots.dedup();
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|p| matches!(p, Placement::Slot(_))));
    }

    #[test]
    fn test_god_first_flag() {
        let mut state = lobby(3);
        state.config.god_first = true;
        ready(&mut state).unwrap();
        try_start(&mut state, &NeverOccupied).unwrap();
        assert_eq!(state.god(), Some(ParticipantId(0)));
    }

    #[test]
    fn test_start_without_stage_is_config_error() {
        let mut state = MatchState::new([0; 16], 1, MatchConfig::default());
        join(&mut state, ParticipantId(0), &NeverOccupied).unwrap();
        join(&mut state, ParticipantId(1), &NeverOccupied).unwrap();
        ready(&mut state).unwrap();

        let err = try_start(&mut state, &NeverOccupied).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_countdown_runs_out() {
        let mut state = lobby(2);
        state.config.countdown_ticks = 2;
        ready(&mut state).unwrap();

        advance_countdown(&mut state, &NeverOccupied).unwrap();
        assert_eq!(state.phase, MatchPhase::Countdown { ticks_remaining: 1 });
        advance_countdown(&mut state, &NeverOccupied).unwrap();
        assert!(state.is_in_progress());
    }

    #[test]
    fn test_zero_countdown_retries_until_enough_participants() {
        let mut state = lobby(1);
        state.phase = MatchPhase::Countdown { ticks_remaining: 0 };

        advance_countdown(&mut state, &NeverOccupied).unwrap();
        assert_eq!(state.phase, MatchPhase::Countdown { ticks_remaining: 0 });

        join(&mut state, ParticipantId(1), &NeverOccupied).unwrap();
        advance_countdown(&mut state, &NeverOccupied).unwrap();
        assert!(state.is_in_progress());
    }

    #[test]
    fn test_restart_keeps_first_joiner_as_god() {
        let mut state = MatchState::new([7; 16], 99, MatchConfig { god_first: true, ..Default::default() });
        load_stage(&mut state, &stage(), Some(SpawnPose::new(0.0, 10.0, 0.0, 180.0))).unwrap();
        for id in [5, 2, 8] {
            join(&mut state, ParticipantId(id), &NeverOccupied).unwrap();
        }
        ready(&mut state).unwrap();
        try_start(&mut state, &NeverOccupied).unwrap();
        assert_eq!(state.god(), Some(ParticipantId(5)));

        for id in state.registry.alive_fighters() {
            eliminate(&mut state, id);
        }
        assert!(check_end_conditions(&mut state));
        restart(&mut state).unwrap();

        let order: Vec<u32> = state.registry.active_ids().iter().map(|id| id.0).collect();
        assert_eq!(order, vec![5, 2, 8]);

        ready(&mut state).unwrap();
        try_start(&mut state, &NeverOccupied).unwrap();
        assert_eq!(state.god(), Some(ParticipantId(5)));
    }

    #[test]
    fn test_occupied_slots_defer_placement() {
        let mut state = lobby(2);
        state.config.god_first = true;
        ready(&mut state).unwrap();

        let all_occupied = |_: &SpawnSlot| true;
        try_start(&mut state, &all_occupied).unwrap();

        let fighter = ParticipantId(1);
        assert_eq!(state.registry.get(fighter).unwrap().placement, Placement::Unplaced);
        assert!(state.deferred.has_pending_for(fighter));

        state.tick += 1;
        for action in state.deferred.drain_due(state.tick) {
            run_deferred(&mut state, action, &NeverOccupied).unwrap();
        }
        assert!(matches!(
            state.registry.get(fighter).unwrap().placement,
            Placement::Slot(_)
        ));
    }

    #[test]
    fn test_damage_life_then_elimination() {
        let config = MatchConfig { max_lives: 0, ..Default::default() };
        let mut state = MatchState::new([1; 16], 5, config);
        load_stage(&mut state, &stage(), Some(SpawnPose::new(0.0, 0.0, 0.0, 0.0))).unwrap();
        for i in 0..3 {
            join(&mut state, ParticipantId(i), &NeverOccupied).unwrap();
        }
        ready(&mut state).unwrap();
        try_start(&mut state, &NeverOccupied).unwrap();
        state.take_events();

        let fighter = state.registry.alive_fighters()[0];
        let outcome = apply_damage(&mut state, fighter, 1000, &NeverOccupied).unwrap();
        assert_eq!(outcome, DamageOutcome::Eliminated);
        assert_eq!(state.alive_fighter_count(), 1);
        assert_eq!(state.spawns.used_count(), 0);

        // A second hit on an eliminated participant is not found.
        assert!(apply_damage(&mut state, fighter, 10, &NeverOccupied).is_err());

        let eliminations = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e.data, GameEventData::ParticipantEliminated { .. }))
            .count();
        assert_eq!(eliminations, 1);
    }

    #[test]
    fn test_god_ignores_damage() {
        let mut state = started(2);
        let god = state.god().unwrap();
        let outcome = apply_damage(&mut state, god, 1000, &NeverOccupied).unwrap();
        assert_eq!(outcome, DamageOutcome::Ignored);
        assert_eq!(state.god(), Some(god));
    }

    #[test]
    fn test_end_records_every_participant_once() {
        let mut state = started(3);
        let fighters = state.registry.alive_fighters();
        for id in fighters {
            state.registry.get_mut(id).unwrap().survival_ticks = 10 + id.0;
            eliminate(&mut state, id);
        }

        assert!(check_end_conditions(&mut state));
        assert!(!check_end_conditions(&mut state));
        assert!(state.is_ended());
        assert_eq!(state.scores.len(), 3);

        for p in state.registry.roster() {
            assert_eq!(state.scores.get(p.id).unwrap().variant, p.variant);
        }

        let ended = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e.data, GameEventData::MatchEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_restart_keeps_roster() {
        let mut state = started(3);
        for id in state.registry.alive_fighters() {
            eliminate(&mut state, id);
        }
        check_end_conditions(&mut state);

        restart(&mut state).unwrap();
        assert_eq!(state.phase, MatchPhase::Lobby);
        assert_eq!(state.registry.active_count(), 3);
        assert!(state.registry.roster().all(|p| p.role.is_none() && p.lives == p.max_lives));
    }

    #[test]
    fn test_unjoin_all_is_fresh() {
        let mut state = started(3);
        unjoin_all(&mut state);

        assert_eq!(state.phase, MatchPhase::Lobby);
        assert_eq!(state.registry.participant_count(), 0);
        assert!(state.spawns.slots().is_empty());
        assert!(state.deferred.is_empty());
        assert!(state.scores.is_empty());
    }

    #[test]
    fn test_join_rules() {
        let mut state = lobby(2);
        assert!(matches!(
            join(&mut state, ParticipantId(0), &NeverOccupied),
            Err(GambitError::AlreadyJoined(_))
        ));

        state.set_phase(MatchPhase::Ended);
        assert!(matches!(
            join(&mut state, ParticipantId(5), &NeverOccupied),
            Err(GambitError::InvalidState(_))
        ));
    }

    #[test]
    fn test_late_join_becomes_fighter() {
        let mut state = started(2);
        join(&mut state, ParticipantId(9), &NeverOccupied).unwrap();
        let late = state.registry.get(ParticipantId(9)).unwrap();
        assert_eq!(late.role, Some(Role::Fighter));
        assert!(matches!(late.placement, Placement::Slot(_)));
    }

    #[test]
    fn test_rescale_round_timer() {
        let mut state = started(3);
        run_deferred(&mut state, DeferredAction::RescaleRoundTimer, &NeverOccupied).unwrap();
        assert_eq!(state.round_timer.length_ticks(), state.config.scaled_round_ticks(3));
        assert_eq!(state.round_timer.remaining_ticks(), state.config.scaled_round_ticks(3));
    }
}
