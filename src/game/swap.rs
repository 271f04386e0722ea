//! Role Swap
//!
//! The god and a fighter exchange roles when that fighter loses a life or the
//! round timer runs out. Lives stay with each participant across a swap, so
//! the total in circulation only changes through the time-up penalty.

use tracing::{debug, info};

use crate::error::{GambitError, GambitResult};
use crate::game::deferred::DeferredAction;
use crate::game::events::{GameEvent, SwapTrigger};
use crate::game::lifecycle;
use crate::game::participant::{ParticipantId, Placement, Role};
use crate::game::spawn::OccupancyQuery;
use crate::game::state::MatchState;

/// What a swap request turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Roles were exchanged
    Swapped {
        new_god: ParticipantId,
        new_fighter: ParticipantId,
        /// The outgoing god ran out of lives through the time-up penalty
        penalty_eliminated: bool,
    },
    /// Inside the grace window: the fighter was only respawned
    Respawned { participant: ParticipantId },
}

/// Round timer ran out: swap the god with a random fighter.
pub fn handle_time_up(
    state: &mut MatchState,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<Option<SwapOutcome>> {
    if !state.is_in_progress() {
        return Err(GambitError::InvalidState("time up outside of play"));
    }
    debug!("Round time up at tick {}", state.tick);
    state.push_event(GameEvent::round_time_up(state.tick));
    random_swap(state, occupancy)
}

/// Swap the god with a uniformly chosen alive fighter.
pub fn random_swap(
    state: &mut MatchState,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<Option<SwapOutcome>> {
    let fighters = state.registry.alive_fighters();
    let Some(&fighter) = state.rng.choose(&fighters) else {
        debug!("No fighter to swap with");
        return Ok(None);
    };
    request_swap(state, fighter, SwapTrigger::TimeUp, occupancy).map(Some)
}

/// Promote `fighter` to god and demote the current god.
pub fn request_swap(
    state: &mut MatchState,
    fighter: ParticipantId,
    trigger: SwapTrigger,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<SwapOutcome> {
    if !state.registry.get(fighter).is_some_and(|p| p.is_active_fighter()) {
        return Err(GambitError::NotFound(fighter));
    }

    if state.god_recently_promoted() {
        respawn_fighter(state, fighter, occupancy)?;
        return Ok(SwapOutcome::Respawned { participant: fighter });
    }

    let god = state
        .god()
        .ok_or(GambitError::InvalidState("no god to swap with"))?;

    if state.config.reset_timer_on_swap {
        state.round_timer.reset();
    }

    // 1. Exchange roles, restore both health bars
    state.registry.assign_role(fighter, Role::God)?;
    state.registry.assign_role(god, Role::Fighter)?;
    for id in [fighter, god] {
        let participant = state.registry.active_mut(id)?;
        participant.restore(false);
        participant.placement = Placement::Unplaced;
    }

    // 2. New god waits off-arena; the timer holds until it appears
    let due_tick = state.tick.saturating_add(state.config.god_spawn_delay_ticks);
    state.deferred.cancel_for(fighter);
    state.deferred.schedule(due_tick, DeferredAction::SpawnGod { participant: fighter });
    state.registry.active_mut(fighter)?.placement = Placement::PendingGod { due_tick };
    state.god_promoted_at = Some(state.tick);
    state.round_timer.stop();

    // 3. Time-up penalty on whoever held the god role when time ran out
    let penalty_eliminated = trigger == SwapTrigger::TimeUp
        && state.config.god_loses_life_on_swap
        && penalize(state, god);

    // 4. Demoted god back into the arena
    if !penalty_eliminated {
        lifecycle::place_fighter(state, god, occupancy)?;
    }

    info!("Swap ({:?}): {} is god, {} fights", trigger, fighter, god);
    state.push_event(GameEvent::role_swapped(
        state.tick,
        fighter,
        god,
        trigger,
        state.config.purge_level_on_swap,
    ));

    Ok(SwapOutcome::Swapped {
        new_god: fighter,
        new_fighter: god,
        penalty_eliminated,
    })
}

/// Send a fighter to a fresh slot without touching roles.
pub fn respawn_fighter(
    state: &mut MatchState,
    id: ParticipantId,
    occupancy: &dyn OccupancyQuery,
) -> GambitResult<()> {
    let participant = state.registry.active_mut(id)?;
    if !participant.is_active_fighter() {
        return Err(GambitError::NotFound(id));
    }
    participant.placement = Placement::Unplaced;

    lifecycle::place_fighter(state, id, occupancy)?;
    debug!("{} respawned inside the swap grace window", id);
    state.push_event(GameEvent::respawned(state.tick, id));
    Ok(())
}

/// Deferred: put a promoted god at the god slot and resume the round timer.
pub fn spawn_pending_god(state: &mut MatchState, id: ParticipantId) -> GambitResult<()> {
    let pending = state.registry.get(id).is_some_and(|p| {
        p.alive && p.is_god() && matches!(p.placement, Placement::PendingGod { .. })
    });
    if !pending || !state.is_in_progress() {
        debug!("Dropping stale god spawn for {}", id);
        return Ok(());
    }

    lifecycle::place_god(state, id)?;
    state.round_timer.start();
    info!("God {} entered the arena", id);
    Ok(())
}

/// Returns true if the penalty eliminated the participant.
fn penalize(state: &mut MatchState, id: ParticipantId) -> bool {
    let Some(participant) = state.registry.get_mut(id) else {
        return false;
    };
    let eliminated = participant.penalize_life();
    let lives_left = participant.lives;

    if eliminated {
        lifecycle::eliminate(state, id);
    } else {
        state.push_event(GameEvent::life_lost(state.tick, id, lives_left));
    }
    eliminated
}

// =============================================================================
// TESTS
// =============================================================================
