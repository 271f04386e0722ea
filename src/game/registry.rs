//! Entity Registry
//!
//! Tracks joined participants, their cosmetic variants and roles.
//! The roster keeps every participant of the match (for end-of-match
//! scoring); the active list only holds those still in play.

use std::collections::BTreeMap;

use crate::core::rng::DeterministicRng;
use crate::error::{GambitError, GambitResult};
use crate::game::participant::{Participant, ParticipantId, Role, VariantIndex};

/// Registry of participants for one match.
#[derive(Clone, Debug)]
pub struct EntityRegistry {
    /// Every joined participant (BTreeMap for deterministic iteration)
    roster: BTreeMap<ParticipantId, Participant>,
    /// Active participants in join order
    active: Vec<ParticipantId>,
    /// Every roster participant in join order
    join_order: Vec<ParticipantId>,
    /// Size of the variant pool
    variant_count: u8,
    /// Starting lives for new participants
    max_lives: i32,
    /// Starting health for new participants
    max_health: i32,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new(variant_count: u8, max_lives: i32, max_health: i32) -> Self {
        Self {
            roster: BTreeMap::new(),
            active: Vec::new(),
            join_order: Vec::new(),
            variant_count,
            max_lives,
            max_health,
        }
    }

    /// Join a participant, assigning an unused variant at random.
    pub fn join(&mut self, id: ParticipantId, rng: &mut DeterministicRng) -> GambitResult<VariantIndex> {
        if self.roster.contains_key(&id) {
            return Err(GambitError::AlreadyJoined(id));
        }

        let unused: Vec<VariantIndex> = (0..self.variant_count)
            .map(VariantIndex)
            .filter(|v| self.roster.values().all(|p| p.variant != *v))
            .collect();

        let variant = *rng
            .choose(&unused)
            .ok_or(GambitError::ResourceExhausted("no unused cosmetic variant"))?;

        self.roster.insert(id, Participant::new(id, variant, self.max_lives, self.max_health));
        self.active.push(id);
        self.join_order.push(id);
        Ok(variant)
    }

    /// Set a participant's role, returning the previous one.
    pub fn assign_role(&mut self, id: ParticipantId, role: Role) -> GambitResult<Option<Role>> {
        let participant = self.roster.get_mut(&id).ok_or(GambitError::NotFound(id))?;
        Ok(participant.role.replace(role))
    }

    /// Remove a participant from the active set.
    ///
    /// The roster entry survives until [`EntityRegistry::clear`].
    /// Returns false if the participant was not active.
    pub fn remove_participant(&mut self, id: ParticipantId) -> bool {
        let Some(pos) = self.active.iter().position(|p| *p == id) else {
            return false;
        };
        self.active.remove(pos);
        if let Some(participant) = self.roster.get_mut(&id) {
            participant.alive = false;
        }
        true
    }

    /// Bring every roster participant back into the active set, in join order.
    ///
    /// Roles and placements are cleared; health and lives restored.
    pub fn reactivate_all(&mut self) {
        self.active = self.join_order.clone();
        for participant in self.roster.values_mut() {
            participant.role = None;
            participant.survival_ticks = 0;
            participant.placement = Default::default();
            participant.restore(true);
        }
    }

    /// Forget every participant.
    pub fn clear(&mut self) {
        self.roster.clear();
        self.active.clear();
        self.join_order.clear();
    }

    /// Active participants in join order.
    pub fn alive(&self) -> Vec<&Participant> {
        self.active.iter().filter_map(|id| self.roster.get(id)).collect()
    }

    /// Ids of active fighters in join order.
    pub fn alive_fighters(&self) -> Vec<ParticipantId> {
        self.alive()
            .into_iter()
            .filter(|p| p.is_active_fighter())
            .map(|p| p.id)
            .collect()
    }

    /// The current god, if any.
    pub fn god(&self) -> Option<ParticipantId> {
        self.alive().into_iter().find(|p| p.is_god()).map(|p| p.id)
    }

    /// Get a participant by id.
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.roster.get(&id)
    }

    /// Get a participant mutably by id.
    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.roster.get_mut(&id)
    }

    /// Get an active participant mutably, or `NotFound`.
    pub fn active_mut(&mut self, id: ParticipantId) -> GambitResult<&mut Participant> {
        if !self.is_active(id) {
            return Err(GambitError::NotFound(id));
        }
        self.roster.get_mut(&id).ok_or(GambitError::NotFound(id))
    }

    /// Is this participant in the active set?
    pub fn is_active(&self, id: ParticipantId) -> bool {
        self.active.contains(&id)
    }

    /// Every participant ever joined this match (sorted by id).
    pub fn roster(&self) -> impl Iterator<Item = &Participant> {
        self.roster.values()
    }

    /// Active ids in join order.
    pub fn active_ids(&self) -> &[ParticipantId] {
        &self.active
    }

    /// Number of joined participants.
    pub fn participant_count(&self) -> usize {
        self.roster.len()
    }

    /// Number of active participants.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Sum of lives over active participants.
    pub fn lives_in_circulation(&self) -> i32 {
        self.alive().iter().map(|p| p.lives).sum()
    }

    /// Add one tick of survival time to every active fighter.
    pub fn accumulate_survival(&mut self) {
        for id in &self.active {
            if let Some(participant) = self.roster.get_mut(id) {
                if participant.is_active_fighter() {
                    participant.survival_ticks = participant.survival_ticks.saturating_add(1);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
