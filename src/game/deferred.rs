//! Deferred Actions
//!
//! Work scheduled for a later tick. The tick loop drains due actions at one
//! fixed point, in (due tick, scheduling order), so delayed effects resolve
//! deterministically without a frame clock.

use std::collections::BTreeMap;

use crate::game::participant::ParticipantId;

/// Something to do on a later tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredAction {
    /// Put a freshly promoted god at the god slot
    SpawnGod {
        /// The promoted participant
        participant: ParticipantId,
    },
    /// Recompute the round length from the participant count
    RescaleRoundTimer,
    /// Try again to place a fighter that found every slot occupied
    RetryPlacement {
        /// The unplaced fighter
        participant: ParticipantId,
    },
}

impl DeferredAction {
    /// Participant this action concerns, if any.
    pub fn participant(&self) -> Option<ParticipantId> {
        match self {
            DeferredAction::SpawnGod { participant }
            | DeferredAction::RetryPlacement { participant } => Some(*participant),
            DeferredAction::RescaleRoundTimer => None,
        }
    }
}

/// Queue of deferred actions keyed by (due tick, sequence).
#[derive(Clone, Debug, Default)]
pub struct DeferredQueue {
    entries: BTreeMap<(u32, u64), DeferredAction>,
    next_seq: u64,
}

impl DeferredQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an action for `due_tick`.
    pub fn schedule(&mut self, due_tick: u32, action: DeferredAction) {
        self.entries.insert((due_tick, self.next_seq), action);
        self.next_seq += 1;
    }

    /// Schedule unless an identical action is already pending.
    pub fn schedule_once(&mut self, due_tick: u32, action: DeferredAction) {
        if !self.entries.values().any(|a| *a == action) {
            self.schedule(due_tick, action);
        }
    }

    /// Remove and return every action due at or before `tick`, in order.
    pub fn drain_due(&mut self, tick: u32) -> Vec<DeferredAction> {
        let due = match tick.checked_add(1) {
            Some(next) => {
                let later = self.entries.split_off(&(next, 0));
                std::mem::replace(&mut self.entries, later)
            }
            None => std::mem::take(&mut self.entries),
        };
        due.into_values().collect()
    }

    /// Drop pending actions for one participant.
    pub fn cancel_for(&mut self, participant: ParticipantId) {
        self.entries.retain(|_, a| a.participant() != Some(participant));
    }

    /// Is anything pending for this participant?
    pub fn has_pending_for(&self, participant: ParticipantId) -> bool {
        self.entries.values().any(|a| a.participant() == Some(participant))
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Nothing pending?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
