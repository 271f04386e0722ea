//! Spawn Point Allocator
//!
//! Fighter spawn slots with exclusion-based random selection, plus the single
//! reserved god slot. Slots picked once stay "used" until the whole pool has
//! been handed out, then the pool wraps around.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::error::{GambitError, GambitResult};

/// Index of a fighter spawn slot within the loaded pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u16);

/// Position and facing of a spawn location, in engine units.
///
/// The core never does geometry with these; they are carried through
/// to the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnPose {
    /// World position
    pub position: [f32; 3],
    /// Facing around the up axis, in degrees
    pub yaw_degrees: f32,
}

impl SpawnPose {
    /// Create a pose.
    pub const fn new(x: f32, y: f32, z: f32, yaw_degrees: f32) -> Self {
        Self { position: [x, y, z], yaw_degrees }
    }
}

/// A fighter spawn slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnSlot {
    /// Slot index
    pub id: SlotId,
    /// Where the slot is
    pub pose: SpawnPose,
    /// Picked since the last reset?
    pub used: bool,
}

/// Geometric occupancy check supplied by the engine.
pub trait OccupancyQuery {
    /// Is something standing in this slot right now?
    fn is_occupied(&self, slot: &SpawnSlot) -> bool;
}

impl<F> OccupancyQuery for F
where
    F: Fn(&SpawnSlot) -> bool,
{
    fn is_occupied(&self, slot: &SpawnSlot) -> bool {
        self(slot)
    }
}

/// Occupancy query for headless runs: every slot is free.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverOccupied;

impl OccupancyQuery for NeverOccupied {
    fn is_occupied(&self, _slot: &SpawnSlot) -> bool {
        false
    }
}

/// Spawn slot pool for the current stage.
#[derive(Clone, Debug, Default)]
pub struct SpawnAllocator {
    slots: Vec<SpawnSlot>,
    god_slot: Option<SpawnPose>,
}

impl SpawnAllocator {
    /// Create an empty allocator (nothing discovered yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pool with the slots discovered on a stage.
    pub fn load_slots(&mut self, poses: &[SpawnPose], god_slot: Option<SpawnPose>) -> GambitResult<()> {
        if poses.is_empty() {
            return Err(GambitError::ConfigError("no fighter spawn slots on stage".into()));
        }
        if poses.len() > u16::MAX as usize {
            return Err(GambitError::ConfigError(format!("too many spawn slots: {}", poses.len())));
        }

        self.slots = poses
            .iter()
            .enumerate()
            .map(|(i, pose)| SpawnSlot { id: SlotId(i as u16), pose: *pose, used: false })
            .collect();
        self.god_slot = god_slot;
        Ok(())
    }

    /// Pick a random slot that is neither used nor occupied, and mark it used.
    ///
    /// Wraps around (clears every `used` flag) once the whole pool is used.
    /// Fails with `ResourceExhausted` when every candidate is occupied.
    pub fn pick_random_unused(
        &mut self,
        rng: &mut DeterministicRng,
        occupancy: &dyn OccupancyQuery,
    ) -> GambitResult<SpawnSlot> {
        if self.slots.is_empty() {
            return Err(GambitError::ConfigError("spawn slots were never loaded".into()));
        }

        if self.slots.iter().all(|s| s.used) {
            self.reset_used();
        }

        let candidates: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.used && !occupancy.is_occupied(s))
            .map(|(i, _)| i)
            .collect();

        let idx = *rng
            .choose(&candidates)
            .ok_or(GambitError::ResourceExhausted("every free spawn slot is occupied"))?;

        let slot = &mut self.slots[idx];
        slot.used = true;
        Ok(*slot)
    }

    /// The reserved god slot.
    pub fn god_slot(&self) -> GambitResult<SpawnPose> {
        self.god_slot
            .ok_or_else(|| GambitError::ConfigError("no god spawn slot on stage".into()))
    }

    /// Check the stage can host a match.
    pub fn ensure_ready(&self) -> GambitResult<()> {
        if self.slots.is_empty() {
            return Err(GambitError::ConfigError("spawn slots were never loaded".into()));
        }
        self.god_slot().map(|_| ())
    }

    /// Clear every `used` flag.
    pub fn reset_used(&mut self) {
        for slot in &mut self.slots {
            slot.used = false;
        }
    }

    /// Forget the stage entirely.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.god_slot = None;
    }

    /// All fighter slots.
    pub fn slots(&self) -> &[SpawnSlot] {
        &self.slots
    }

    /// Number of slots currently marked used.
    pub fn used_count(&self) -> usize {
        self.slots.iter().filter(|s| s.used).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
