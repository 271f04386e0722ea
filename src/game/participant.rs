//! Participant State
//!
//! One joined player: role, cosmetic variant, lives and health.
//! Lives may go negative; a negative count means the participant is out.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::spawn::SlotId;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable participant identifier (join index assigned by the lobby).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

/// Cosmetic variant (material/colour set) index, unique within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantIndex(pub u8);

// =============================================================================
// ROLE & PLACEMENT
// =============================================================================

/// Role held by a participant once the match is set up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    /// Casts area abilities, never takes combat damage
    God = 0,
    /// Fights, takes damage and can be eliminated
    Fighter = 1,
}

/// Where a participant currently stands in the arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// Not in the arena (lobby, eliminated, waiting for a free slot)
    #[default]
    Unplaced,
    /// At a fighter spawn slot
    Slot(SlotId),
    /// At the reserved god slot
    GodSlot,
    /// Promoted to god; appears at the god slot on `due_tick`
    PendingGod {
        /// Tick on which the god is placed
        due_tick: u32,
    },
}

/// Result of applying damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Nothing happened (god, or already eliminated)
    Ignored,
    /// Health dropped but the participant survived the hit
    Hurt {
        /// Health after the hit
        health: i32,
    },
    /// A life was spent; health is back to max
    LifeLost {
        /// Lives remaining after the loss
        lives_left: i32,
    },
    /// Lives dropped below zero
    Eliminated,
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// State of a single participant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    /// Stable id
    pub id: ParticipantId,
    /// Current role (`None` until the match sets roles)
    pub role: Option<Role>,
    /// Cosmetic variant
    pub variant: VariantIndex,
    /// Remaining lives; negative means eliminated
    pub lives: i32,
    /// Lives at match start
    pub max_lives: i32,
    /// Current health in [0, max_health]
    pub health: i32,
    /// Health after a respawn
    pub max_health: i32,
    /// Still in the active set?
    pub alive: bool,
    /// Ticks spent as an active fighter during the match
    pub survival_ticks: u32,
    /// Current arena placement
    pub placement: Placement,
}

impl Participant {
    /// Create a freshly joined participant.
    pub fn new(id: ParticipantId, variant: VariantIndex, max_lives: i32, max_health: i32) -> Self {
        Self {
            id,
            role: None,
            variant,
            lives: max_lives,
            max_lives,
            health: max_health,
            max_health,
            alive: true,
            survival_ticks: 0,
            placement: Placement::Unplaced,
        }
    }

    /// Holds the god role?
    #[inline]
    pub fn is_god(&self) -> bool {
        self.role == Some(Role::God)
    }

    /// Alive fighter?
    #[inline]
    pub fn is_active_fighter(&self) -> bool {
        self.alive && self.role == Some(Role::Fighter)
    }

    /// Lives as shown on the HUD (the last life counts as one).
    #[inline]
    pub fn visual_lives(&self) -> i32 {
        self.lives + 1
    }

    /// Apply combat damage.
    pub fn damage(&mut self, amount: u32, one_hit_kill: bool) -> DamageOutcome {
        if !self.alive || self.is_god() {
            return DamageOutcome::Ignored;
        }

        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(amount).max(0);

        if self.health == 0 || one_hit_kill {
            return self.kill();
        }

        DamageOutcome::Hurt { health: self.health }
    }

    /// Spend a life, or eliminate when none are left.
    pub fn kill(&mut self) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }

        if self.lives > 0 {
            self.health = self.max_health;
            self.lives -= 1;
            DamageOutcome::LifeLost { lives_left: self.lives }
        } else {
            self.eliminate();
            DamageOutcome::Eliminated
        }
    }

    /// Lose one life outside of combat (swap penalty).
    ///
    /// Returns true if this eliminated the participant.
    pub fn penalize_life(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.lives -= 1;
        if self.lives < 0 {
            self.health = 0;
            self.alive = false;
            self.placement = Placement::Unplaced;
            return true;
        }
        false
    }

    /// Heal, clamped to max. Returns the new health when applied.
    pub fn heal(&mut self, amount: u32) -> Option<i32> {
        if !self.alive {
            return None;
        }
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.health = self.health.saturating_add(amount).min(self.max_health);
        Some(self.health)
    }

    /// Back to full health, optionally full lives, and alive again.
    pub fn restore(&mut self, reset_lives: bool) {
        self.alive = true;
        self.health = self.max_health;
        if reset_lives {
            self.lives = self.max_lives;
        }
    }

    fn eliminate(&mut self) {
        self.health = 0;
        self.lives -= 1;
        self.alive = false;
        self.placement = Placement::Unplaced;
    }
}

// =============================================================================
// TESTS
// =============================================================================
