//! Match Configuration
//!
//! Every tunable of the match core. Durations are in ticks at
//! [`TICK_RATE`](crate::TICK_RATE). Missing JSON fields fall back to
//! [`MatchConfig::default`].

use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::error::{GambitError, GambitResult};
use crate::TICK_RATE;

/// Configuration for the match core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Participants needed before `Ready` starts the countdown (never below 2)
    pub min_participants: usize,
    /// Size of the cosmetic variant pool (also caps the participant count)
    pub variant_count: u8,
    /// Lives each participant starts with
    pub max_lives: i32,
    /// Health each participant starts with
    pub max_health: i32,
    /// Any damage costs a life, regardless of remaining health
    pub one_hit_kill: bool,
    /// Pre-match countdown
    pub countdown_ticks: u32,
    /// Base length of the round timer that forces a swap
    pub round_ticks: u32,
    /// Round timer extension per participant beyond the first
    pub extra_ticks_per_participant: u32,
    /// Delay between a swap and the promoted god appearing at the god slot
    pub god_spawn_delay_ticks: u32,
    /// Window after a promotion during which swaps become plain respawns
    pub swap_grace_ticks: u32,
    /// Timer-triggered swaps cost the outgoing god a life
    pub god_loses_life_on_swap: bool,
    /// Ask the presentation layer to clear spawned enemies on swap
    pub purge_level_on_swap: bool,
    /// Restart the round timer on every swap
    pub reset_timer_on_swap: bool,
    /// Debug: the first joiner always starts as god
    pub god_first: bool,
    /// Delay before retrying a placement that found every slot occupied
    pub placement_retry_ticks: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            variant_count: 4,
            max_lives: 3,
            max_health: 100,
            one_hit_kill: false,
            countdown_ticks: 3 * TICK_RATE,          // 3 seconds
            round_ticks: 180 * TICK_RATE,            // 3 minutes
            extra_ticks_per_participant: 10 * TICK_RATE,
            god_spawn_delay_ticks: 2 * TICK_RATE,
            swap_grace_ticks: 2 * TICK_RATE,
            god_loses_life_on_swap: true,
            purge_level_on_swap: true,
            reset_timer_on_swap: true,
            god_first: false,
            placement_retry_ticks: 1,
        }
    }
}

impl MatchConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> GambitResult<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> GambitResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the core cannot run with.
    pub fn validate(&self) -> GambitResult<()> {
        if self.variant_count < 2 {
            return Err(GambitError::ConfigError(format!(
                "variant_count must be at least 2, got {}",
                self.variant_count
            )));
        }
        if self.max_lives < 0 {
            return Err(GambitError::ConfigError(format!(
                "max_lives must not be negative, got {}",
                self.max_lives
            )));
        }
        if self.max_health <= 0 {
            return Err(GambitError::ConfigError(format!(
                "max_health must be positive, got {}",
                self.max_health
            )));
        }
        Ok(())
    }

    /// Minimum participant count, clamped to `[2, variant_count]`.
    pub fn effective_min_participants(&self) -> usize {
        let max = (self.variant_count as usize).max(2);
        self.min_participants.clamp(2, max)
    }

    /// Round length for a given participant count.
    pub fn scaled_round_ticks(&self, participant_count: usize) -> u32 {
        let extra = participant_count.saturating_sub(1) as u32;
        self.round_ticks
            .saturating_add(self.extra_ticks_per_participant.saturating_mul(extra))
    }
}
