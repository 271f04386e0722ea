//! Collaborator Commands
//!
//! Everything the engine feeds into the core arrives as a `MatchCommand`
//! queued for the next tick. Commands run in the order they were pushed.

use serde::{Serialize, Deserialize};

use crate::game::participant::ParticipantId;
use crate::game::spawn::SpawnPose;

/// One input from the presentation/engine layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MatchCommand {
    /// A device joined as this participant
    Join(ParticipantId),
    /// The lobby asked to start
    Ready,
    /// An externally driven pre-match countdown reached zero
    CountdownElapsed,
    /// Combat damage landed on a participant
    Damage {
        participant: ParticipantId,
        amount: u32,
    },
    /// A heal landed on a participant
    Heal {
        participant: ParticipantId,
        amount: u32,
    },
    /// An externally driven round timer ran out
    TimerExpired,
    /// A stage finished loading; these are its spawn locations
    LoadStage {
        slots: Vec<SpawnPose>,
        god_slot: Option<SpawnPose>,
    },
    /// Play again with the same participants
    Restart,
    /// Drop every participant and return to a fresh lobby
    UnjoinAll,
}

impl MatchCommand {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchCommand::Join(_) => "join",
            MatchCommand::Ready => "ready",
            MatchCommand::CountdownElapsed => "countdown_elapsed",
            MatchCommand::Damage { .. } => "damage",
            MatchCommand::Heal { .. } => "heal",
            MatchCommand::TimerExpired => "timer_expired",
            MatchCommand::LoadStage { .. } => "load_stage",
            MatchCommand::Restart => "restart",
            MatchCommand::UnjoinAll => "unjoin_all",
        }
    }
}

/// Commands recorded per tick, for replay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommandLog {
    /// (tick, commands) in tick order; empty ticks are not stored
    frames: Vec<(u32, Vec<MatchCommand>)>,
}

impl CommandLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the commands applied on `tick`.
    pub fn record(&mut self, tick: u32, commands: &[MatchCommand]) {
        if commands.is_empty() {
            return;
        }
        match self.frames.last_mut() {
            Some((last, frame)) if *last == tick => frame.extend_from_slice(commands),
            _ => self.frames.push((tick, commands.to_vec())),
        }
    }

    /// Commands for one tick (empty if none).
    pub fn commands_at(&self, tick: u32) -> &[MatchCommand] {
        self.frames
            .binary_search_by_key(&tick, |(t, _)| *t)
            .map(|idx| self.frames[idx].1.as_slice())
            .unwrap_or(&[])
    }

    /// Last tick with any command.
    pub fn last_tick(&self) -> Option<u32> {
        self.frames.last().map(|(t, _)| *t)
    }

    /// Total number of recorded commands.
    pub fn command_count(&self) -> usize {
        self.frames.iter().map(|(_, f)| f.len()).sum()
    }
}
