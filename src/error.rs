//! Error types for the match core.

use thiserror::Error;

use crate::game::participant::ParticipantId;

/// Errors surfaced by the match core.
///
/// `ConfigError` is fatal for the current match and must reach whoever set
/// up the stage. `NotFound`, `AlreadyJoined` and `ResourceExhausted` mean
/// "operation skipped"; the condition may clear on a later tick.
#[derive(Debug, Error)]
pub enum GambitError {
    /// Unknown participant id.
    #[error("participant {0} not found")]
    NotFound(ParticipantId),

    /// Participant id joined twice.
    #[error("participant {0} already joined")]
    AlreadyJoined(ParticipantId),

    /// No unused cosmetic variant or free spawn slot.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),

    /// Missing god slot, empty slot pool or invalid configuration value.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Operation not allowed in the current match phase.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GambitError {
    /// Whether the current match cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GambitError::ConfigError(_) | GambitError::Config(_) | GambitError::Io(_))
    }
}

/// Result alias for match core operations.
pub type GambitResult<T> = Result<T, GambitError>;
