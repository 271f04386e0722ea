//! # Godly Gambit Match Core
//!
//! Role-rotation and match-state core for Godly Gambit: one player is the
//! god, everyone else fights, and the roles rotate on lost lives and when
//! the round timer runs out.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GODLY GAMBIT CORE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Match logic (deterministic)               │
//! │  ├── registry.rs - Participants, variants, roles             │
//! │  ├── spawn.rs    - Spawn slot allocation                     │
//! │  ├── lifecycle.rs- Lobby → countdown → play → end            │
//! │  ├── swap.rs     - God/fighter role exchange                 │
//! │  ├── score.rs    - Records and ranking                       │
//! │  ├── deferred.rs - Work scheduled for later ticks            │
//! │  └── tick.rs     - Authoritative match loop                  │
//! │                                                              │
//! │  config.rs       - Match tunables (JSON)                     │
//! │  error.rs        - Error type                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies; delays are counted in ticks
//! - All randomness from seeded Xorshift128+
//!
//! Given identical commands and RNG seed, two matches produce identical
//! events and state hashes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use config::MatchConfig;
pub use error::{GambitError, GambitResult};
pub use game::command::MatchCommand;
pub use game::state::{MatchState, MatchPhase};
pub use game::participant::{ParticipantId, Role};
pub use game::tick::{tick, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Match tick rate (Hz)
pub const TICK_RATE: u32 = 60;
