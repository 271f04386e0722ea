//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing shared by the match logic.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_match_seed};
pub use hash::{StateHash, compute_state_hash};
