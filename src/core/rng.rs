//! Deterministic Random Number Generator
//!
//! Xorshift128+ seeded through SplitMix64. Every random decision in a match
//! (variant pick, god pick, spawn pick, swap target) draws from one instance
//! owned by the match, so a seed plus a command stream replays exactly.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use godly_gambit::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift must never sit on the all-zero state
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Modulo bias is negligible for the tiny ranges used here
        (self.next_u64() % max as u64) as u32
    }

    /// Pick a uniformly random index into a collection of `len` items.
    #[inline]
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.next_int(len as u32) as usize)
        }
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        self.pick_index(slice.len()).map(|idx| &slice[idx])
    }

    /// Get current state (for hashing and checkpoints).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

/// SplitMix64 for seed initialization.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a match seed from the match id and the joined participants.
///
/// `participants` must be given in join order; the same lobby always
/// produces the same seed.
pub fn derive_match_seed(match_id: &[u8; 16], participants: &[u32]) -> u64 {
    let mut hasher = Sha256::new();

    hasher.update(b"GODLY_GAMBIT_SEED_V1");
    hasher.update(match_id);
    for id in participants {
        hasher.update(id.to_le_bytes());
    }

    let hash = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_next_int() {
        let mut rng = DeterministicRng::new(1234);

        for _ in 0..1000 {
            assert!(rng.next_int(7) < 7);
        }

        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_pick_index_empty() {
        let mut rng = DeterministicRng::new(1);
        assert_eq!(rng.pick_index(0), None);
        assert!(rng.choose::<u8>(&[]).is_none());
        assert_eq!(rng.choose(&[42]), Some(&42));
    }

    #[test]
    fn test_pick_index_covers_range() {
        let mut rng = DeterministicRng::new(99);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[rng.pick_index(4).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s), "every index should come up");
    }

    #[test]
    fn test_derive_match_seed() {
        let match_id = [1u8; 16];

        let seed1 = derive_match_seed(&match_id, &[0, 1, 2]);
        let seed2 = derive_match_seed(&match_id, &[0, 1, 2]);
        assert_eq!(seed1, seed2);

        let seed3 = derive_match_seed(&[9u8; 16], &[0, 1, 2]);
        assert_ne!(seed1, seed3);

        let seed4 = derive_match_seed(&match_id, &[0, 1]);
        assert_ne!(seed1, seed4);
    }
}
