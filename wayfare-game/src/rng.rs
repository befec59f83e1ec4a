//! Deterministic RNG streams for session-level draws.
//!
//! Streams are derived from the user-visible seed with domain separation so
//! adding a new consumer never shifts the draws of an existing one.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Derive a domain-separated stream seed from a user seed.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// Per-session RNG streams, owned mutably by the session controller.
///
/// Only fallback scenario selection draws from randomness today; the stream
/// keeps its own domain tag so future consumers get fresh tags instead of
/// sharing this one. ChaCha keeps the draw sequence identical across
/// platforms and releases; the picks are part of the seed contract.
#[derive(Debug, Clone)]
pub struct SessionRng {
    scenario: ChaCha20Rng,
}

impl SessionRng {
    /// Construct the streams from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            scenario: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, b"scenario")),
        }
    }

    /// Stream used for fallback scenario selection.
    pub fn scenario(&mut self) -> &mut ChaCha20Rng {
        &mut self.scenario
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn stream_seeds_are_domain_separated() {
        let a = derive_stream_seed(1337, b"scenario");
        let b = derive_stream_seed(1337, b"policy");
        assert_ne!(a, b);
        assert_eq!(a, derive_stream_seed(1337, b"scenario"));
    }

    #[test]
    fn same_seed_yields_same_draws() {
        let mut first = SessionRng::from_user_seed(42);
        let mut second = SessionRng::from_user_seed(42);
        for _ in 0..16 {
            assert_eq!(first.scenario().next_u64(), second.scenario().next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut first = SessionRng::from_user_seed(1);
        let mut second = SessionRng::from_user_seed(2);
        let first_draws: Vec<u64> = (0..4).map(|_| first.scenario().next_u64()).collect();
        let second_draws: Vec<u64> = (0..4).map(|_| second.scenario().next_u64()).collect();
        assert_ne!(first_draws, second_draws);
    }
}
