//! # Offering Name Generation
//!
//! Offerings are hosted at `{participantId}/{name}.json`, where `name` is
//! `service_` followed by a short random alphanumeric suffix. The generator
//! is an injected capability so tests can seed it.

use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Prefix of every generated offering name.
pub const SERVICE_NAME_PREFIX: &str = "service_";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 4;

/// Source of random name suffixes.
pub trait NameGenerator: Send + Sync {
    /// A random string of `len` characters from `[A-Za-z0-9]`.
    fn suffix(&self, len: usize) -> String;

    /// A full offering name, e.g. `service_a9Zq`.
    fn service_name(&self) -> String {
        format!("{SERVICE_NAME_PREFIX}{}", self.suffix(SUFFIX_LEN))
    }
}

/// [`NameGenerator`] backed by a seedable PRNG.
pub struct SeededNameGenerator {
    rng: Mutex<StdRng>,
}

impl SeededNameGenerator {
    /// Deterministic generator: equal seeds yield equal sequences.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl std::fmt::Debug for SeededNameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededNameGenerator").finish_non_exhaustive()
    }
}

impl NameGenerator for SeededNameGenerator {
    fn suffix(&self, len: usize) -> String {
        let mut rng = self.rng.lock();
        (&mut *rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}
