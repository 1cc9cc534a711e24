//! Random sources for shot outcomes and escalation steps.
//!
//! The game never touches a global RNG. It receives a [`RandomSource`] so
//! tests can substitute a scripted sequence for the real generator.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform randomness used by the game engine.
///
/// Implementations must be shareable across tasks; the engine calls them
/// while holding its round lock, so they must never block on I/O.
pub trait RandomSource: Send + Sync {
    /// Returns a uniform sample in `[0, 1)`.
    fn unit(&self) -> f64;

    /// Returns a uniform integer in `[min, max]` (inclusive).
    ///
    /// Callers guarantee `min <= max`.
    fn range_inclusive(&self, min: u64, max: u64) -> u64;
}

// ============================================================================
// StdRandom
// ============================================================================

/// [`RandomSource`] backed by a `StdRng` behind a mutex.
///
/// Seeded generators produce the same outcome sequence on every run.
pub struct StdRandom {
    rng: Mutex<StdRng>,
    seed: Option<u64>,
}

impl StdRandom {
    /// Creates a generator seeded from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
            seed: None,
        }
    }

    /// Creates a deterministic generator.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            seed: Some(seed),
        }
    }

    /// Seeded when `seed` is given, OS-seeded otherwise.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::seeded)
    }

    /// Returns the seed, if this generator is deterministic.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl RandomSource for StdRandom {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn unit(&self) -> f64 {
        self.rng
            .lock()
            .expect("rng lock poisoned")
            .random::<f64>()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn range_inclusive(&self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.rng
            .lock()
            .expect("rng lock poisoned")
            .random_range(min..=max)
    }
}

impl std::fmt::Debug for StdRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdRandom")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ScriptedRandom
// ============================================================================

/// [`RandomSource`] that replays a fixed sequence of unit draws.
///
/// The sequence repeats once exhausted; an empty script always draws `0.0`.
/// Range draws always return the lower bound.
#[derive(Debug)]
pub struct ScriptedRandom {
    script: Vec<f64>,
    pending: Mutex<VecDeque<f64>>,
}

impl ScriptedRandom {
    /// Creates a source replaying `draws` in order.
    ///
    /// Values are clamped into `[0, 1)`.
    #[must_use]
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        let script: Vec<f64> = draws.into_iter().map(clamp_unit).collect();
        Self {
            pending: Mutex::new(script.iter().copied().collect()),
            script,
        }
    }

    /// Creates a source whose draws force the given outcomes for any
    /// probability strictly between 0 and 1.
    ///
    /// A hit draws `0.0`, a miss draws the largest value below `1.0`.
    #[must_use]
    pub fn outcomes(outcomes: impl IntoIterator<Item = super::Outcome>) -> Self {
        Self::new(outcomes.into_iter().map(|outcome| match outcome {
            super::Outcome::Hit => 0.0,
            super::Outcome::Miss => LARGEST_BELOW_ONE,
        }))
    }
}

/// Largest `f64` strictly below 1.0.
const LARGEST_BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else if value >= 1.0 {
        LARGEST_BELOW_ONE
    } else {
        value
    }
}

impl RandomSource for ScriptedRandom {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    fn unit(&self) -> f64 {
        let mut pending = self.pending.lock().expect("script lock poisoned");
        if pending.is_empty() {
            pending.extend(self.script.iter().copied());
        }
        pending.pop_front().unwrap_or(0.0)
    }

    fn range_inclusive(&self, min: u64, _max: u64) -> u64 {
        min
    }
}
