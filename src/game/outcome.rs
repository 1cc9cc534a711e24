//! Hit-or-miss resolution for a single shot.

use super::random::RandomSource;

/// Result of pulling the trigger once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The chamber was loaded: mute the shooter and end the round.
    Hit,
    /// Blank: the round continues with a longer mute at stake.
    Miss,
}

impl Outcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chance that a shot hits, guaranteed to lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Probability(f64);

impl Probability {
    /// A shot never hits.
    pub const NEVER: Self = Self(0.0);

    /// A shot always hits.
    pub const ALWAYS: Self = Self(1.0);

    /// One shot in five hits.
    pub const ONE_IN_FIVE: Self = Self(0.2);

    /// Wraps `value` if it is a finite number in `[0, 1]`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    /// Returns the raw probability.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

/// Decides one shot.
///
/// Draws a single sample `x` in `[0, 1)` and hits iff `x < probability`.
/// With this strict comparison a probability of 0 can never hit and a
/// probability of 1 always hits.
pub fn decide(probability: Probability, rng: &dyn RandomSource) -> Outcome {
    if rng.unit() < probability.get() {
        Outcome::Hit
    } else {
        Outcome::Miss
    }
}
