//! Escalation rules: how much mute time a blank adds.

use super::random::RandomSource;

/// Seconds added to the round's mute duration on every miss.
///
/// Resolved once from configuration; the round state only ever asks for
/// [`EscalationRule::next_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationRule {
    /// Always add the same number of seconds.
    Fixed(u64),
    /// Add a uniformly drawn integer from `min..=max`.
    Range {
        /// Smallest step, in seconds
        min: u64,
        /// Largest step, in seconds
        max: u64,
    },
}

impl EscalationRule {
    /// Builds a range rule, collapsing `min == max` to [`EscalationRule::Fixed`].
    ///
    /// Returns `None` when `min > max`.
    #[must_use]
    pub const fn range(min: u64, max: u64) -> Option<Self> {
        if min > max {
            None
        } else if min == max {
            Some(Self::Fixed(min))
        } else {
            Some(Self::Range { min, max })
        }
    }

    /// Draws the step for one miss.
    pub fn next_step(&self, rng: &dyn RandomSource) -> u64 {
        match *self {
            Self::Fixed(step) => step,
            Self::Range { min, max } => rng.range_inclusive(min, max),
        }
    }
}

impl Default for EscalationRule {
    fn default() -> Self {
        Self::Fixed(30)
    }
}
