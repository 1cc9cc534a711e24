//! Round state representation.
//!
//! A round starts lazily on the first shot, grows its mute duration with
//! every blank, and disappears the moment someone is hit.

use super::escalation::EscalationRule;
use super::random::RandomSource;
use crate::error::RoundError;

/// A live round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    /// Mute duration a hit would apply right now, in seconds
    mute_secs: u64,
    /// Blanks fired since the round started
    misses: u32,
}

impl Round {
    const fn new(initial_mute_secs: u64) -> Self {
        Self {
            mute_secs: initial_mute_secs,
            misses: 0,
        }
    }

    /// Mute duration at stake, in seconds.
    #[must_use]
    pub const fn mute_secs(&self) -> u64 {
        self.mute_secs
    }

    /// Number of blanks survived this round.
    #[must_use]
    pub const fn misses(&self) -> u32 {
        self.misses
    }
}

/// Slot holding at most one active [`Round`].
///
/// The only mutation paths are [`ensure_started`](Self::ensure_started),
/// [`escalate`](Self::escalate) and
/// [`resolve_and_clear`](Self::resolve_and_clear). Callers sharing one
/// `RoundState` must serialize access; [`crate::game::Roulette`] does so
/// with a mutex.
#[derive(Debug, Default)]
pub struct RoundState {
    active: Option<Round>,
}

impl RoundState {
    /// Creates an empty slot with no active round.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Returns the active round, starting one at `initial_mute_secs` if
    /// none is active. Never resets a round in progress.
    pub fn ensure_started(&mut self, initial_mute_secs: u64) -> &Round {
        self.active.get_or_insert_with(|| {
            tracing::debug!(mute_secs = initial_mute_secs, "starting new round");
            Round::new(initial_mute_secs)
        })
    }

    /// Adds one escalation step to the active round.
    ///
    /// Returns the new mute duration in seconds. The duration saturates at
    /// `u64::MAX` rather than wrapping.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::NoActiveRound`] if no round is active.
    pub fn escalate(
        &mut self,
        rule: &EscalationRule,
        rng: &dyn RandomSource,
    ) -> Result<u64, RoundError> {
        let round = self.active.as_mut().ok_or(RoundError::NoActiveRound {
            operation: "escalate",
        })?;
        let step = rule.next_step(rng);
        round.mute_secs = round.mute_secs.saturating_add(step);
        round.misses = round.misses.saturating_add(1);
        Ok(round.mute_secs)
    }

    /// Ends the active round and returns it.
    ///
    /// The returned round's [`mute_secs`](Round::mute_secs) is the duration
    /// to apply to the shooter.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError::NoActiveRound`] if no round is active.
    pub fn resolve_and_clear(&mut self) -> Result<Round, RoundError> {
        self.active.take().ok_or(RoundError::NoActiveRound {
            operation: "resolve_and_clear",
        })
    }

    /// Returns the active round, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Round> {
        self.active.as_ref()
    }

    /// Returns whether a round is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
