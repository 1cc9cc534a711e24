//! Roulette game engine
//!
//! Owns the single process-wide round and applies one shot at a time.
//!
//! # Architecture
//!
//! - [`RoundState`] - Slot with at most one active round
//! - [`EscalationRule`] - Step added to the mute duration on a miss
//! - [`decide`] - Hit/miss resolution from a [`Probability`]
//! - [`Roulette`] - Serializes shots over the shared round
//! - [`format_duration`] - Human-readable durations for replies

pub mod escalation;
pub mod format;
pub mod outcome;
pub mod random;
pub mod round;

pub use escalation::EscalationRule;
pub use format::format_duration;
pub use outcome::{Outcome, Probability, decide};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use round::{Round, RoundState};

use std::sync::{Arc, Mutex};

use crate::error::RoundError;
use crate::observability::metrics;

/// Fully resolved game parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameRules {
    /// Chance that any single shot hits
    pub probability: Probability,
    /// Mute applied by a hit on a fresh round, in seconds
    pub initial_mute_secs: u64,
    /// Growth of the mute duration per miss
    pub escalation: EscalationRule,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            probability: Probability::ONE_IN_FIVE,
            initial_mute_secs: 30,
            escalation: EscalationRule::default(),
        }
    }
}

/// Result of one shot against the shared round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shot {
    /// The shooter is hit; the round has already been cleared.
    Hit {
        /// Mute to apply, in seconds
        mute_secs: u64,
        /// Blanks fired before this hit
        misses: u32,
    },
    /// Blank; the round continues.
    Miss {
        /// Mute now at stake, in seconds
        mute_secs: u64,
    },
}

impl Shot {
    /// The outcome that produced this shot.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        match self {
            Self::Hit { .. } => Outcome::Hit,
            Self::Miss { .. } => Outcome::Miss,
        }
    }

    /// Mute duration carried by this shot, in seconds.
    #[must_use]
    pub const fn mute_secs(&self) -> u64 {
        match *self {
            Self::Hit { mute_secs, .. } | Self::Miss { mute_secs } => mute_secs,
        }
    }
}

/// The roulette engine.
///
/// Holds the process-wide [`RoundState`] behind a mutex. Each call to
/// [`shoot`](Self::shoot) runs ensure-started, decide, and
/// escalate-or-clear under a single lock acquisition, so concurrent
/// callers observe the same sequence of states as serial ones. The lock
/// is never held across an `.await`.
pub struct Roulette {
    rules: GameRules,
    rng: Arc<dyn RandomSource>,
    state: Mutex<RoundState>,
}

impl Roulette {
    /// Creates an engine with no active round.
    #[must_use]
    pub fn new(rules: GameRules, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            rules,
            rng,
            state: Mutex::new(RoundState::new()),
        }
    }

    /// Returns the rules this engine plays by.
    #[must_use]
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Fires one shot.
    ///
    /// Shot metrics are recorded while the round is locked, so the
    /// current-mute gauge follows shot order.
    ///
    /// # Errors
    ///
    /// Returns [`RoundError`] only if the round state invariants are
    /// broken, which would indicate a bug in this module.
    ///
    /// # Panics
    ///
    /// Panics if the round mutex is poisoned.
    pub fn shoot(&self) -> Result<Shot, RoundError> {
        let mut state = self.state.lock().expect("round state lock poisoned");
        state.ensure_started(self.rules.initial_mute_secs);

        let shot = match decide(self.rules.probability, self.rng.as_ref()) {
            Outcome::Hit => {
                let round = state.resolve_and_clear()?;
                Shot::Hit {
                    mute_secs: round.mute_secs(),
                    misses: round.misses(),
                }
            }
            Outcome::Miss => Shot::Miss {
                mute_secs: state.escalate(&self.rules.escalation, self.rng.as_ref())?,
            },
        };
        metrics::record_shot(&shot);
        drop(state);

        Ok(shot)
    }

    /// Mute duration at stake in the active round, if any.
    ///
    /// # Panics
    ///
    /// Panics if the round mutex is poisoned.
    #[must_use]
    pub fn current_mute(&self) -> Option<u64> {
        self.state
            .lock()
            .expect("round state lock poisoned")
            .current()
            .map(Round::mute_secs)
    }

    /// Returns whether a round is in progress.
    ///
    /// # Panics
    ///
    /// Panics if the round mutex is poisoned.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state
            .lock()
            .expect("round state lock poisoned")
            .is_active()
    }
}

impl std::fmt::Debug for Roulette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roulette")
            .field("rules", &self.rules)
            .field("current_mute", &self.current_mute())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn rules(probability: f64, initial: u64, escalation: EscalationRule) -> GameRules {
        GameRules {
            probability: Probability::new(probability).unwrap(),
            initial_mute_secs: initial,
            escalation,
        }
    }

    fn scripted(outcomes: &[Outcome]) -> Arc<dyn RandomSource> {
        Arc::new(ScriptedRandom::outcomes(outcomes.iter().copied()))
    }

    #[test]
    fn test_no_round_before_first_shot() {
        let game = Roulette::new(GameRules::default(), Arc::new(StdRandom::seeded(1)));
        assert!(!game.is_active());
        assert_eq!(game.current_mute(), None);
    }

    #[test]
    fn test_three_misses_then_hit() {
        use Outcome::{Hit, Miss};
        let game = Roulette::new(
            rules(0.5, 30, EscalationRule::Fixed(30)),
            scripted(&[Miss, Miss, Miss, Hit]),
        );

        assert_eq!(game.shoot(), Ok(Shot::Miss { mute_secs: 60 }));
        assert_eq!(game.shoot(), Ok(Shot::Miss { mute_secs: 90 }));
        assert_eq!(game.shoot(), Ok(Shot::Miss { mute_secs: 120 }));
        assert_eq!(
            game.shoot(),
            Ok(Shot::Hit {
                mute_secs: 120,
                misses: 3
            })
        );
        assert!(!game.is_active());
    }

    #[test]
    fn test_first_shot_hit_uses_initial_mute() {
        let game = Roulette::new(
            rules(1.0, 45, EscalationRule::Fixed(30)),
            Arc::new(StdRandom::seeded(5)),
        );
        assert_eq!(
            game.shoot(),
            Ok(Shot::Hit {
                mute_secs: 45,
                misses: 0
            })
        );
    }

    #[test]
    fn test_round_restarts_after_hit() {
        use Outcome::{Hit, Miss};
        let game = Roulette::new(
            rules(0.5, 30, EscalationRule::Fixed(30)),
            scripted(&[Miss, Miss, Hit, Miss]),
        );
        game.shoot().unwrap();
        game.shoot().unwrap();
        game.shoot().unwrap();
        assert_eq!(game.shoot(), Ok(Shot::Miss { mute_secs: 60 }));
    }

    #[test]
    fn test_zero_probability_only_escalates() {
        let game = Roulette::new(
            rules(0.0, 30, EscalationRule::Fixed(1)),
            Arc::new(StdRandom::seeded(11)),
        );
        for _ in 0..1_000 {
            assert_eq!(game.shoot().unwrap().outcome(), Outcome::Miss);
        }
        assert_eq!(game.current_mute(), Some(1_030));
    }

    #[test]
    fn test_concurrent_misses_are_not_lost() {
        let game = Arc::new(Roulette::new(
            rules(0.0, 30, EscalationRule::Fixed(2)),
            Arc::new(StdRandom::seeded(3)),
        ));
        let mut handles = vec![];

        for _ in 0..10 {
            let g = Arc::clone(&game);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    g.shoot().unwrap();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(game.current_mute(), Some(30 + 2 * 1_000));
    }

    fn rendered_mute_gauge(handle: &metrics_exporter_prometheus::PrometheusHandle) -> f64 {
        handle
            .render()
            .lines()
            .find_map(|line| line.strip_prefix("roulette_current_mute_seconds "))
            .and_then(|value| value.trim().parse().ok())
            .unwrap()
    }

    #[test]
    fn test_mute_gauge_tracks_each_shot() {
        use Outcome::{Hit, Miss};
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let game = Roulette::new(
            rules(0.5, 30, EscalationRule::Fixed(30)),
            scripted(&[Miss, Hit, Miss]),
        );

        ::metrics::with_local_recorder(&recorder, || {
            game.shoot().unwrap();
            assert_eq!(rendered_mute_gauge(&handle), 60.0);
            game.shoot().unwrap();
            assert_eq!(rendered_mute_gauge(&handle), 0.0);
            game.shoot().unwrap();
            assert_eq!(rendered_mute_gauge(&handle), 60.0);
        });
    }

    #[test]
    fn test_mute_gauge_matches_round_after_concurrent_shots() {
        use Outcome::{Hit, Miss};
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let game = Roulette::new(
            rules(0.5, 30, EscalationRule::Fixed(5)),
            scripted(&[Miss, Miss, Hit, Miss, Miss, Miss, Hit]),
        );

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    ::metrics::with_local_recorder(&recorder, || {
                        for _ in 0..250 {
                            game.shoot().unwrap();
                        }
                    });
                });
            }
        });

        let expected = game.current_mute().unwrap_or(0);
        assert_eq!(rendered_mute_gauge(&handle), expected as f64);
    }

    #[test]
    fn test_shot_accessors() {
        let hit = Shot::Hit {
            mute_secs: 90,
            misses: 2,
        };
        assert_eq!(hit.outcome(), Outcome::Hit);
        assert_eq!(hit.mute_secs(), 90);
        assert_eq!(Shot::Miss { mute_secs: 60 }.outcome(), Outcome::Miss);
    }

    #[test]
    fn test_debug_output() {
        let game = Roulette::new(GameRules::default(), Arc::new(StdRandom::seeded(1)));
        let debug = format!("{game:?}");
        assert!(debug.contains("Roulette"));
        assert!(debug.contains("current_mute: None"));
    }
}
