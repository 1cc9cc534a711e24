//! The roulette chat command.
//!
//! [`RouletteCommand`] filters incoming [`Invocation`]s, fires one shot per
//! accepted invocation, and turns the result into platform calls:
//!
//! - hit: one mute, then the killed message; the new-round message is
//!   delivered from a background task after the configured delay
//! - miss: one survived reply with the new mute time
//!
//! The delayed announcement never blocks the caller. Hosts call
//! [`RouletteCommand::flush_announcements`] before shutting down so pending
//! announcements are delivered.
//!
//! A failed mute is not rolled back: the round stays cleared, the error
//! propagates, and no outcome messages are sent for that shot.

pub mod messages;

pub use messages::{HitReply, render, survived_reply};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;

use crate::config::schema::{CommandSpec, MessageTemplates, RouletteConfig};
use crate::error::RouletteError;
use crate::game::{Outcome, Roulette, Shot, StdRandom};
use crate::observability::metrics::{self, RejectReason};
use crate::platform::{ChatPlatform, Invocation, RoomId, UserId};

/// The registered roulette command.
pub struct RouletteCommand {
    spec: CommandSpec,
    messages: MessageTemplates,
    game: Arc<Roulette>,
    platform: Arc<dyn ChatPlatform>,
    announcements: TaskTracker,
}

impl RouletteCommand {
    /// Creates the command around an existing engine.
    #[must_use]
    pub fn new(
        config: &RouletteConfig,
        game: Arc<Roulette>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            spec: config.command.clone(),
            messages: config.messages.clone(),
            game,
            platform,
            announcements: TaskTracker::new(),
        }
    }

    /// Creates the command with an engine seeded from `config.seed`.
    #[must_use]
    pub fn from_config(config: &RouletteConfig, platform: Arc<dyn ChatPlatform>) -> Self {
        let rng = Arc::new(StdRandom::new(config.seed));
        let game = Arc::new(Roulette::new(config.rules, rng));
        Self::new(config, game, platform)
    }

    /// Returns the command's registration metadata.
    #[must_use]
    pub const fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Returns the engine holding the shared round.
    #[must_use]
    pub fn game(&self) -> &Roulette {
        &self.game
    }

    /// Checks whether `invocation` may fire, returning its room if so.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] when the content is not this command or
    /// the invocation has no room.
    pub fn accept<'a>(&self, invocation: &'a Invocation) -> Result<&'a RoomId, RejectReason> {
        if invocation.content.trim() != self.spec.name {
            return Err(RejectReason::NotCommand);
        }
        invocation.room.as_ref().ok_or(RejectReason::NoRoom)
    }

    /// Dispatches a raw invocation.
    ///
    /// Returns `Ok(None)` when the invocation is not for this command or
    /// was sent outside a room.
    ///
    /// # Errors
    ///
    /// Returns an error if the shot fails; see [`execute`](Self::execute).
    pub async fn handle(&self, invocation: &Invocation) -> Result<Option<Shot>, RouletteError> {
        match self.accept(invocation) {
            Ok(room) => self.execute(room, &invocation.user).await.map(Some),
            Err(reason) => {
                if reason != RejectReason::NotCommand {
                    tracing::debug!(user = %invocation.user, ?reason, "invocation rejected");
                }
                metrics::record_rejected(reason);
                Ok(None)
            }
        }
    }

    /// Fires one shot for `user` in `room`.
    ///
    /// # Errors
    ///
    /// Returns [`RouletteError::Platform`] if the mute or an immediate reply
    /// fails, and [`RouletteError::Round`] if the round state is corrupted.
    /// A failed new-round announcement is only logged.
    pub async fn execute(&self, room: &RoomId, user: &UserId) -> Result<Shot, RouletteError> {
        let shot = self.game.shoot().inspect_err(|e| {
            tracing::error!(error = %e, "round state invariant violated");
        })?;
        let mention = self.platform.mention(user);

        match shot {
            Shot::Hit { mute_secs, misses } => {
                tracing::info!(
                    %room,
                    %user,
                    outcome = %Outcome::Hit,
                    mute_secs,
                    misses,
                    "round resolved"
                );

                if let Err(e) = self
                    .platform
                    .mute(room, user, Duration::from_secs(mute_secs))
                    .await
                {
                    metrics::record_mute_failure();
                    tracing::warn!(%room, %user, error = %e, "mute failed; round stays cleared");
                    return Err(e.into());
                }

                let HitReply { killed, new_round } =
                    HitReply::new(&self.messages, &mention, mute_secs);
                self.platform.send(room, &killed).await?;
                self.announce_new_round(room.clone(), new_round);
            }
            Shot::Miss { mute_secs } => {
                tracing::info!(%room, %user, outcome = %Outcome::Miss, mute_secs, "stakes raised");

                let survived = survived_reply(&self.messages, &mention, mute_secs);
                self.platform.send(room, &survived).await?;
            }
        }

        Ok(shot)
    }

    /// Waits until every pending new-round announcement has been sent.
    pub async fn flush_announcements(&self) {
        self.announcements.close();
        self.announcements.wait().await;
        self.announcements.reopen();
    }

    fn announce_new_round(&self, room: RoomId, text: String) {
        let platform = Arc::clone(&self.platform);
        let delay = self.messages.new_round_delay;
        self.announcements.spawn(async move {
            if let Err(e) = platform.send_queued(&room, &text, delay).await {
                tracing::warn!(%room, error = %e, "new-round announcement failed");
            }
        });
    }
}

impl std::fmt::Debug for RouletteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouletteCommand")
            .field("spec", &self.spec)
            .field("game", &self.game)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ConsolePlatform;

    fn command() -> RouletteCommand {
        RouletteCommand::from_config(
            &RouletteConfig::default(),
            Arc::new(ConsolePlatform::new(Vec::new())),
        )
    }

    #[test]
    fn accepts_exact_name_in_room() {
        let cmd = command();
        let inv = Invocation::in_room("g1", "u1", "  开枪 ");
        assert_eq!(cmd.accept(&inv), Ok(&RoomId::from("g1")));
    }

    #[test]
    fn rejects_other_content() {
        let cmd = command();
        let inv = Invocation::in_room("g1", "u1", "开枪吧");
        assert_eq!(cmd.accept(&inv), Err(RejectReason::NotCommand));
    }

    #[test]
    fn rejects_direct_messages() {
        let cmd = command();
        let inv = Invocation::direct("u1", "开枪");
        assert_eq!(cmd.accept(&inv), Err(RejectReason::NoRoom));
    }

    #[tokio::test]
    async fn rejected_invocations_do_not_start_a_round() {
        let cmd = command();
        assert_eq!(cmd.handle(&Invocation::direct("u1", "开枪")).await.unwrap(), None);
        assert_eq!(
            cmd.handle(&Invocation::in_room("g1", "u1", "hello")).await.unwrap(),
            None
        );
        assert!(!cmd.game().is_active());
    }
}
