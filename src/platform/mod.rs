//! Chat platform abstraction.
//!
//! Provides the [`ChatPlatform`] trait the command uses to mute players and
//! deliver replies, plus the identifiers and the [`Invocation`] a host hands
//! to the dispatcher. Real chat adapters implement the trait; the crate
//! ships a [`console`] implementation speaking NDJSON over stdio.

pub mod console;

pub use console::{ConsoleInput, ConsolePlatform, ConsoleRecord};

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Identifier of a group chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

/// Identifier of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

macro_rules! string_id {
    ($t:ty) => {
        impl $t {
            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $t {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(RoomId);
string_id!(UserId);

/// A message that may be a command, as received by a host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invocation {
    /// Room the message was posted in; `None` for direct messages.
    #[serde(default)]
    pub room: Option<RoomId>,
    /// Author of the message.
    pub user: UserId,
    /// Raw message text.
    pub content: String,
}

impl Invocation {
    /// Creates an invocation posted in `room`.
    #[must_use]
    pub fn in_room(room: impl Into<RoomId>, user: impl Into<UserId>, content: &str) -> Self {
        Self {
            room: Some(room.into()),
            user: user.into(),
            content: content.to_string(),
        }
    }

    /// Creates a direct-message invocation with no room.
    #[must_use]
    pub fn direct(user: impl Into<UserId>, content: &str) -> Self {
        Self {
            room: None,
            user: user.into(),
            content: content.to_string(),
        }
    }
}

/// Mute and messaging primitives of a chat platform.
///
/// Implementations take `&self` and use interior mutability so a single
/// platform can be shared by concurrent invocations.
#[async_trait::async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Silences `user` in `room` for `duration`.
    async fn mute(&self, room: &RoomId, user: &UserId, duration: Duration) -> Result<()>;

    /// Posts `text` to `room`.
    async fn send(&self, room: &RoomId, text: &str) -> Result<()>;

    /// Posts `text` to `room` after `delay`.
    async fn send_queued(&self, room: &RoomId, text: &str, delay: Duration) -> Result<()> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.send(room, text).await
    }

    /// Returns the in-message token that mentions `user`.
    fn mention(&self, user: &UserId) -> String;
}
