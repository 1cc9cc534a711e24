//! Shared integration-test harness.
//!
//! [`RecordingPlatform`] captures platform calls in memory for library-level
//! tests; [`RouletteProcess`] spawns the `roulette` binary and talks NDJSON
//! over its stdio.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

use roulette::error::PlatformError;
use roulette::platform::{ChatPlatform, RoomId, UserId};

/// Default timeout for reading a single record from the process.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// In-memory platform
// ============================================================================

/// A platform call observed by [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Mute {
        room: String,
        user: String,
        duration: Duration,
    },
    Send {
        room: String,
        text: String,
    },
}

/// [`ChatPlatform`] that records calls and can be told to fail mutes.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    actions: Mutex<Vec<Action>>,
    fail_mutes: AtomicBool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent mute fail (or succeed again).
    pub fn set_fail_mutes(&self, fail: bool) {
        self.fail_mutes.store(fail, Ordering::SeqCst);
    }

    /// Returns and clears the recorded actions.
    pub fn take(&self) -> Vec<Action> {
        std::mem::take(&mut *self.actions.lock().unwrap())
    }

    fn push(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }
}

#[async_trait::async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn mute(
        &self,
        room: &RoomId,
        user: &UserId,
        duration: Duration,
    ) -> Result<(), PlatformError> {
        if self.fail_mutes.load(Ordering::SeqCst) {
            return Err(PlatformError::MuteFailed {
                room: room.to_string(),
                user: user.to_string(),
                reason: "bot lacks admin rights".to_string(),
            });
        }
        self.push(Action::Mute {
            room: room.to_string(),
            user: user.to_string(),
            duration,
        });
        Ok(())
    }

    async fn send(&self, room: &RoomId, text: &str) -> Result<(), PlatformError> {
        self.push(Action::Send {
            room: room.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn mention(&self, user: &UserId) -> String {
        format!("@{user}")
    }
}

// ============================================================================
// Binary process
// ============================================================================

/// A running `roulette run` process.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
#[allow(clippy::missing_panics_doc)]
pub struct RouletteProcess {
    child: Child,
    stdin: tokio::process::ChildStdin,
    reader: BufReader<tokio::process::ChildStdout>,
}

impl RouletteProcess {
    /// Spawns `roulette run` with the given config and extra arguments.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(config_path: &Path, extra: &[&str]) -> Self {
        let mut args = vec![
            "run",
            "--quiet",
            "--config",
            config_path.to_str().expect("non-UTF-8 config path"),
        ];
        args.extend_from_slice(extra);

        let mut child = Command::new(env!("CARGO_BIN_EXE_roulette"))
            .args(&args)
            .env_remove("ROULETTE_CONFIG")
            .env_remove("ROULETTE_SEED")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn roulette");

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");

        Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
        }
    }

    /// Runs the binary to completion with the given arguments.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        std::process::Command::new(env!("CARGO_BIN_EXE_roulette"))
            .args(args)
            .env_remove("ROULETTE_CONFIG")
            .output()
            .expect("failed to run roulette")
    }

    /// Writes one invocation line.
    #[allow(clippy::missing_panics_doc)]
    pub async fn send_line(&mut self, line: &str) {
        self.stdin
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("failed to write to stdin");
        self.stdin.flush().await.expect("failed to flush stdin");
    }

    /// Sends a room invocation.
    pub async fn shoot(&mut self, room: &str, user: &str, content: &str) {
        let line = json!({ "room": room, "user": user, "content": content }).to_string();
        self.send_line(&line).await;
    }

    /// Reads one NDJSON record from stdout.
    ///
    /// Panics on EOF, I/O error, or if nothing arrives within `timeout`.
    #[allow(clippy::missing_panics_doc)]
    pub async fn read_record(&mut self, timeout: Duration) -> Value {
        let mut line = String::new();
        let result = tokio::time::timeout(timeout, async {
            loop {
                line.clear();
                let n = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .expect("read_line I/O error");
                assert!(n > 0, "unexpected EOF from roulette");
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    return serde_json::from_str::<Value>(trimmed)
                        .unwrap_or_else(|e| panic!("invalid JSON from roulette: {e}\nline: {line}"));
                }
            }
        })
        .await;
        result.expect("timed out waiting for record from roulette")
    }

    /// Closes stdin and returns the exit code.
    #[allow(clippy::missing_panics_doc)]
    pub async fn shutdown(self) -> Option<i32> {
        let Self {
            mut child, stdin, ..
        } = self;
        drop(stdin);

        match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
            Ok(status) => status.expect("wait failed").code(),
            Err(_) => {
                child.kill().await.expect("failed to kill child");
                None
            }
        }
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }
}
